use eframe::egui::{Pos2, Vec2};

/// Screen-space translation plus uniform scale.
///
/// Screen positions are relative to the top-left corner of the graph surface;
/// `screen = model * k + offset`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ViewTransform {
    pub offset: Vec2,
    pub k: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            k: 1.0,
        }
    }
}

impl ViewTransform {
    pub const MIN_SCALE: f32 = 0.1;
    pub const MAX_SCALE: f32 = 5.0;
    pub const WHEEL_STEP: f32 = 1.1;
    pub const BUTTON_STEP: f32 = 1.2;

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Raw screen delta; independent of the current scale.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.k = (self.k * factor).clamp(Self::MIN_SCALE, Self::MAX_SCALE);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(Self::WHEEL_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 / Self::WHEEL_STEP);
    }

    /// Zooms while keeping the model point under `anchor` in place.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        let model = self.screen_to_model(anchor);
        self.zoom_by(factor);
        self.keep_under(model, anchor);
    }

    /// Translates so that `model` lands on `anchor` at the current scale.
    pub fn keep_under(&mut self, model: Vec2, anchor: Pos2) {
        self.offset = anchor.to_vec2() - model * self.k;
    }

    /// Centers `model` on a surface of `screen_size` at the current scale.
    pub fn focus(&mut self, model: Vec2, screen_size: Vec2) {
        self.offset = screen_size * 0.5 - model * self.k;
    }

    pub fn screen_to_model(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.offset) / self.k
    }

    pub fn model_to_screen(&self, model: Vec2) -> Pos2 {
        (model * self.k + self.offset).to_pos2()
    }
}
