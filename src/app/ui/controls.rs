use eframe::egui::{self, RichText, Ui};

use crate::config::Settings;

use super::super::ViewModel;
use super::super::physics::PhysicsConfig;
use super::super::transform::ViewTransform;

const SEARCH_RESULT_ROWS: usize = 12;

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Analysis");
        ui.separator();
        ui.add_space(4.0);

        self.draw_settings(ui);
        ui.separator();
        self.draw_search(ui);
        ui.separator();
        self.draw_view_controls(ui);
        ui.separator();
        self.draw_physics_controls(ui);
    }

    fn draw_settings(&mut self, ui: &mut Ui) {
        let mut changed = false;
        let mut depth = self.settings.depth();

        egui::ComboBox::from_label("Scrape depth")
            .selected_text(Settings::depth_label(depth))
            .show_ui(ui, |ui| {
                for level in Settings::MIN_DEPTH..=Settings::MAX_DEPTH {
                    changed |= ui
                        .selectable_value(&mut depth, level, Settings::depth_label(level))
                        .changed();
                }
            });
        self.settings.scrape_depth = depth;

        changed |= ui
            .checkbox(&mut self.settings.stealth_mode, "Stealth mode")
            .on_hover_text("Saved with your settings; discovery timing is unchanged.")
            .changed();

        ui.small("Applies to the next run.");

        if changed {
            self.save_settings();
        }
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search accounts")
            .on_hover_text("Fuzzy-highlight matching usernames without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        if self.search.trim().is_empty() {
            return;
        }

        let ranked = self.ranked_search_matches();
        if ranked.is_empty() {
            ui.label(RichText::new("No matching accounts.").weak());
            return;
        }

        ui.small(format!("{} match(es)", ranked.len()));
        let mut focus = None;
        for id in ranked.iter().take(SEARCH_RESULT_ROWS) {
            let Some(profile) = self.session.store.profile(id) else {
                continue;
            };
            let hidden = self.session.interaction.is_hidden(id);
            let label = if hidden {
                format!("@{} (hidden)", profile.username)
            } else {
                format!("@{}", profile.username)
            };

            if ui.add_enabled(!hidden, egui::Link::new(label)).clicked() {
                focus = Some(id.clone());
            }
        }

        if let Some(id) = focus {
            self.session.focus_node(&id);
        }
    }

    fn draw_view_controls(&mut self, ui: &mut Ui) {
        let center = (self.session.surface() * 0.5).to_pos2();

        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked() {
                self.session
                    .transform
                    .zoom_at(center, ViewTransform::BUTTON_STEP);
            }
            if ui.button("Zoom out").clicked() {
                self.session
                    .transform
                    .zoom_at(center, 1.0 / ViewTransform::BUTTON_STEP);
            }
            if ui.button("Reset view").clicked() {
                self.session.transform.reset();
            }
        });

        let hidden = self.session.interaction.hidden().len();
        let unhide = ui
            .add_enabled(hidden > 0, egui::Button::new("Unhide all"))
            .on_hover_text("Show every hidden branch again.");
        if unhide.clicked() {
            self.session.interaction.unhide_all();
        }
    }

    fn draw_physics_controls(&mut self, ui: &mut Ui) {
        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Continuously simulate layout forces while viewing the graph.");

        ui.collapsing("Physics tuning", |ui| {
            let physics = &mut self.session.physics;
            ui.add(
                egui::Slider::new(&mut physics.repulsion, 200.0..=8000.0)
                    .text("Repulsion")
                    .clamping(egui::SliderClamping::Always),
            )
            .on_hover_text("How strongly nodes push away from each other.");
            ui.add(
                egui::Slider::new(&mut physics.spring, 0.001..=0.05)
                    .text("Spring")
                    .logarithmic(true),
            )
            .on_hover_text("How strongly links pull toward their rest length.");
            ui.add(
                egui::Slider::new(&mut physics.rest_length, 40.0..=300.0).text("Link length"),
            );
            ui.add(
                egui::Slider::new(&mut physics.center_pull, 0.0..=0.01)
                    .text("Centering")
                    .logarithmic(true),
            );
            ui.add(egui::Slider::new(&mut physics.damping, 0.5..=0.98).text("Damping"))
                .on_hover_text("Fraction of velocity kept each tick.");

            if ui.button("Reset physics").clicked() {
                *physics = PhysicsConfig::default();
            }
        });
    }
}
