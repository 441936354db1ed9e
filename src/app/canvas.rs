use eframe::egui::{self, CursorIcon, Id, Key, Order, Pos2, Rect, Response, Sense, Ui};

use super::ViewModel;
use super::interaction::{MenuAction, PointerState};
use super::render::{Highlight, paint, scene};
use super::render_utils::draw_background;

fn to_local(rect: Rect, screen: Pos2) -> Pos2 {
    (screen - rect.min).to_pos2()
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.session.set_surface(rect.size());

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, &self.session.transform);

        self.handle_graph_pointer(ui, rect, &response);
        self.handle_graph_zoom(ui, rect, &response);

        if self.session.store.is_empty() {
            painter.text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Enter an account and run an analysis",
                egui::FontId::proportional(16.0),
                ui.visuals().weak_text_color(),
            );
            return;
        }

        let matches = self.cached_search_matches();
        let commands = scene(
            &self.session.store,
            self.session.interaction.hidden(),
            &self.session.transform,
            Highlight {
                selected: self.session.interaction.selected(),
                matches: matches.as_deref(),
            },
        );
        paint(&painter, rect, &commands);

        self.draw_context_menu(ui.ctx(), rect);
    }

    fn handle_graph_pointer(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        let (primary_pressed, primary_released, secondary_pressed, latest) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.secondary_pressed(),
                input.pointer.latest_pos(),
            )
        });
        let session = &mut self.session;

        if response.hovered()
            && let Some(pointer) = latest
        {
            let local = to_local(rect, pointer);
            if primary_pressed {
                session
                    .interaction
                    .primary_press(&mut session.store, &session.transform, local);
            } else if secondary_pressed {
                session
                    .interaction
                    .secondary_press(&session.store, &session.transform, local);
            }
        }

        if session.interaction.is_active()
            && let Some(pointer) = latest
        {
            session.interaction.pointer_move(
                &mut session.store,
                &mut session.transform,
                to_local(rect, pointer),
            );
        }

        if primary_released {
            session.interaction.release(&mut session.store);
        }

        if ui.input(|input| input.key_pressed(Key::Escape)) {
            session.interaction.close_menu();
        }

        let cursor = match session.interaction.pointer() {
            PointerState::Dragging { .. } | PointerState::Panning { .. } => {
                Some(CursorIcon::Grabbing)
            }
            PointerState::Idle => response.hover_pos().and_then(|pointer| {
                session
                    .interaction
                    .hit_test(&session.store, &session.transform, to_local(rect, pointer))
                    .map(|_| CursorIcon::PointingHand)
            }),
        };
        if let Some(cursor) = cursor {
            ui.ctx().set_cursor_icon(cursor);
        }
    }

    fn handle_graph_zoom(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let anchor = response
            .hover_pos()
            .map_or_else(|| (rect.size() * 0.5).to_pos2(), |pointer| to_local(rect, pointer));
        let transform = &mut self.session.transform;
        let model = transform.screen_to_model(anchor);
        if scroll > 0.0 {
            transform.zoom_in();
        } else {
            transform.zoom_out();
        }
        transform.keep_under(model, anchor);
    }

    fn draw_context_menu(&mut self, ctx: &egui::Context, rect: Rect) {
        let Some((anchor, node)) = self
            .session
            .interaction
            .menu()
            .map(|menu| (rect.min + menu.anchor.to_vec2(), menu.node.clone()))
        else {
            return;
        };
        let Some(username) = self
            .session
            .store
            .profile(&node)
            .map(|profile| profile.username.clone())
        else {
            self.session.interaction.close_menu();
            return;
        };

        let mut chosen = None;
        egui::Area::new(Id::new("node_context_menu"))
            .order(Order::Foreground)
            .fixed_pos(anchor)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_width(150.0);
                    ui.strong(format!("@{username}"));
                    ui.separator();
                    for action in MenuAction::ALL {
                        if ui.button(action.label()).clicked() {
                            chosen = Some(action);
                        }
                    }
                });
            });

        if let Some(action) = chosen {
            self.session.apply_menu(action);
        }
    }
}
