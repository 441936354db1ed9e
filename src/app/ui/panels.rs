use eframe::egui::{self, Align, Key, Layout, RichText, Ui};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_top_bar(&mut self, ui: &mut Ui, now: f64) {
        let scraping = self.session.pipeline.is_scraping(now);

        ui.horizontal(|ui| {
            ui.heading("relgraph");
            ui.separator();

            let input = ui.add(
                egui::TextEdit::singleline(&mut self.target_input)
                    .hint_text("account to analyze")
                    .desired_width(200.0),
            );
            let submitted =
                input.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));

            let can_run = !scraping && !self.target_input.trim().is_empty();
            let run_button = ui
                .add_enabled(can_run, egui::Button::new("Run analysis"))
                .on_hover_text("Clear the graph and discover connections from this account.");
            if can_run && (run_button.clicked() || submitted) {
                let target = self.target_input.clone();
                self.start_run(&target, now);
            }

            if scraping {
                ui.spinner();
                ui.label(RichText::new("Scraping...").weak());
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(self.status_text(scraping));
            });
        });
    }

    fn status_text(&self, scraping: bool) -> String {
        let session = &self.session;
        let mut parts = Vec::new();
        if let Some(target) = session.pipeline.target() {
            parts.push(format!("run {} @{target}", session.pipeline.current_run()));
        }
        parts.extend([
            format!("nodes: {}", session.store.node_count()),
            format!("links: {}", session.store.link_count()),
        ]);

        let pending = session.pipeline.pending();
        if scraping || pending > 0 {
            parts.push(format!("pending: {pending}"));
        }

        let hidden = session.interaction.hidden().len();
        if hidden > 0 {
            parts.push(format!("visible: {} ({hidden} hidden)", session.visible_count()));
        }

        parts.push(format!("zoom: {:.0}%", session.transform.k * 100.0));
        parts.join("  |  ")
    }
}
