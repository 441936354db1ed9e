use eframe::egui::{self, Color32, Context, RichText, Ui};

use crate::graph::Profile;

use super::super::ViewModel;
use super::super::interaction::GraphEvent;

const HIGH_RISK_COLOR: Color32 = Color32::from_rgb(239, 68, 68);

fn level_label(level: u8) -> String {
    match level {
        0 => "Target".to_owned(),
        level => format!("Level {level} connection"),
    }
}

fn risk_text(profile: &Profile) -> RichText {
    let text = RichText::new(format!("Risk score: {}", profile.risk_score));
    if profile.is_high_risk() {
        text.color(HIGH_RISK_COLOR).strong()
    } else {
        text
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.session.interaction.details_target().map(str::to_owned)
        else {
            ui.label("Select a node in the graph.");
            return;
        };

        let store = &self.session.store;
        let (Some(meta), Some(profile)) = (store.meta(&selected_id), store.profile(&selected_id))
        else {
            ui.label("Selected node no longer exists in the graph state.");
            return;
        };

        ui.label(RichText::new(&profile.full_name).strong());
        ui.small(format!("@{}", profile.username));
        ui.add_space(6.0);

        ui.label(level_label(meta.level));
        if let Some(parent_id) = meta.parent_id.as_deref()
            && let Some(parent) = store.profile(parent_id)
        {
            let kind = store
                .links()
                .iter()
                .find(|link| link.source == parent_id && link.target == selected_id)
                .map_or("unlinked", |link| link.kind.label());
            ui.label(format!("Discovered via @{} ({kind})", parent.username));
        }
        ui.label(format!(
            "Followers: {}  Following: {}",
            profile.followers_count, profile.following_count
        ));
        ui.label(risk_text(profile));
        if profile.is_private {
            ui.label(RichText::new("Private account").weak());
        }

        let children = store.children_of(&selected_id).count();
        ui.label(format!("Discovered connections: {children}"));

        ui.separator();
        let mut focus = false;
        let mut open = false;
        let mut close = false;
        ui.horizontal(|ui| {
            focus = ui.button("Focus").clicked();
            open = ui.button("View full profile").clicked();
            close = ui.button("Close").clicked();
        });

        if focus {
            self.session.focus_node(&selected_id);
        }
        if open {
            self.events.push(GraphEvent::OpenProfile(selected_id));
        }
        if close {
            self.session.interaction.deselect();
        }
    }

    pub(in crate::app) fn draw_profile_window(&mut self, ctx: &Context) {
        let Some(id) = self.profile_window.clone() else {
            return;
        };
        let Some(profile) = self.session.store.profile(&id) else {
            self.profile_window = None;
            return;
        };

        let mut open = true;
        egui::Window::new(format!("@{}", profile.username))
            .id(egui::Id::new("profile_window"))
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.heading(&profile.full_name);
                ui.label(&profile.bio);
                ui.add_space(6.0);

                egui::Grid::new("profile_fields")
                    .num_columns(2)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        let rows = [
                            ("Followers", profile.followers_count.to_string()),
                            ("Following", profile.following_count.to_string()),
                            ("Posts", profile.posts_count.to_string()),
                            ("Location", profile.location.clone()),
                            ("Joined", format!("{} days ago", profile.joined_days_ago)),
                            (
                                "Email",
                                profile.email.clone().unwrap_or_else(|| "-".to_owned()),
                            ),
                            (
                                "Phone",
                                profile.phone.clone().unwrap_or_else(|| "-".to_owned()),
                            ),
                        ];
                        for (name, value) in rows {
                            ui.label(RichText::new(name).weak());
                            ui.label(value);
                            ui.end_row();
                        }
                    });

                ui.add_space(6.0);
                ui.label(risk_text(profile));
                ui.hyperlink_to("Avatar", &profile.avatar);
            });

        if !open {
            self.profile_window = None;
        }
    }
}
