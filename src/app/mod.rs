use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui::{self, Context};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::population::PersistenceSink;

mod canvas;
mod interaction;
mod physics;
mod render;
mod render_utils;
mod session;
mod transform;
mod ui;

use interaction::GraphEvent;
use session::GraphSession;

/// Everything `main` resolves before the window opens.
pub struct LaunchOptions {
    pub settings: Settings,
    pub settings_path: Option<PathBuf>,
    pub sink: Box<dyn PersistenceSink>,
    pub seed: Option<u64>,
    pub target: Option<String>,
}

pub struct RelGraphApp {
    model: ViewModel,
}

struct ViewModel {
    session: GraphSession,
    settings: Settings,
    settings_path: Option<PathBuf>,
    target_input: String,
    autostart: Option<String>,
    search: String,
    search_match_cache: Option<SearchMatchCache>,
    live_physics: bool,
    settling: bool,
    profile_window: Option<String>,
    events: Vec<GraphEvent>,
}

struct SearchMatchCache {
    query: String,
    graph_revision: u64,
    ranked: Arc<[String]>,
    matches: Arc<HashSet<String>>,
}

impl RelGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let LaunchOptions {
            settings,
            settings_path,
            sink,
            seed,
            target,
        } = options;

        Self {
            model: ViewModel {
                session: GraphSession::new(sink, seed),
                settings,
                settings_path,
                target_input: target.clone().unwrap_or_default(),
                autostart: target,
                search: String::new(),
                search_match_cache: None,
                live_physics: true,
                settling: false,
                profile_window: None,
                events: Vec::new(),
            },
        }
    }
}

impl eframe::App for RelGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.model.show(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.model.session.shutdown();
    }
}

impl ViewModel {
    fn show(&mut self, ctx: &Context) {
        let now = ctx.input(|input| input.time);

        let inserted = self.session.poll(now);
        if inserted > 0 {
            debug!(inserted, total = self.session.store.node_count(), "graph grew");
        }
        self.settling = self.live_physics && self.session.step_physics();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| self.draw_top_bar(ui, now));

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui));

        if self.session.interaction.details_target().is_some() {
            egui::SidePanel::right("details")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| self.draw_details(ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        self.draw_profile_window(ctx);
        self.handle_events();

        if let Some(target) = self.autostart.take() {
            self.start_run(&target, now);
        }

        if self.settling || self.session.interaction.is_active() {
            ctx.request_repaint();
        } else if let Some(due) = self.session.pipeline.next_due() {
            ctx.request_repaint_after(Duration::from_secs_f64((due - now).max(0.0)));
        } else if self.session.pipeline.is_scraping(now) {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }

    fn start_run(&mut self, target: &str, now: f64) {
        if self
            .session
            .start_run(target, &self.settings, now)
            .is_none()
        {
            return;
        }

        self.search_match_cache = None;
        self.profile_window = None;
        self.events.clear();
    }

    fn handle_events(&mut self) {
        for event in self.events.drain(..) {
            match event {
                GraphEvent::OpenProfile(id) => {
                    info!(node = %id, "opening profile");
                    self.profile_window = Some(id);
                }
            }
        }
    }

    fn save_settings(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };

        if let Err(error) = self.settings.save(path) {
            warn!(%error, "failed to save settings");
        }
    }

    /// Ids of nodes whose username fuzzily matches the search box, cached per graph revision.
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        self.refresh_search_cache()
            .map(|cache| Arc::clone(&cache.matches))
    }

    /// Same matches as [`Self::cached_search_matches`], best first.
    fn ranked_search_matches(&mut self) -> Arc<[String]> {
        self.refresh_search_cache()
            .map(|cache| Arc::clone(&cache.ranked))
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    fn refresh_search_cache(&mut self) -> Option<&SearchMatchCache> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let revision = self.session.store.revision();
        let stale = self
            .search_match_cache
            .as_ref()
            .is_none_or(|cached| cached.graph_revision != revision || cached.query != query);
        if stale {
            let ranked = self.session.store.search(query);
            let matches = ranked.iter().cloned().collect::<HashSet<_>>();
            self.search_match_cache = Some(SearchMatchCache {
                query: query.to_owned(),
                graph_revision: revision,
                ranked: Arc::from(ranked),
                matches: Arc::new(matches),
            });
        }

        self.search_match_cache.as_ref()
    }
}
