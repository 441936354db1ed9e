use eframe::egui::Vec2;
use tracing::{debug, info};

use crate::config::Settings;
use crate::graph::GraphStore;
use crate::population::{NullSink, PersistenceSink, Pipeline, RunId};

use super::interaction::{InteractionController, MenuAction};
use super::physics::{PhysicsConfig, step_physics};
use super::transform::ViewTransform;

const DEFAULT_SURFACE: Vec2 = Vec2::new(800.0, 600.0);

/// Engine state behind the graph view: the store and everything that mutates it.
pub(crate) struct GraphSession {
    pub store: GraphStore,
    pub pipeline: Pipeline,
    pub transform: ViewTransform,
    pub interaction: InteractionController,
    pub physics: PhysicsConfig,
    sink: Box<dyn PersistenceSink>,
    surface: Vec2,
}

impl GraphSession {
    pub fn new(sink: Box<dyn PersistenceSink>, seed: Option<u64>) -> Self {
        let pipeline = match seed {
            Some(seed) => Pipeline::seeded(seed),
            None => Pipeline::from_entropy(),
        };

        Self {
            store: GraphStore::new(),
            pipeline,
            transform: ViewTransform::default(),
            interaction: InteractionController::default(),
            physics: PhysicsConfig::default(),
            sink,
            surface: DEFAULT_SURFACE,
        }
    }

    pub fn surface(&self) -> Vec2 {
        self.surface
    }

    pub fn set_surface(&mut self, size: Vec2) {
        if size.x > 0.0 && size.y > 0.0 {
            self.surface = size;
        }
    }

    /// Starts a fresh run rooted at the middle of the surface.
    pub fn start_run(&mut self, target: &str, settings: &Settings, now: f64) -> Option<RunId> {
        let center = self.surface * 0.5;
        let run = self.pipeline.start(
            target,
            settings,
            center,
            now,
            &mut self.store,
            self.sink.as_ref(),
        )?;

        self.transform.reset();
        self.interaction.reset();
        Some(run)
    }

    pub fn poll(&mut self, now: f64) -> usize {
        self.pipeline.poll(now, &mut self.store, self.sink.as_ref())
    }

    /// One physics tick over the visible subgraph; true while anything still moves.
    ///
    /// Free nodes are pulled toward the live surface centre, so a resize moves
    /// the cluster while the pinned root stays put.
    pub fn step_physics(&mut self) -> bool {
        if self.store.is_empty() {
            return false;
        }

        let links = self.store.resolved_links();
        let visible = self.store.visibility(self.interaction.hidden());
        step_physics(
            self.store.sim_states_mut(),
            &links,
            &visible,
            self.surface * 0.5,
            self.physics,
        )
    }

    pub fn apply_menu(&mut self, action: MenuAction) {
        self.interaction.apply(
            action,
            &mut self.store,
            &mut self.transform,
            self.surface,
        );
    }

    /// Selects `id` and centres the view on it.
    pub fn focus_node(&mut self, id: &str) {
        let Some(position) = self.store.position(id) else {
            debug!(node = id, "focus target no longer in graph");
            return;
        };
        self.interaction.select(Some(id.to_owned()));
        self.transform.focus(position, self.surface);
    }

    pub fn visible_count(&self) -> usize {
        let hidden = self.interaction.hidden();
        self.store
            .metas()
            .iter()
            .filter(|meta| !hidden.contains(&meta.id))
            .count()
    }

    /// Drops the sink, which flushes and joins any writer thread.
    pub fn shutdown(&mut self) {
        self.sink = Box::new(NullSink);
        info!(nodes = self.store.node_count(), "session closed");
    }
}
