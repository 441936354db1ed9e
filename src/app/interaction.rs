use std::collections::HashSet;

use eframe::egui::{Pos2, Vec2};
use tracing::debug;

use crate::graph::GraphStore;

use super::transform::ViewTransform;

/// Hit radius in model units; on screen it grows and shrinks with zoom.
pub(crate) const HIT_RADIUS: f32 = 20.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) enum PointerState {
    #[default]
    Idle,
    Dragging {
        node: String,
    },
    Panning {
        origin: Vec2,
        start: Pos2,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ContextMenu {
    pub anchor: Pos2,
    pub node: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MenuAction {
    Focus,
    TraceParent,
    HideBranch,
}

impl MenuAction {
    pub const ALL: [Self; 3] = [Self::Focus, Self::TraceParent, Self::HideBranch];

    pub fn label(self) -> &'static str {
        match self {
            Self::Focus => "Focus node",
            Self::TraceParent => "Trace parent",
            Self::HideBranch => "Hide branch",
        }
    }
}

/// Outbound requests for views outside the graph canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum GraphEvent {
    OpenProfile(String),
}

/// Pointer-driven selection, drag, pan and context-menu state.
#[derive(Debug, Default)]
pub(crate) struct InteractionController {
    pointer: PointerState,
    menu: Option<ContextMenu>,
    selected: Option<String>,
    hidden: HashSet<String>,
}

impl InteractionController {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    pub fn menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The node whose details panel should be shown; the context menu takes precedence.
    pub fn details_target(&self) -> Option<&str> {
        if self.menu.is_some() {
            None
        } else {
            self.selected()
        }
    }

    pub fn hidden(&self) -> &HashSet<String> {
        &self.hidden
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.contains(id)
    }

    /// Nearest visible node within [`HIT_RADIUS`] of the pointer, in model space.
    pub fn hit_test<'a>(
        &self,
        store: &'a GraphStore,
        transform: &ViewTransform,
        screen: Pos2,
    ) -> Option<&'a str> {
        let pointer = transform.screen_to_model(screen);
        store
            .nodes()
            .filter(|(meta, _, _)| !self.hidden.contains(&meta.id))
            .filter_map(|(meta, sim, _)| {
                let distance = (sim.pos - pointer).length();
                (distance < HIT_RADIUS).then_some((meta.id.as_str(), distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    pub fn primary_press(&mut self, store: &mut GraphStore, transform: &ViewTransform, screen: Pos2) {
        self.release(store);
        self.menu = None;

        match self.hit_test(store, transform, screen).map(str::to_owned) {
            Some(node) => {
                if let Some(sim) = store.sim_mut(&node) {
                    sim.dragging = true;
                }
                self.selected = Some(node.clone());
                self.pointer = PointerState::Dragging { node };
            }
            None => {
                self.pointer = PointerState::Panning {
                    origin: transform.offset,
                    start: screen,
                };
            }
        }
    }

    pub fn pointer_move(
        &mut self,
        store: &mut GraphStore,
        transform: &mut ViewTransform,
        screen: Pos2,
    ) {
        match &self.pointer {
            PointerState::Idle => {}
            PointerState::Dragging { node } => {
                let model = transform.screen_to_model(screen);
                if let Some(sim) = store.sim_mut(node) {
                    sim.pos = model;
                    sim.vel = Vec2::ZERO;
                }
            }
            PointerState::Panning { origin, start } => {
                transform.offset = *origin + (screen - *start);
            }
        }
    }

    pub fn release(&mut self, store: &mut GraphStore) {
        if let PointerState::Dragging { node } = &self.pointer
            && let Some(sim) = store.sim_mut(node)
        {
            sim.dragging = false;
        }
        self.pointer = PointerState::Idle;
    }

    pub fn is_active(&self) -> bool {
        self.pointer != PointerState::Idle
    }

    pub fn secondary_press(&mut self, store: &GraphStore, transform: &ViewTransform, screen: Pos2) {
        self.menu = self
            .hit_test(store, transform, screen)
            .map(|node| ContextMenu {
                anchor: screen,
                node: node.to_owned(),
            });
    }

    pub fn close_menu(&mut self) {
        self.menu = None;
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Runs `action` against the node the menu was opened on and closes the menu.
    pub fn apply(
        &mut self,
        action: MenuAction,
        store: &mut GraphStore,
        transform: &mut ViewTransform,
        screen_size: Vec2,
    ) {
        let Some(menu) = self.menu.take() else {
            return;
        };

        match action {
            MenuAction::Focus => {
                if let Some(position) = store.position(&menu.node) {
                    transform.focus(position, screen_size);
                }
            }
            MenuAction::TraceParent => {
                let parent = store
                    .meta(&menu.node)
                    .and_then(|meta| meta.parent_id.as_deref())
                    .and_then(|parent| store.position(parent));
                if let Some(position) = parent {
                    transform.focus(position, screen_size);
                }
            }
            MenuAction::HideBranch => self.hide_branch(store, &menu.node),
        }
    }

    pub fn hide_branch(&mut self, store: &mut GraphStore, id: &str) {
        let branch = store.subtree(id);
        debug!(node = id, hidden = branch.len(), "hiding branch");

        let dragging_hidden = matches!(
            &self.pointer,
            PointerState::Dragging { node } if branch.contains(node)
        );
        if dragging_hidden {
            self.release(store);
        }
        if self
            .selected
            .as_ref()
            .is_some_and(|selected| branch.contains(selected))
        {
            self.selected = None;
        }
        if self
            .menu
            .as_ref()
            .is_some_and(|menu| branch.contains(&menu.node))
        {
            self.menu = None;
        }

        self.hidden.extend(branch);
    }

    pub fn unhide_all(&mut self) {
        self.hidden.clear();
    }
}
