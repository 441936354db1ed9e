use std::collections::HashSet;

use eframe::egui::{Align2, FontId, Painter, Pos2, Rect, Stroke, vec2};

use crate::graph::GraphStore;

use super::render_utils::{
    LABEL_COLOR, MATCH_COLOR, NODE_FILL, SELECTED_COLOR, circle_visible, level_color, link_stroke,
    segment_visible,
};
use super::transform::ViewTransform;

const NODE_RADIUS: f32 = 20.0;
const LABEL_OFFSET: f32 = 35.0;
const LABEL_SIZE: f32 = 10.0;
const OUTLINE_WIDTH: f32 = 2.0;

/// One primitive of a frame, in surface-local screen coordinates.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DrawCommand {
    Link {
        from: Pos2,
        to: Pos2,
        stroke: Stroke,
    },
    Node {
        id: String,
        center: Pos2,
        radius: f32,
        outline: Stroke,
        ring: Option<Stroke>,
    },
    Label {
        pos: Pos2,
        text: String,
        size: f32,
    },
}

#[derive(Clone, Copy, Default)]
pub(crate) struct Highlight<'a> {
    pub selected: Option<&'a str>,
    pub matches: Option<&'a HashSet<String>>,
}

/// Builds the display list for the visible subgraph: links first, then nodes with labels.
pub(crate) fn scene(
    store: &GraphStore,
    hidden: &HashSet<String>,
    transform: &ViewTransform,
    highlight: Highlight<'_>,
) -> Vec<DrawCommand> {
    let k = transform.k;
    let mut commands = Vec::with_capacity(store.link_count() + store.node_count() * 2);

    for link in store.links() {
        if hidden.contains(&link.source) || hidden.contains(&link.target) {
            continue;
        }
        let (Some(source), Some(target)) = (store.position(&link.source), store.position(&link.target))
        else {
            continue;
        };

        commands.push(DrawCommand::Link {
            from: transform.model_to_screen(source),
            to: transform.model_to_screen(target),
            stroke: link_stroke(link.kind, k),
        });
    }

    for (meta, sim, profile) in store.nodes() {
        if hidden.contains(&meta.id) {
            continue;
        }

        let center = transform.model_to_screen(sim.pos);
        let ring = if highlight.selected == Some(meta.id.as_str()) {
            Some(Stroke::new(2.5, SELECTED_COLOR))
        } else if highlight
            .matches
            .is_some_and(|matches| matches.contains(&meta.id))
        {
            Some(Stroke::new(2.0, MATCH_COLOR))
        } else {
            None
        };

        commands.push(DrawCommand::Node {
            id: meta.id.clone(),
            center,
            radius: NODE_RADIUS * k,
            outline: Stroke::new(OUTLINE_WIDTH * k, level_color(meta.level)),
            ring,
        });
        commands.push(DrawCommand::Label {
            pos: center + vec2(0.0, LABEL_OFFSET * k),
            text: profile.username.clone(),
            size: LABEL_SIZE * k,
        });
    }

    commands
}

/// Paints `commands` into `rect`, skipping anything entirely off-surface.
pub(crate) fn paint(painter: &Painter, rect: Rect, commands: &[DrawCommand]) {
    let origin = rect.min.to_vec2();

    for command in commands {
        match command {
            DrawCommand::Link { from, to, stroke } => {
                let (from, to) = (*from + origin, *to + origin);
                if segment_visible(rect, from, to, stroke.width) {
                    painter.line_segment([from, to], *stroke);
                }
            }
            DrawCommand::Node {
                center,
                radius,
                outline,
                ring,
                ..
            } => {
                let center = *center + origin;
                if !circle_visible(rect, center, radius + 6.0) {
                    continue;
                }
                painter.circle_filled(center, *radius, NODE_FILL);
                painter.circle_stroke(center, *radius, *outline);
                if let Some(ring) = ring {
                    painter.circle_stroke(center, radius + 4.0, *ring);
                }
            }
            DrawCommand::Label { pos, text, size } => {
                let pos = *pos + origin;
                if *size < 4.0 || !rect.expand(40.0).contains(pos) {
                    continue;
                }
                painter.text(
                    pos,
                    Align2::CENTER_CENTER,
                    text,
                    FontId::proportional(*size),
                    LABEL_COLOR,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Vec2, pos2};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::graph::{LinkKind, NodeMeta, SimState, generate_profile};

    fn store() -> GraphStore {
        let mut rng = StdRng::seed_from_u64(2);
        let mut store = GraphStore::new();
        for (meta, pos) in [
            (NodeMeta::root("root"), vec2(100.0, 100.0)),
            (NodeMeta::child("a", 1, "root", "A"), vec2(200.0, 100.0)),
            (NodeMeta::child("a1", 2, "a", "A"), vec2(300.0, 100.0)),
        ] {
            let profile = generate_profile(&meta.id, None, &mut rng);
            store.add_node(meta, SimState::at(pos), profile);
        }
        store.add_link("root", "a", LinkKind::Follower);
        store.add_link("a", "a1", LinkKind::Mutual);
        store.add_link("a1", "ghost", LinkKind::Follower);
        store
    }

    fn nodes(commands: &[DrawCommand]) -> Vec<&str> {
        commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Node { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    fn links(commands: &[DrawCommand]) -> Vec<&Stroke> {
        commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Link { stroke, .. } => Some(stroke),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn draws_every_visible_node_and_resolved_link() {
        let store = store();
        let commands = scene(&store, &HashSet::new(), &ViewTransform::default(), Highlight::default());

        assert_eq!(nodes(&commands), vec!["root", "a", "a1"]);
        let strokes = links(&commands);
        assert_eq!(strokes.len(), 2);
        assert!(strokes[1].width > strokes[0].width);
        assert!(matches!(commands[0], DrawCommand::Link { .. }));
    }

    #[test]
    fn hidden_nodes_and_their_links_are_skipped() {
        let store = store();
        let hidden = HashSet::from(["a1".to_owned()]);
        let commands = scene(&store, &hidden, &ViewTransform::default(), Highlight::default());

        assert_eq!(nodes(&commands), vec!["root", "a"]);
        assert_eq!(links(&commands).len(), 1);
    }

    #[test]
    fn geometry_follows_the_transform() {
        let store = store();
        let transform = ViewTransform {
            offset: Vec2::new(10.0, -10.0),
            k: 2.0,
        };
        let commands = scene(&store, &HashSet::new(), &transform, Highlight::default());

        let root = commands
            .iter()
            .find_map(|command| match command {
                DrawCommand::Node {
                    id,
                    center,
                    radius,
                    outline,
                    ..
                } if id == "root" => Some((*center, *radius, *outline)),
                _ => None,
            })
            .expect("root drawn");
        assert_eq!(root.0, pos2(210.0, 190.0));
        assert_eq!(root.1, 40.0);
        assert_eq!(root.2.color, level_color(0));

        let label = commands
            .iter()
            .find_map(|command| match command {
                DrawCommand::Label { pos, .. } => Some(*pos),
                _ => None,
            })
            .expect("label drawn");
        assert_eq!(label, pos2(210.0, 260.0));
    }

    #[test]
    fn selection_and_matches_get_rings() {
        let store = store();
        let matches = HashSet::from(["a1".to_owned()]);
        let commands = scene(
            &store,
            &HashSet::new(),
            &ViewTransform::default(),
            Highlight {
                selected: Some("a"),
                matches: Some(&matches),
            },
        );

        let rings = commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Node { id, ring, .. } => Some((id.as_str(), ring.map(|ring| ring.color))),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(
            rings,
            vec![
                ("root", None),
                ("a", Some(SELECTED_COLOR)),
                ("a1", Some(MATCH_COLOR))
            ]
        );
    }
}
