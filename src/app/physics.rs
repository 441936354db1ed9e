use eframe::egui::Vec2;

use crate::graph::SimState;

/// Floor applied to every pairwise distance.
const MIN_DISTANCE: f32 = 1.0;
const SLEEP_SPEED_SQ: f32 = 0.01 * 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PhysicsConfig {
    pub repulsion: f32,
    pub spring: f32,
    pub rest_length: f32,
    pub center_pull: f32,
    pub damping: f32,
    /// Optional per-tick speed cap; unbounded unless set.
    pub max_speed: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion: 2000.0,
            spring: 0.005,
            rest_length: 100.0,
            center_pull: 0.0005,
            damping: 0.9,
            max_speed: f32::INFINITY,
        }
    }
}

/// Advances the layout by one tick and reports whether anything is still moving.
///
/// Only visible nodes take part. Fixed and dragged nodes push and pull the
/// others but never receive velocity themselves. Repulsion is the plain O(n²)
/// pairwise sum; the graphs this explores stay in the low hundreds of nodes.
pub(crate) fn step_physics(
    nodes: &mut [SimState],
    links: &[(usize, usize)],
    visible: &[bool],
    center: Vec2,
    config: PhysicsConfig,
) -> bool {
    let node_count = nodes.len();
    let is_visible = |index: usize| visible.get(index).copied().unwrap_or(false);

    for index in 0..node_count {
        if !is_visible(index) || !nodes[index].is_free() {
            continue;
        }

        let position = nodes[index].pos;
        let mut push = Vec2::ZERO;
        for (other_index, other) in nodes.iter().enumerate() {
            if other_index == index || !is_visible(other_index) {
                continue;
            }

            let delta = position - other.pos;
            let distance = delta.length().max(MIN_DISTANCE);
            push += (delta / distance) * (config.repulsion / (distance * distance));
        }
        nodes[index].vel += push;
    }

    for &(source, target) in links {
        if source >= node_count || target >= node_count || source == target {
            continue;
        }
        if !is_visible(source) || !is_visible(target) {
            continue;
        }

        let delta = nodes[target].pos - nodes[source].pos;
        let distance = delta.length().max(MIN_DISTANCE);
        let pull = (delta / distance) * ((distance - config.rest_length) * config.spring);

        if nodes[source].is_free() {
            nodes[source].vel += pull;
        }
        if nodes[target].is_free() {
            nodes[target].vel -= pull;
        }
    }

    let max_speed_sq = config.max_speed * config.max_speed;
    let mut any_motion = false;
    for (index, node) in nodes.iter_mut().enumerate() {
        if !is_visible(index) || !node.is_free() {
            continue;
        }

        node.vel -= (node.pos - center) * config.center_pull;
        let speed_sq = node.vel.length_sq();
        if config.max_speed.is_finite() && speed_sq > max_speed_sq {
            node.vel *= config.max_speed / speed_sq.sqrt();
        }

        node.pos += node.vel;
        node.vel *= config.damping;
        if node.vel.length_sq() > SLEEP_SPEED_SQ {
            any_motion = true;
        }
    }

    any_motion
}

#[cfg(test)]
mod tests {
    use std::f32::consts::TAU;

    use eframe::egui::vec2;

    use super::*;

    const CENTER: Vec2 = vec2(400.0, 300.0);

    fn star(children: usize) -> (Vec<SimState>, Vec<(usize, usize)>) {
        let mut nodes = vec![SimState::pinned(CENTER)];
        let mut links = Vec::new();
        for index in 0..children {
            let angle = index as f32 / children as f32 * TAU;
            nodes.push(SimState::at(CENTER + vec2(angle.cos(), angle.sin()) * 120.0));
            links.push((0, index + 1));
        }
        (nodes, links)
    }

    #[test]
    fn layout_settles() {
        let (mut nodes, links) = star(8);
        nodes.push(SimState::at(CENTER + vec2(260.0, 15.0)));
        nodes.push(SimState::at(CENTER + vec2(250.0, 40.0)));
        let mut links = links;
        links.push((1, 9));
        links.push((1, 10));
        let visible = vec![true; nodes.len()];
        let config = PhysicsConfig::default();

        let mut moving = true;
        for _ in 0..3000 {
            moving = step_physics(&mut nodes, &links, &visible, CENTER, config);
        }

        assert!(!moving);
        for node in &nodes {
            assert!(node.vel.length() < 0.01, "velocity {:?}", node.vel);
            assert!(node.pos.x.is_finite() && node.pos.y.is_finite());
        }
        assert_eq!(nodes[0].pos, CENTER);
    }

    #[test]
    fn neighbours_repel_along_their_axis() {
        let mut nodes = vec![
            SimState::at(vec2(0.0, 0.0)),
            SimState::at(vec2(10.0, 0.0)),
        ];
        let config = PhysicsConfig {
            center_pull: 0.0,
            ..PhysicsConfig::default()
        };
        step_physics(&mut nodes, &[], &[true, true], Vec2::ZERO, config);

        assert!(nodes[0].pos.x < 0.0);
        assert!(nodes[1].pos.x > 10.0);
        assert_eq!(nodes[0].pos.y, 0.0);
        // 2000 / 10² = 20 before damping.
        assert!((nodes[1].vel.x - 20.0 * 0.9).abs() < 1.0e-3);
    }

    #[test]
    fn one_tick_follows_force_formula() {
        let mut nodes = vec![SimState::at(vec2(0.0, 0.0)), SimState::at(vec2(2.0, 0.0))];
        let config = PhysicsConfig {
            center_pull: 0.0,
            ..PhysicsConfig::default()
        };
        step_physics(&mut nodes, &[], &[true, true], Vec2::ZERO, config);

        // 2000 / 2² = 500, moved in full, then damped to 450.
        assert!((nodes[1].pos.x - 502.0).abs() < 1.0e-3);
        assert!((nodes[1].vel.x - 450.0).abs() < 1.0e-3);
        assert!((nodes[0].pos.x + 500.0).abs() < 1.0e-3);
        assert!((nodes[0].vel.x + 450.0).abs() < 1.0e-3);
        assert_eq!(nodes[1].pos.y, 0.0);
    }

    #[test]
    fn speed_cap_applies_only_when_set() {
        let mut nodes = vec![SimState::at(vec2(0.0, 0.0)), SimState::at(vec2(2.0, 0.0))];
        let config = PhysicsConfig {
            center_pull: 0.0,
            max_speed: 60.0,
            ..PhysicsConfig::default()
        };
        step_physics(&mut nodes, &[], &[true, true], Vec2::ZERO, config);

        assert!((nodes[1].pos.x - 62.0).abs() < 1.0e-3);
        assert!((nodes[1].vel.x - 54.0).abs() < 1.0e-3);
    }

    #[test]
    fn coincident_nodes_stay_finite() {
        let mut nodes = vec![SimState::at(vec2(5.0, 5.0)), SimState::at(vec2(5.0, 5.0))];
        step_physics(
            &mut nodes,
            &[(0, 1)],
            &[true, true],
            Vec2::ZERO,
            PhysicsConfig::default(),
        );
        for node in &nodes {
            assert!(node.pos.x.is_finite() && node.pos.y.is_finite());
        }
    }

    #[test]
    fn spring_pulls_stretched_link_together() {
        let mut nodes = vec![SimState::pinned(Vec2::ZERO), SimState::at(vec2(400.0, 0.0))];
        let config = PhysicsConfig {
            repulsion: 0.0,
            center_pull: 0.0,
            ..PhysicsConfig::default()
        };
        step_physics(&mut nodes, &[(0, 1)], &[true, true], Vec2::ZERO, config);

        assert_eq!(nodes[0].pos, Vec2::ZERO);
        assert!(nodes[1].pos.x < 400.0);
    }

    #[test]
    fn fixed_dragged_and_hidden_nodes_do_not_move() {
        let mut nodes = vec![
            SimState::pinned(vec2(0.0, 0.0)),
            SimState {
                dragging: true,
                ..SimState::at(vec2(20.0, 0.0))
            },
            SimState::at(vec2(0.0, 20.0)),
            SimState::at(vec2(500.0, 500.0)),
        ];
        let before = nodes.clone();
        step_physics(
            &mut nodes,
            &[(0, 1), (1, 2), (2, 3)],
            &[true, true, true, false],
            vec2(100.0, 100.0),
            PhysicsConfig::default(),
        );

        assert_eq!(nodes[0], before[0]);
        assert_eq!(nodes[1], before[1]);
        assert_eq!(nodes[3], before[3]);
        assert_ne!(nodes[2].pos, before[2].pos);
    }

    #[test]
    fn hidden_nodes_exert_no_force() {
        let mut nodes = vec![SimState::at(vec2(0.0, 0.0)), SimState::at(vec2(5.0, 0.0))];
        step_physics(
            &mut nodes,
            &[],
            &[true, false],
            Vec2::ZERO,
            PhysicsConfig::default(),
        );
        assert_eq!(nodes[0].pos, Vec2::ZERO);
    }
}
