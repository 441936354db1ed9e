use std::f32::consts::TAU;
use std::fmt;

use eframe::egui::{Vec2, vec2};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::config::Settings;
use crate::graph::{GraphStore, LinkKind, MOCK_NAMES, NodeMeta, SimState, generate_profile};

use super::schedule::TimerQueue;
use super::sink::{ConnectionRecord, PersistenceSink, ProfileRecord};

/// Distance between a freshly discovered node and its parent.
const CHILD_RADIUS: f32 = 120.0;
const SIBLING_DELAY_SECS: f64 = 0.3;
const LEVEL_DELAY_SECS: f64 = 0.5;
const RUN_SECS_PER_LEVEL: f64 = 3.0;
const ROOT_GROUP: &str = "A";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct SpawnChild {
    run: RunId,
    parent_id: String,
    parent_pos: Vec2,
    level: u8,
    index: usize,
    count: usize,
    group: String,
}

/// Grows a graph from a root identity one deferred node at a time.
///
/// Each run owns the tasks it schedules through its [`RunId`]; starting a new
/// run leaves stale tasks queued, and they are discarded when they come due.
pub struct Pipeline {
    run: RunId,
    queue: TimerQueue<SpawnChild>,
    rng: StdRng,
    depth: u8,
    target: Option<String>,
    finishes_at: Option<f64>,
}

impl Pipeline {
    pub fn new(rng: StdRng) -> Self {
        Self {
            run: RunId::default(),
            queue: TimerQueue::default(),
            rng,
            depth: Settings::MIN_DEPTH,
            target: None,
            finishes_at: None,
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn current_run(&self) -> RunId {
        self.run
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// True until the depth-proportional timeout of the current run elapses.
    pub fn is_scraping(&self, now: f64) -> bool {
        self.finishes_at.is_some_and(|finishes_at| now < finishes_at)
    }

    /// Tasks of the current run that have not fired yet.
    pub fn pending(&self) -> usize {
        self.queue.iter().filter(|task| task.run == self.run).count()
    }

    /// Due time of the earliest queued task, stale ones included.
    pub fn next_due(&self) -> Option<f64> {
        self.queue.next_due()
    }

    /// Clears `store`, inserts the root at `center` and schedules its children.
    ///
    /// Returns `None` without touching anything when `target` is blank.
    pub fn start(
        &mut self,
        target: &str,
        settings: &Settings,
        center: Vec2,
        now: f64,
        store: &mut GraphStore,
        sink: &dyn PersistenceSink,
    ) -> Option<RunId> {
        let target = target.trim();
        if target.is_empty() {
            debug!("ignoring population request with empty target");
            return None;
        }

        self.run = RunId(self.run.0 + 1);
        self.depth = settings.depth();
        self.target = Some(target.to_owned());
        self.finishes_at = Some(now + f64::from(self.depth) * RUN_SECS_PER_LEVEL);
        store.clear();

        let root_id = format!("root_{target}");
        let meta = NodeMeta {
            group: ROOT_GROUP.to_owned(),
            ..NodeMeta::root(root_id.clone())
        };
        let profile = generate_profile(&root_id, Some(target), &mut self.rng);
        let record = ProfileRecord::new(&meta, &profile);
        store.add_node(meta, SimState::pinned(center), profile);
        forward_profile(sink, record);

        info!(
            run = self.run.0,
            account = target,
            depth = self.depth,
            stealth = settings.stealth_mode,
            "population run started"
        );

        self.schedule_children(&root_id, center, 1, ROOT_GROUP, now);
        Some(self.run)
    }

    /// Fires every task due at `now`. Returns how many nodes were inserted.
    pub fn poll(&mut self, now: f64, store: &mut GraphStore, sink: &dyn PersistenceSink) -> usize {
        let mut inserted = 0;

        while let Some((due, task)) = self.queue.pop_due(now) {
            if task.run != self.run {
                trace!(
                    stale_run = task.run.0,
                    run = self.run.0,
                    "discarding task from superseded run"
                );
                continue;
            }

            if self.spawn(task, due, store, sink) {
                inserted += 1;
            }
        }

        inserted
    }

    fn fan_out(&mut self, level: u8) -> usize {
        if level == 1 {
            self.rng.gen_range(6..=9)
        } else {
            self.rng.gen_range(2..=4)
        }
    }

    fn schedule_children(
        &mut self,
        parent_id: &str,
        parent_pos: Vec2,
        level: u8,
        group: &str,
        base: f64,
    ) {
        if level > self.depth {
            return;
        }

        let count = self.fan_out(level);
        for index in 0..count {
            let delay = index as f64 * SIBLING_DELAY_SECS + f64::from(level) * LEVEL_DELAY_SECS;
            self.queue.schedule(
                base + delay,
                SpawnChild {
                    run: self.run,
                    parent_id: parent_id.to_owned(),
                    parent_pos,
                    level,
                    index,
                    count,
                    group: group.to_owned(),
                },
            );
        }
    }

    fn spawn(
        &mut self,
        task: SpawnChild,
        due: f64,
        store: &mut GraphStore,
        sink: &dyn PersistenceSink,
    ) -> bool {
        let node_id = format!(
            "l{}_{}_{}_{}",
            task.level, task.group, task.parent_id, task.index
        );
        let username = MOCK_NAMES[task.index % MOCK_NAMES.len()];
        let profile = generate_profile(&node_id, Some(username), &mut self.rng);

        let angle = (task.index as f32 / task.count as f32) * TAU;
        let pos = task.parent_pos + vec2(angle.cos(), angle.sin()) * CHILD_RADIUS;

        let meta = NodeMeta::child(&node_id, task.level, &task.parent_id, &task.group);
        let record = ProfileRecord::new(&meta, &profile);
        let inserted = store.add_node(meta, SimState::at(pos), profile);
        if inserted {
            forward_profile(sink, record);
        }

        if store.add_link(&task.parent_id, &node_id, LinkKind::Follower) {
            let record = ConnectionRecord {
                source: task.parent_id.clone(),
                target: node_id.clone(),
                kind: LinkKind::Follower,
            };
            if let Err(error) = sink.upsert_connection(record) {
                warn!(%error, parent = %task.parent_id, child = %node_id, "failed to forward connection");
            }
        }

        if inserted {
            trace!(node = %node_id, level = task.level, "node discovered");
            self.schedule_children(&node_id, pos, task.level + 1, &task.group, due);
        }

        inserted
    }
}

fn forward_profile(sink: &dyn PersistenceSink, record: ProfileRecord) {
    let node = record.id.clone();
    if let Err(error) = sink.upsert_profile(record) {
        warn!(%error, %node, "failed to forward profile");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use super::super::sink::{NullSink, SinkError};

    const CENTER: Vec2 = vec2(400.0, 300.0);
    const FOREVER: f64 = 1.0e6;

    fn settings(depth: u8) -> Settings {
        Settings {
            scrape_depth: depth,
            stealth_mode: false,
        }
    }

    #[derive(Default)]
    struct FailingSink {
        attempts: Cell<usize>,
    }

    impl PersistenceSink for FailingSink {
        fn upsert_profile(&self, _record: ProfileRecord) -> Result<(), SinkError> {
            self.attempts.set(self.attempts.get() + 1);
            Err(SinkError::Disconnected)
        }

        fn upsert_connection(&self, _record: ConnectionRecord) -> Result<(), SinkError> {
            self.attempts.set(self.attempts.get() + 1);
            Err(SinkError::Disconnected)
        }
    }

    #[test]
    fn depth_one_yields_root_and_first_hop() {
        for seed in 0..16 {
            let mut pipeline = Pipeline::seeded(seed);
            let mut store = GraphStore::new();
            pipeline
                .start("alice", &settings(1), CENTER, 0.0, &mut store, &NullSink)
                .expect("run started");

            assert_eq!(store.node_count(), 1);
            let root = store.meta("root_alice").expect("root exists");
            assert_eq!(root.level, 0);
            assert!(root.parent_id.is_none());
            assert_eq!(store.sim("root_alice").map(|sim| sim.fixed), Some(true));
            assert_eq!(store.position("root_alice"), Some(CENTER));

            pipeline.poll(FOREVER, &mut store, &NullSink);

            let children = store
                .metas()
                .iter()
                .filter(|meta| meta.level == 1)
                .collect::<Vec<_>>();
            assert!((6..=9).contains(&children.len()), "seed {seed}: {}", children.len());
            assert_eq!(children.len() + 1, store.node_count());
            for child in children {
                assert_eq!(child.parent_id.as_deref(), Some("root_alice"));
                assert!(store.links().iter().any(|link| {
                    link.source == "root_alice"
                        && link.target == child.id
                        && link.kind == LinkKind::Follower
                }));
            }
            assert_eq!(pipeline.pending(), 0);
        }
    }

    #[test]
    fn deeper_levels_branch_two_to_four() {
        let mut pipeline = Pipeline::seeded(5);
        let mut store = GraphStore::new();
        pipeline.start("bob", &settings(3), CENTER, 0.0, &mut store, &NullSink);
        pipeline.poll(FOREVER, &mut store, &NullSink);

        let max_level = store.metas().iter().map(|meta| meta.level).max();
        assert_eq!(max_level, Some(3));
        for meta in store.metas().iter().filter(|meta| (1..3).contains(&meta.level)) {
            let children = store.children_of(&meta.id).count();
            assert!((2..=4).contains(&children), "{} has {children}", meta.id);
        }
        for meta in store.metas() {
            if let Some(parent) = &meta.parent_id {
                let parent_index = store.index_of(parent).expect("parent inserted");
                assert!(parent_index < store.index_of(&meta.id).expect("node indexed"));
            }
        }
    }

    #[test]
    fn children_arrive_staggered() {
        let mut pipeline = Pipeline::seeded(2);
        let mut store = GraphStore::new();
        pipeline.start("carol", &settings(2), CENTER, 10.0, &mut store, &NullSink);

        assert_eq!(pipeline.poll(10.49, &mut store, &NullSink), 0);
        assert_eq!(pipeline.poll(10.5, &mut store, &NullSink), 1);
        assert_eq!(pipeline.poll(10.85, &mut store, &NullSink), 1);
        assert!(store.metas().iter().all(|meta| meta.level < 2));

        pipeline.poll(FOREVER, &mut store, &NullSink);
        assert!(store.metas().iter().any(|meta| meta.level == 2));
    }

    #[test]
    fn first_child_sits_on_the_ring_around_its_parent() {
        let mut pipeline = Pipeline::seeded(9);
        let mut store = GraphStore::new();
        pipeline.start("dave", &settings(1), CENTER, 0.0, &mut store, &NullSink);
        pipeline.poll(FOREVER, &mut store, &NullSink);

        let position = store.position("l1_A_root_dave_0").expect("first child");
        assert!((position - (CENTER + vec2(CHILD_RADIUS, 0.0))).length() < 1.0e-3);
        assert_eq!(
            store.profile("l1_A_root_dave_0").map(|profile| profile.username.as_str()),
            Some(MOCK_NAMES[0])
        );
    }

    #[test]
    fn blank_target_is_rejected() {
        let mut pipeline = Pipeline::seeded(1);
        let mut store = GraphStore::new();
        pipeline.start("alice", &settings(1), CENTER, 0.0, &mut store, &NullSink);
        let run = pipeline.current_run();

        assert_eq!(
            pipeline.start("   ", &settings(1), CENTER, 1.0, &mut store, &NullSink),
            None
        );
        assert_eq!(pipeline.current_run(), run);
        assert!(store.contains("root_alice"));
    }

    #[test]
    fn superseded_run_tasks_are_discarded() {
        let mut pipeline = Pipeline::seeded(4);
        let mut store = GraphStore::new();
        let first = pipeline.start("alice", &settings(2), CENTER, 0.0, &mut store, &NullSink);
        pipeline.poll(0.6, &mut store, &NullSink);
        assert!(store.contains("l1_A_root_alice_0"));

        let second = pipeline.start("bob", &settings(1), CENTER, 0.7, &mut store, &NullSink);
        assert!(second > first);
        assert!(pipeline.next_due().is_some());
        pipeline.poll(FOREVER, &mut store, &NullSink);

        assert!(store.contains("root_bob"));
        assert!(
            store
                .metas()
                .iter()
                .all(|meta| !meta.id.contains("alice")),
            "stale tasks leaked into the new run"
        );
        assert_eq!(pipeline.next_due(), None);
    }

    #[test]
    fn scraping_indicator_is_a_depth_timeout() {
        let mut pipeline = Pipeline::seeded(3);
        let mut store = GraphStore::new();
        assert!(!pipeline.is_scraping(0.0));

        pipeline.start("erin", &settings(2), CENTER, 1.0, &mut store, &NullSink);
        assert!(pipeline.is_scraping(6.9));
        assert!(!pipeline.is_scraping(7.0));

        let stealthy = Settings {
            scrape_depth: 2,
            stealth_mode: true,
        };
        pipeline.start("erin", &stealthy, CENTER, 0.0, &mut store, &NullSink);
        assert!(pipeline.is_scraping(5.9));
        assert!(!pipeline.is_scraping(6.0));

        pipeline.start("erin", &Settings::default(), CENTER, 10.0, &mut store, &NullSink);
        assert!(pipeline.is_scraping(12.9));
        assert!(!pipeline.is_scraping(13.0));
    }

    #[test]
    fn default_settings_keep_base_delays() {
        let mut pipeline = Pipeline::seeded(12);
        let mut store = GraphStore::new();
        let settings = Settings {
            scrape_depth: 2,
            ..Settings::default()
        };
        assert!(settings.stealth_mode);
        pipeline.start("gina", &settings, CENTER, 0.0, &mut store, &NullSink);

        // Level-one child i fires at i * 0.3 + 0.5 seconds.
        assert_eq!(pipeline.next_due(), Some(0.5));
        pipeline.poll(0.5, &mut store, &NullSink);
        assert!(store.contains("l1_A_root_gina_0"));
        assert!(!store.contains("l1_A_root_gina_1"));

        // Its first grandchild follows 0 * 0.3 + 2 * 0.5 seconds later.
        pipeline.poll(0.85, &mut store, &NullSink);
        assert!(store.contains("l1_A_root_gina_1"));
        assert!(!store.contains("l2_A_l1_A_root_gina_0_0"));
        pipeline.poll(1.5, &mut store, &NullSink);
        assert!(store.contains("l2_A_l1_A_root_gina_0_0"));
    }

    #[test]
    fn sink_failures_do_not_stop_population() {
        let sink = FailingSink::default();
        let mut pipeline = Pipeline::seeded(8);
        let mut store = GraphStore::new();
        pipeline.start("frank", &settings(2), CENTER, 0.0, &mut store, &sink);
        pipeline.poll(FOREVER, &mut store, &sink);

        assert!(store.metas().iter().any(|meta| meta.level == 2));
        assert_eq!(sink.attempts.get(), store.node_count() + store.link_count());
    }
}
