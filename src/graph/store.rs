use std::collections::{HashMap, HashSet};

use eframe::egui::Vec2;
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde::{Deserialize, Serialize};

use super::profile::Profile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Follower,
    Mutual,
}

impl LinkKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Follower => "follower",
            Self::Mutual => "mutual",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

/// Topology of a node: where it sits in the discovery tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMeta {
    pub id: String,
    pub level: u8,
    pub parent_id: Option<String>,
    pub group: String,
}

impl NodeMeta {
    pub fn root(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level: 0,
            parent_id: None,
            group: String::new(),
        }
    }

    pub fn child(
        id: impl Into<String>,
        level: u8,
        parent_id: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            level,
            parent_id: Some(parent_id.into()),
            group: group.into(),
        }
    }
}

/// Everything the simulator reads or writes for one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimState {
    pub pos: Vec2,
    pub vel: Vec2,
    pub fixed: bool,
    pub dragging: bool,
}

impl SimState {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }

    pub fn pinned(pos: Vec2) -> Self {
        Self {
            fixed: true,
            ..Self::at(pos)
        }
    }

    /// Whether the integrator may move this node.
    pub fn is_free(&self) -> bool {
        !self.fixed && !self.dragging
    }
}

/// Node and link storage for one population run.
///
/// Nodes live in three parallel columns (topology, simulation state, display
/// payload) indexed densely and resolved by id through `index_by_id`. Nothing
/// is ever removed except by [`GraphStore::clear`].
#[derive(Default)]
pub struct GraphStore {
    metas: Vec<NodeMeta>,
    sims: Vec<SimState>,
    profiles: Vec<Profile>,
    index_by_id: HashMap<String, usize>,
    links: Vec<Link>,
    link_pairs: HashSet<(String, String)>,
    revision: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the node unless its id is already taken. Returns whether it was inserted.
    pub fn add_node(&mut self, meta: NodeMeta, sim: SimState, profile: Profile) -> bool {
        if self.index_by_id.contains_key(&meta.id) {
            return false;
        }

        let index = self.metas.len();
        self.index_by_id.insert(meta.id.clone(), index);
        self.metas.push(meta);
        self.sims.push(sim);
        self.profiles.push(profile);
        self.revision += 1;
        true
    }

    /// Inserts the ordered pair unless it already exists. Endpoints are not validated.
    pub fn add_link(&mut self, source: &str, target: &str, kind: LinkKind) -> bool {
        if !self
            .link_pairs
            .insert((source.to_owned(), target.to_owned()))
        {
            return false;
        }

        self.links.push(Link {
            source: source.to_owned(),
            target: target.to_owned(),
            kind,
        });
        self.revision += 1;
        true
    }

    pub fn clear(&mut self) {
        self.metas.clear();
        self.sims.clear();
        self.profiles.clear();
        self.index_by_id.clear();
        self.links.clear();
        self.link_pairs.clear();
        self.revision += 1;
    }

    /// Bumped on every structural change; used to invalidate derived caches.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node_count(&self) -> usize {
        self.metas.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn meta(&self, id: &str) -> Option<&NodeMeta> {
        self.index_of(id).map(|index| &self.metas[index])
    }

    pub fn sim(&self, id: &str) -> Option<&SimState> {
        self.index_of(id).map(|index| &self.sims[index])
    }

    pub fn sim_mut(&mut self, id: &str) -> Option<&mut SimState> {
        let index = self.index_of(id)?;
        self.sims.get_mut(index)
    }

    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.index_of(id).map(|index| &self.profiles[index])
    }

    pub fn position(&self, id: &str) -> Option<Vec2> {
        self.sim(id).map(|sim| sim.pos)
    }

    pub fn metas(&self) -> &[NodeMeta] {
        &self.metas
    }

    pub fn sim_states_mut(&mut self) -> &mut [SimState] {
        &mut self.sims
    }

    /// Iterates `(meta, sim, profile)` for every node in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeMeta, &SimState, &Profile)> {
        self.metas
            .iter()
            .zip(self.sims.iter())
            .zip(self.profiles.iter())
            .map(|((meta, sim), profile)| (meta, sim, profile))
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Links whose endpoints both resolve, as dense index pairs.
    pub fn resolved_links(&self) -> Vec<(usize, usize)> {
        self.links
            .iter()
            .filter_map(|link| Some((self.index_of(&link.source)?, self.index_of(&link.target)?)))
            .collect()
    }

    /// Per-index visibility mask for the given hidden set.
    pub fn visibility(&self, hidden: &HashSet<String>) -> Vec<bool> {
        self.metas
            .iter()
            .map(|meta| !hidden.contains(&meta.id))
            .collect()
    }

    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a NodeMeta> + 'a {
        self.metas
            .iter()
            .filter(move |meta| meta.parent_id.as_deref() == Some(id))
    }

    /// The node itself plus every node reachable from it through `parent_id`.
    /// Unknown ids still yield themselves so hiding stays consistent with late arrivals.
    pub fn subtree(&self, id: &str) -> HashSet<String> {
        let mut visited = HashSet::new();
        let mut stack = vec![id.to_owned()];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }

            for child in self.children_of(&current) {
                if !visited.contains(&child.id) {
                    stack.push(child.id.clone());
                }
            }
        }

        visited
    }

    /// Ids whose username fuzzy-matches `query`, best match first.
    pub fn search(&self, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .metas
            .iter()
            .zip(self.profiles.iter())
            .filter_map(|(meta, profile)| {
                fuzzy_match_score(&matcher, &profile.username, query)
                    .map(|score| (score, meta.id.as_str()))
            })
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.into_iter().map(|(_, id)| id.to_owned()).collect()
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}
