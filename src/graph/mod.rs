mod profile;
mod store;

pub use profile::{MOCK_NAMES, Profile, generate_profile};
pub use store::{GraphStore, LinkKind, NodeMeta, SimState};
