use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub const MOCK_NAMES: &[&str] = &[
    "sarah_j",
    "mike_travels",
    "tech_guru",
    "foodie_life",
    "fit_jenny",
    "art_by_leo",
    "daily_dose",
    "urban_lens",
    "nomad_kate",
    "code_ninja",
];

const LOCATIONS: &[&str] = &[
    "New York, USA",
    "London, UK",
    "Berlin, DE",
    "Tokyo, JP",
    "Unknown",
];

const PUBLIC_BIO: &str = "Digital explorer | Tech enthusiast | NYC | DM for collab";
const PRIVATE_BIO: &str = "This account is private.";

/// Display payload of a discovered account. The engine carries it through
/// unchanged; only the panels and the persistence sink read it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    pub full_name: String,
    pub bio: String,
    pub followers_count: u32,
    pub following_count: u32,
    pub posts_count: u32,
    pub is_private: bool,
    pub risk_score: u8,
    pub avatar: String,
    pub location: String,
    pub joined_days_ago: u32,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl Profile {
    pub fn is_high_risk(&self) -> bool {
        self.risk_score > 70
    }
}

pub fn generate_profile<R: Rng + ?Sized>(id: &str, username: Option<&str>, rng: &mut R) -> Profile {
    let username = username
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("user_{id}"));
    let is_private = rng.gen_bool(0.12);

    let email = rng.gen_bool(0.3).then(|| format!("{username}@gmail.com"));
    let phone = rng.gen_bool(0.2).then(|| "+1 *** *** ****".to_owned());
    let location = LOCATIONS.choose(rng).copied().unwrap_or("Unknown");

    Profile {
        full_name: display_name(&username),
        bio: if is_private { PRIVATE_BIO } else { PUBLIC_BIO }.to_owned(),
        followers_count: rng.gen_range(100..5100),
        following_count: rng.gen_range(50..1050),
        posts_count: rng.gen_range(1..=20),
        is_private,
        risk_score: rng.gen_range(0..100),
        avatar: format!("https://api.dicebear.com/7.x/avataaars/svg?seed={username}"),
        location: location.to_owned(),
        joined_days_ago: rng.gen_range(0..116),
        email,
        phone,
        username,
    }
}

fn display_name(username: &str) -> String {
    username
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
