//! Display-only decorations for connection cards.
//!
//! Nothing in this module is derived from real data. Mutual connections,
//! response rate, last-active and recent-activity strings are random draws
//! that exist purely so the UI has something to render. Do not use them for
//! ranking, filtering or any business decision.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{GeneratedConnection, UserProfile};

const LAST_ACTIVE: &[&str] = &["2 hours ago", "5 hours ago", "1 day ago", "2 days ago", "1 week ago"];

/// Non-authoritative UI metrics for one card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub mutual_connections: u32,
    pub response_rate: u32,
    pub last_active: String,
    pub recent_activity: String,
}

impl DisplayMetrics {
    /// Draw a fresh set of decorative metrics
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, connection: &GeneratedConnection) -> Self {
        Self {
            mutual_connections: rng.gen_range(5..=19),
            response_rate: rng.gen_range(70..=94),
            last_active: LAST_ACTIVE.choose(rng).copied().unwrap_or("1 day ago").to_string(),
            recent_activity: recent_activity(rng, connection),
        }
    }
}

fn recent_activity<R: Rng + ?Sized>(rng: &mut R, connection: &GeneratedConnection) -> String {
    let company = &connection.company;
    let skill = connection.skills.first().map(String::as_str).unwrap_or("technology");
    let next_skill = connection.skills.get(1).map(String::as_str).unwrap_or("cloud computing");
    let interest = connection.interests.first().map(String::as_str).unwrap_or("innovation");

    match rng.gen_range(0..8) {
        0 => format!("Recently shared insights about {skill} trends"),
        1 => format!("Posted about recent project at {company}"),
        2 => format!("Attended {company} tech meetup"),
        3 => format!("Shared article about {interest} in tech"),
        4 => format!("Celebrated team achievement at {company}"),
        5 => format!("Speaking at upcoming {skill} conference"),
        6 => format!("Promoted to {} at {company}", connection.title),
        _ => format!("Completed certification in {next_skill}"),
    }
}

/// Whether the candidate appears to share the user's institution.
///
/// Uses the candidate's education entries when present. Candidates without
/// education data get a 15% random draw, which is as decorative as the
/// metrics above.
pub fn is_alumni<R: Rng + ?Sized>(rng: &mut R, connection: &GeneratedConnection, profile: &UserProfile) -> bool {
    let institution = profile.education.institution.trim().to_lowercase();

    if connection.education.is_empty() || institution.is_empty() {
        return rng.gen_bool(0.15);
    }

    let theirs = connection.education.join(" ").to_lowercase();
    let short_name = institution.split_whitespace().next().unwrap_or(&institution);
    theirs.contains(&institution) || theirs.contains(short_name)
}
