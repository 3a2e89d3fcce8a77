//! Profile → one dense semantic query string.
//!
//! Pure and deterministic: no network, no oracle.

use crate::types::profile::Profile;

/// Query used when the profile carries no search signal at all.
pub const FALLBACK_QUERY: &str = "open job positions across roles and industries";

const MAX_SKILLS: usize = 12;
const MAX_EXPERIENCES: usize = 3;
const MAX_EXCERPT_CHARS: usize = 160;

/// Build the retrieval query for a profile.
///
/// Never empty.
pub fn compose_query(profile: &Profile) -> String {
    let prefs = &profile.job_preferences;
    let mut sentences: Vec<String> = Vec::new();

    let roles = join_nonempty(&prefs.role_types, " or ");
    let mut headline = if roles.is_empty() {
        "Roles".to_string()
    } else {
        format!("{} roles", roles)
    };

    let industries = join_nonempty(&prefs.industries, ", ");
    if !industries.is_empty() {
        headline.push_str(&format!(" in {}", industries));
    }
    if prefs.remote {
        headline.push_str(", remote-friendly");
    }
    let locations = join_nonempty(&prefs.locations, ", ");
    if !locations.is_empty() {
        headline.push_str(&format!(", located in {}", locations));
    }
    if headline != "Roles" {
        sentences.push(headline);
    }

    let skills: Vec<&str> = profile
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_SKILLS)
        .collect();
    if !skills.is_empty() {
        sentences.push(format!("requiring {}", skills.join(", ")));
    }

    let excerpts: Vec<String> = profile
        .experience
        .iter()
        .map(|e| e.description.trim())
        .filter(|d| !d.is_empty())
        .take(MAX_EXPERIENCES)
        .map(|d| excerpt(d, MAX_EXCERPT_CHARS))
        .collect();
    if !excerpts.is_empty() {
        sentences.push(format!("relevant experience: {}", excerpts.join("; ")));
    }

    if sentences.is_empty() {
        return FALLBACK_QUERY.to_string();
    }
    sentences.join(". ")
}

fn join_nonempty(items: &[String], sep: &str) -> String {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    collapsed.chars().take(max_chars).collect::<String>().trim_end().to_string()
}
