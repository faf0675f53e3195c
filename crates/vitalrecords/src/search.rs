//! Profile search for the navigation bar.

use crate::record::Profile;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Whether `profile` matches `query`.
///
/// Names match case-insensitively; the identifier matches as a plain
/// substring of its string form.
fn matches(profile: &Profile, query: &str, lowered: &str) -> bool {
    let record = profile.record();
    record.first_name().to_lowercase().contains(lowered)
        || record.last_name().to_lowercase().contains(lowered)
        || record.id().to_string().contains(query)
}

/// Find up to `limit` profiles matching `query`, in profile order.
///
/// A query that is blank after trimming matches nothing.
#[must_use]
pub fn search(profiles: &[Profile], query: &str, limit: usize) -> Vec<Profile> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let lowered = query.to_lowercase();
    profiles
        .iter()
        .filter(|profile| matches(profile, query, &lowered))
        .take(limit)
        .cloned()
        .collect()
}
