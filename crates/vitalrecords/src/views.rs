//! Derived views over the two record collections.
//!
//! Nothing here holds state: every view is rebuilt from the birth and death
//! collections it is handed. Feeds merge both collections birth-first and
//! then sort newest-first with a stable sort, so records sharing a timestamp
//! keep birth-before-death order.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::record::{Origin, Profile, Record};

/// Default number of entries in the dashboard activity feed.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 5;

/// Default number of entries in the notification feed.
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 10;

/// Default number of profiles offered by the profile selector.
pub const DEFAULT_PROFILE_MENU_LIMIT: usize = 8;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 1440;

/// A line of the dashboard's recent activity list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub origin: Origin,
    /// "First Last".
    pub name: String,
    pub headline: &'static str,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A line of the navigation bar's notification menu.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationEntry {
    #[serde(rename = "type")]
    pub origin: Origin,
    pub message: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// The profile this notification points at.
    pub profile: Profile,
}

/// Headline counts shown on the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub birth_registrations: usize,
    pub death_registrations: usize,
    pub total_records: usize,
    /// One certificate can be issued per registered record.
    pub certificates_available: usize,
}

/// How [`format_relative_time`] spells its units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeStyle {
    /// "5 minutes ago", as on the dashboard.
    #[default]
    Long,
    /// "5m ago", as in the navigation bar.
    Short,
}

/// Number of records in a collection.
#[must_use]
pub fn count_records(collection: &[Record]) -> usize {
    collection.len()
}

/// Counts for the dashboard cards.
#[must_use]
pub fn dashboard_stats(birth: &[Record], death: &[Record]) -> DashboardStats {
    let birth_registrations = count_records(birth);
    let death_registrations = count_records(death);
    let total_records = birth_registrations + death_registrations;
    DashboardStats {
        birth_registrations,
        death_registrations,
        total_records,
        certificates_available: total_records,
    }
}

/// Both collections as profiles, birth first, each in stored order.
#[must_use]
pub fn all_profiles(birth: &[Record], death: &[Record]) -> Vec<Profile> {
    birth
        .iter()
        .chain(death)
        .cloned()
        .map(Profile::new)
        .collect()
}

/// The first `limit` profiles, as offered by the profile selector.
#[must_use]
pub fn profile_menu(profiles: &[Profile], limit: usize) -> Vec<Profile> {
    profiles.iter().take(limit).cloned().collect()
}

/// Both collections merged newest-first, truncated to `limit`.
///
/// Records without a readable registration timestamp sort last.
fn newest_first<'a>(birth: &'a [Record], death: &'a [Record], limit: usize) -> Vec<&'a Record> {
    let mut merged: Vec<&Record> = birth.iter().chain(death).collect();
    // `sort_by` is stable; equal timestamps keep birth-then-death order.
    merged.sort_by(|a, b| b.registered_at().cmp(&a.registered_at()));
    merged.truncate(limit);
    merged
}

/// The most recent registrations across both collections.
#[must_use]
pub fn recent_activity(birth: &[Record], death: &[Record], limit: usize) -> Vec<ActivityEntry> {
    newest_first(birth, death, limit)
        .into_iter()
        .map(|record| ActivityEntry {
            origin: record.origin(),
            name: record.display_name(),
            headline: match record.origin() {
                Origin::Birth => "New birth registered",
                Origin::Death => "New death registered",
            },
            timestamp: record.registered_at(),
        })
        .collect()
}

/// The most recent registrations, as navigation-bar notifications.
#[must_use]
pub fn recent_notifications(
    birth: &[Record],
    death: &[Record],
    limit: usize,
) -> Vec<NotificationEntry> {
    newest_first(birth, death, limit)
        .into_iter()
        .map(|record| NotificationEntry {
            origin: record.origin(),
            message: format!(
                "New {} registration: {}",
                record.origin(),
                record.display_name()
            ),
            timestamp: record.registered_at(),
            profile: Profile::new(record.clone()),
        })
        .collect()
}

/// Describe how long ago `timestamp` was, relative to `now`.
///
/// Elapsed time is floored to whole minutes, then shown in minutes below an
/// hour, hours below a day, and days otherwise. Timestamps after `now` read
/// as zero minutes.
#[must_use]
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>, style: TimeStyle) -> String {
    let minutes = (now - timestamp).num_minutes().max(0);

    let (value, long_unit, short_unit) = if minutes < MINUTES_PER_HOUR {
        (minutes, "minutes", "m")
    } else if minutes < MINUTES_PER_DAY {
        (minutes / MINUTES_PER_HOUR, "hours", "h")
    } else {
        (minutes / MINUTES_PER_DAY, "days", "d")
    };

    match style {
        TimeStyle::Long => format!("{value} {long_unit} ago"),
        TimeStyle::Short => format!("{value}{short_unit} ago"),
    }
}
