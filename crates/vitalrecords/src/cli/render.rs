//! Text rendering of the derived views for the terminal.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::record::Profile;
use crate::views::{
    format_relative_time, ActivityEntry, DashboardStats, NotificationEntry, TimeStyle,
};

use super::OutputFormat;

/// Render a serializable value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> crate::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn when(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>, style: TimeStyle) -> String {
    timestamp.map_or_else(
        || "unknown".to_string(),
        |ts| format_relative_time(ts, now, style),
    )
}

#[must_use]
pub fn stats(stats: &DashboardStats) -> String {
    format!(
        "Birth Registrations:     {}\n\
         Death Registrations:     {}\n\
         Total Records:           {}\n\
         Certificates Available:  {}\n",
        stats.birth_registrations,
        stats.death_registrations,
        stats.total_records,
        stats.certificates_available
    )
}

/// Render the recent activity list.
///
/// # Errors
///
/// Returns an error if JSON output is requested and serialization fails.
pub fn activity(
    entries: &[ActivityEntry],
    now: DateTime<Utc>,
    format: OutputFormat,
) -> crate::Result<String> {
    if format == OutputFormat::Json {
        return json(entries);
    }
    if entries.is_empty() {
        return Ok("No recent activities\n".to_string());
    }

    let mut out = String::new();
    for entry in entries {
        let ago = when(entry.timestamp, now, TimeStyle::Long);
        match format {
            OutputFormat::Table => {
                let _ = writeln!(out, "{:<22} {:<28} {}", entry.headline, entry.name, ago);
            }
            _ => {
                let _ = writeln!(out, "{}\n  {} - {}", entry.headline, entry.name, ago);
            }
        }
    }
    Ok(out)
}

/// Render the notification menu.
///
/// # Errors
///
/// Returns an error if JSON output is requested and serialization fails.
pub fn notifications(
    entries: &[NotificationEntry],
    now: DateTime<Utc>,
    format: OutputFormat,
) -> crate::Result<String> {
    if format == OutputFormat::Json {
        return json(entries);
    }
    if entries.is_empty() {
        return Ok("No new registrations\n".to_string());
    }

    let mut out = format!("Recent Registrations ({})\n", entries.len());
    for entry in entries {
        let ago = when(entry.timestamp, now, TimeStyle::Short);
        match format {
            OutputFormat::Table => {
                let _ = writeln!(out, "{:<48} {:>8}", entry.message, ago);
            }
            _ => {
                let _ = writeln!(out, "{}\n  {}", entry.message, ago);
            }
        }
    }
    Ok(out)
}

/// Render a list of profiles, as used by search and the profile listing.
///
/// # Errors
///
/// Returns an error if JSON output is requested and serialization fails.
pub fn profiles(profiles: &[Profile], format: OutputFormat) -> crate::Result<String> {
    if format == OutputFormat::Json {
        return json(profiles);
    }
    if profiles.is_empty() {
        return Ok("No matching profiles\n".to_string());
    }

    let mut out = String::new();
    if format == OutputFormat::Table {
        let _ = writeln!(out, "{:<6} {:<16} {:<4} {}", "TYPE", "ID", "", "NAME");
    }
    for profile in profiles {
        let record = profile.record();
        match format {
            OutputFormat::Table => {
                let _ = writeln!(
                    out,
                    "{:<6} {:<16} {:<4} {}",
                    profile.origin(),
                    record.id().to_string(),
                    record.initials(),
                    record.display_name()
                );
            }
            _ => {
                let _ = writeln!(
                    out,
                    "{}\n  {} record - ID: {}",
                    record.display_name(),
                    profile.origin(),
                    record.id()
                );
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::{birth, death};
    use crate::views::{all_profiles, dashboard_stats, recent_activity, recent_notifications};

    fn now() -> DateTime<Utc> {
        "2024-01-02T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_stats() {
        let births = vec![birth(1, "Ann", "Lee", "2024-01-01T00:00:00Z")];
        let out = stats(&dashboard_stats(&births, &[]));
        assert!(out.contains("Birth Registrations:     1"));
        assert!(out.contains("Death Registrations:     0"));
        assert!(out.contains("Certificates Available:  1"));
    }

    #[test]
    fn test_activity_plain() {
        let births = vec![birth(1, "Ann", "Lee", "2024-01-01T00:00:00Z")];
        let entries = recent_activity(&births, &[], 5);
        let out = activity(&entries, now(), OutputFormat::Plain).unwrap();
        assert!(out.contains("New birth registered"));
        assert!(out.contains("Ann Lee - 1 days ago"));
    }

    #[test]
    fn test_activity_empty() {
        let out = activity(&[], now(), OutputFormat::Table).unwrap();
        assert_eq!(out, "No recent activities\n");
    }

    #[test]
    fn test_notifications_short_time() {
        let deaths = vec![death(7, "Kim", "Park", "2024-01-01T23:30:00Z")];
        let entries = recent_notifications(&[], &deaths, 10);
        let out = notifications(&entries, now(), OutputFormat::Plain).unwrap();
        assert!(out.starts_with("Recent Registrations (1)"));
        assert!(out.contains("New death registration: Kim Park"));
        assert!(out.contains("30m ago"));
    }

    #[test]
    fn test_notifications_json_has_profile() {
        let deaths = vec![death(7, "Kim", "Park", "2024-01-01T23:30:00Z")];
        let entries = recent_notifications(&[], &deaths, 10);
        let out = notifications(&entries, now(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["type"], "death");
        assert_eq!(value[0]["profile"]["id"], 7);
    }

    #[test]
    fn test_profiles_table() {
        let list = all_profiles(
            &[birth(1, "Ann", "Lee", "2024-01-01T00:00:00Z")],
            &[death(7, "Kim", "Park", "2024-01-01T00:00:00Z")],
        );
        let out = profiles(&list, OutputFormat::Table).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("birth"));
        assert!(lines[1].contains("AL"));
        assert!(lines[2].contains("Kim Park"));
    }

    #[test]
    fn test_profiles_plain_and_empty() {
        let list = all_profiles(&[birth(1, "Ann", "Lee", "2024-01-01T00:00:00Z")], &[]);
        let out = profiles(&list, OutputFormat::Plain).unwrap();
        assert!(out.contains("birth record - ID: 1"));

        assert_eq!(
            profiles(&[], OutputFormat::Plain).unwrap(),
            "No matching profiles\n"
        );
    }
}
