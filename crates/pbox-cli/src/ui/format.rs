//! Formatting utilities for CLI output.

use chrono::{DateTime, Utc};

/// Format bytes as a human-readable string (KB, MB, GB).
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format a timestamp relative to now: "just now", "5 mins ago", "3h ago",
/// "2d ago", or the date for anything older than a week.
pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);

    if duration.num_seconds() < 0 || duration.num_days() >= 7 {
        timestamp.format("%Y-%m-%d").to_string()
    } else if duration.num_minutes() < 1 {
        "just now".to_string()
    } else if duration.num_hours() < 1 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_days() < 1 {
        format!("{}h ago", duration.num_hours())
    } else {
        format!("{}d ago", duration.num_days())
    }
}

/// Join names with commas, or `-` when there are none.
pub fn format_names<S: AsRef<str>>(names: &[S]) -> String {
    if names.is_empty() {
        return "-".to_string();
    }
    names.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1_500_000), "1.4 MB");
    }

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time(now), "just now");
        assert_eq!(format_relative_time(now - Duration::minutes(5)), "5 mins ago");
        assert_eq!(format_relative_time(now - Duration::hours(3)), "3h ago");
        assert_eq!(format_relative_time(now - Duration::days(2)), "2d ago");
        let old = now - Duration::days(30);
        assert_eq!(format_relative_time(old), old.format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_format_names() {
        let none: Vec<String> = Vec::new();
        assert_eq!(format_names(&none), "-");
        assert_eq!(format_names(&["detectors", "packers"]), "detectors, packers");
    }
}
