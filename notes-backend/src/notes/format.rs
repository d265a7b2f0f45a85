//! Human-readable timestamps for note lists and the editor meta line.

use chrono::{DateTime, Local, Utc};

use crate::models::Note;

/// Compact relative age: "42s ago", "5m ago", "3h ago", "2d ago"
pub fn time_ago(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - ts).num_seconds().max(0);
    if secs < 60 {
        return format!("{}s ago", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m ago", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

/// Local date-time in the style of an en-US locale string
pub fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

pub fn meta_line(note: Option<&Note>, now: DateTime<Utc>) -> String {
    let Some(note) = note else {
        return "—".to_string();
    };
    let mut line = format!(
        "Created {} • Updated {}",
        format_local(note.created_at),
        time_ago(note.updated_at, now)
    );
    if let Some(file_name) = &note.file_name {
        line.push_str(" • ");
        line.push_str(file_name);
    }
    line
}
