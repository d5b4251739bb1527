pub mod admin;
pub mod invite;

use chrono::DateTime;

use crate::models::{newest_first, UpdateEntry};

pub struct UpdateView {
    pub message: String,
    pub time: String,
}

/// Short local-style stamp, e.g. "Mar 14, 06:30 PM".
pub fn format_timestamp(raw: &str) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(parsed.format("%b %-d, %I:%M %p").to_string())
}

pub fn update_views(updates: Vec<UpdateEntry>) -> Vec<UpdateView> {
    newest_first(updates)
        .into_iter()
        .map(|update| UpdateView {
            time: format_timestamp(&update.created_at).unwrap_or_default(),
            message: update.message,
        })
        .collect()
}
