use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::store::new_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateEntry {
    pub id: String,
    pub message: String,
    pub created_at: String,
}

impl UpdateEntry {
    pub fn new(message: String) -> Self {
        Self {
            id: new_id(),
            message,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Newest first. RFC 3339 stamps from one clock sort lexically; the sort is
/// stable so equal stamps keep backend order.
pub fn newest_first(mut updates: Vec<UpdateEntry>) -> Vec<UpdateEntry> {
    updates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(id: &str, created_at: &str) -> UpdateEntry {
        UpdateEntry {
            id: id.to_string(),
            message: id.to_string(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn newest_first_orders_by_created_at() {
        let sorted = newest_first(vec![
            update("a", "2026-01-01T10:00:00+00:00"),
            update("b", "2026-01-03T10:00:00+00:00"),
            update("c", "2026-01-02T10:00:00+00:00"),
        ]);
        let ids: Vec<_> = sorted.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}
