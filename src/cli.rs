use serde::Deserialize;
use std::fs;

use crate::models::{Attendance, NewRsvp};
use crate::store::{de, Store, StoreError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyRsvp {
    #[serde(default, deserialize_with = "de::text")]
    name: String,
    #[serde(default = "de::default_guest_count", deserialize_with = "de::guest_count")]
    guest_count: i64,
    #[serde(default, deserialize_with = "de::attendance")]
    attendance: Attendance,
    #[serde(default)]
    created_at: Option<String>,
}

impl LegacyRsvp {
    fn into_new_rsvp(self) -> NewRsvp {
        NewRsvp {
            id: None,
            guest_count: Some(self.guest_count),
            attendance: Some(self.attendance),
            created_at: self.created_at,
            name: self.name,
        }
    }
}

/// Upserts every record of an exported RSVP list into `store`. Records that
/// share a normalized name collapse into one; blank names are skipped.
pub async fn import_rsvps(store: &Store, file_path: &str) -> Result<usize, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let records: Vec<LegacyRsvp> = serde_json::from_str(&content)?;

    let mut imported = 0;
    for record in records {
        if record.name.trim().is_empty() {
            tracing::warn!("Skipping RSVP record without a name");
            continue;
        }
        store.upsert_rsvp(record.into_new_rsvp()).await.map_err(|e: StoreError| {
            tracing::error!("Import stopped after {imported} records");
            e
        })?;
        imported += 1;
    }

    println!("Imported {} RSVPs into {} storage", imported, store.mode());
    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_records_read_loosely() {
        let records: Vec<LegacyRsvp> = serde_json::from_str(
            r#"[{"name":"Jo","guestCount":"2","attendance":"maybe"},
                {"name":null,"guestCount":"abc","attendance":7}]"#,
        )
        .unwrap();

        assert_eq!(records[1].name, "");
        assert_eq!(records[1].guest_count, 1);
        assert_eq!(records[1].attendance, Attendance::Yes);

        let jo = records.into_iter().next().unwrap().into_new_rsvp();
        assert_eq!(jo.guest_count, Some(2));
        assert_eq!(jo.attendance, Some(Attendance::Maybe));
    }

    #[tokio::test]
    async fn import_merges_by_normalized_name() {
        let pool = crate::db::memory_pool().await.unwrap();
        let store = Store::new(pool, None);

        let path = std::env::temp_dir().join(format!("rsvps-{}.json", crate::store::new_id()));
        fs::write(
            &path,
            r#"[
                {"name":"Jo","guestCount":"2","attendance":"yes","createdAt":"2026-01-01T00:00:00Z"},
                {"name":" jo ","guestCount":4,"attendance":"no"},
                {"name":"","guestCount":1},
                {"name":"Amy"}
            ]"#,
        )
        .unwrap();

        let imported = import_rsvps(&store, path.to_str().unwrap()).await.unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(imported, 3);
        let entries = store.get_rsvps().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "jo");
        assert_eq!(entries[0].guest_count, 4);
        assert_eq!(entries[0].attendance, Attendance::No);
        assert_eq!(entries[1].name, "Amy");
        assert_eq!(entries[1].guest_count, 1);
    }
}
