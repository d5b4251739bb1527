use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use super::{de, normalize_name, StoreError};
use crate::models::{Attendance, RsvpEntry, UpdateEntry};

pub const RSVPS_KEY: &str = "engagement_rsvps";
pub const UPDATES_KEY: &str = "engagement_updates";

/// RSVP as persisted in the local slot. The normalized name is derived on
/// read, and older records may lack an id or carry a string guest count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRsvp {
    #[serde(
        default,
        deserialize_with = "de::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<String>,
    #[serde(default, deserialize_with = "de::text")]
    name: String,
    #[serde(default = "de::default_guest_count", deserialize_with = "de::guest_count")]
    guest_count: i64,
    #[serde(default, deserialize_with = "de::attendance")]
    attendance: Attendance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
}

impl StoredRsvp {
    fn effective_id(&self, index: usize) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!(
                "legacy-{index}-{}",
                self.created_at.as_deref().unwrap_or("unknown")
            ),
        }
    }

    fn into_entry(self, index: usize) -> RsvpEntry {
        RsvpEntry {
            id: self.effective_id(index),
            normalized_name: normalize_name(&self.name),
            name: self.name,
            guest_count: self.guest_count,
            attendance: self.attendance,
            created_at: self.created_at.unwrap_or_default(),
            updated_at: None,
        }
    }
}

// Pins the synthetic ids of legacy records before a rewrite so later
// positional changes cannot shift them.
fn pin_ids(list: &mut [StoredRsvp]) {
    for (index, stored) in list.iter_mut().enumerate() {
        if stored.id.as_deref().is_none_or(str::is_empty) {
            stored.id = Some(stored.effective_id(index));
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUpdate {
    id: String,
    message: String,
    created_at: String,
}

/// JSON lists kept in named slots of the `kv_slots` table. Every mutation
/// rewrites the whole list.
pub struct LocalStore {
    db: SqlitePool,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn get_rsvps(&self) -> Result<Vec<RsvpEntry>, StoreError> {
        let list: Vec<StoredRsvp> = self.read_slot(RSVPS_KEY).await?;
        Ok(list
            .into_iter()
            .enumerate()
            .map(|(index, stored)| stored.into_entry(index))
            .collect())
    }

    pub async fn upsert_rsvp(&self, entry: RsvpEntry) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut list: Vec<StoredRsvp> = self.read_slot(RSVPS_KEY).await?;
        pin_ids(&mut list);

        match list
            .iter_mut()
            .find(|stored| normalize_name(&stored.name) == entry.normalized_name)
        {
            Some(stored) => {
                stored.name = entry.name;
                stored.guest_count = entry.guest_count;
                stored.attendance = entry.attendance;
                stored.created_at = Some(entry.created_at);
            }
            None => list.push(StoredRsvp {
                id: Some(entry.id),
                name: entry.name,
                guest_count: entry.guest_count,
                attendance: entry.attendance,
                created_at: Some(entry.created_at),
            }),
        }

        self.write_slot(RSVPS_KEY, &list).await
    }

    pub async fn delete_rsvp(&self, id: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut list: Vec<StoredRsvp> = self.read_slot(RSVPS_KEY).await?;

        let before = list.len();
        pin_ids(&mut list);
        list.retain(|stored| stored.id.as_deref() != Some(id));

        if list.len() == before {
            return Ok(());
        }
        self.write_slot(RSVPS_KEY, &list).await
    }

    pub async fn clear_rsvps(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.write_slot::<StoredRsvp>(RSVPS_KEY, &[]).await
    }

    /// Insertion order, oldest first.
    pub async fn get_updates(&self) -> Result<Vec<UpdateEntry>, StoreError> {
        let list: Vec<StoredUpdate> = self.read_slot(UPDATES_KEY).await?;
        Ok(list
            .into_iter()
            .map(|u| UpdateEntry {
                id: u.id,
                message: u.message,
                created_at: u.created_at,
            })
            .collect())
    }

    pub async fn add_update(&self, message: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut list: Vec<StoredUpdate> = self.read_slot(UPDATES_KEY).await?;

        let update = UpdateEntry::new(message.to_string());
        list.push(StoredUpdate {
            id: update.id,
            message: update.message,
            created_at: update.created_at,
        });

        self.write_slot(UPDATES_KEY, &list).await
    }

    // A missing slot, or one that is not a JSON array, reads as an empty
    // list. Records that cannot be read are skipped one by one so the rest
    // survive the next rewrite.
    async fn read_slot<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        let raw: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_slots WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        let Some((raw,)) = raw else {
            return Ok(Vec::new());
        };

        let records: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Discarding malformed {key} slot: {e}");
                return Ok(Vec::new());
            }
        };

        Ok(records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::warn!("Skipping unreadable {key} record {index}: {e}");
                    None
                }
            })
            .collect())
    }

    async fn write_slot<T: Serialize>(&self, key: &str, list: &[T]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(list)?;

        sqlx::query(
            r#"
            INSERT INTO kv_slots (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(&raw)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}
