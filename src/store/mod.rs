//! Storage for RSVPs and announcement updates.
//!
//! [`Store`] picks one backend at startup and keeps it: a local key/value
//! slot table in the app's SQLite database, or a hosted REST endpoint. Callers
//! only ever see the facade.

pub(crate) mod de;
pub mod local;
pub mod remote;

use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::config::RemoteConfig;
use crate::models::{NewRsvp, RsvpEntry, UpdateEntry};

pub use local::LocalStore;
pub use remote::RemoteStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend request failed ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error("Backend unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Local,
    Cloud,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::Local => write!(f, "local"),
            StorageMode::Cloud => write!(f, "cloud"),
        }
    }
}

/// Canonical comparison key for a guest name: trimmed, lower-cased, with
/// whitespace runs collapsed to a single space.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub enum Store {
    Local(LocalStore),
    Cloud(RemoteStore),
}

impl Store {
    /// Chooses the backend once. A usable remote config means cloud mode for
    /// the lifetime of the process; anything else means local mode.
    pub fn new(pool: SqlitePool, remote: Option<RemoteConfig>) -> Self {
        match remote {
            Some(config) => {
                tracing::info!("Using cloud storage at {}", config.base_url);
                Store::Cloud(RemoteStore::new(config))
            }
            None => {
                tracing::info!("Using local storage");
                Store::Local(LocalStore::new(pool))
            }
        }
    }

    pub fn mode(&self) -> StorageMode {
        match self {
            Store::Local(_) => StorageMode::Local,
            Store::Cloud(_) => StorageMode::Cloud,
        }
    }

    pub async fn get_rsvps(&self) -> Result<Vec<RsvpEntry>, StoreError> {
        match self {
            Store::Local(store) => store.get_rsvps().await,
            Store::Cloud(store) => store.get_rsvps().await,
        }
    }

    /// Inserts or merges by normalized name. A blank name is ignored.
    pub async fn upsert_rsvp(&self, rsvp: NewRsvp) -> Result<(), StoreError> {
        if rsvp.name.trim().is_empty() {
            tracing::debug!("Ignoring RSVP with blank name");
            return Ok(());
        }

        let entry = rsvp.into_entry();
        match self {
            Store::Local(store) => store.upsert_rsvp(entry).await,
            Store::Cloud(store) => store.upsert_rsvp(entry).await,
        }
    }

    pub async fn delete_rsvp(&self, id: &str) -> Result<(), StoreError> {
        match self {
            Store::Local(store) => store.delete_rsvp(id).await,
            Store::Cloud(store) => store.delete_rsvp(id).await,
        }
    }

    pub async fn clear_rsvps(&self) -> Result<(), StoreError> {
        match self {
            Store::Local(store) => store.clear_rsvps().await,
            Store::Cloud(store) => store.clear_rsvps().await,
        }
    }

    pub async fn get_updates(&self) -> Result<Vec<UpdateEntry>, StoreError> {
        match self {
            Store::Local(store) => store.get_updates().await,
            Store::Cloud(store) => store.get_updates().await,
        }
    }

    /// Appends an announcement. Blank messages are ignored.
    pub async fn add_update(&self, message: &str) -> Result<(), StoreError> {
        let message = message.trim();
        if message.is_empty() {
            tracing::debug!("Ignoring blank update");
            return Ok(());
        }

        match self {
            Store::Local(store) => store.add_update(message).await,
            Store::Cloud(store) => store.add_update(message).await,
        }
    }
}
