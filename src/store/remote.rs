use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{de, normalize_name, StoreError};
use crate::config::RemoteConfig;
use crate::models::{Attendance, RsvpEntry, UpdateEntry};

const RSVPS_PATH: &str = "/rest/v1/rsvps";
const UPDATES_PATH: &str = "/rest/v1/updates";

const RSVP_COLUMNS: &str = "id,name,normalized_name,guest_count,attendance,created_at,updated_at";
const UPDATE_COLUMNS: &str = "id,message,created_at";

const PREFER_MERGE: &str = "resolution=merge-duplicates,return=minimal";
const PREFER_MINIMAL: &str = "return=minimal";

#[derive(Deserialize)]
struct RsvpRow {
    #[serde(deserialize_with = "de::id")]
    id: String,
    name: String,
    normalized_name: Option<String>,
    #[serde(default = "de::default_guest_count", deserialize_with = "de::guest_count")]
    guest_count: i64,
    #[serde(default, deserialize_with = "de::attendance")]
    attendance: Attendance,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<RsvpRow> for RsvpEntry {
    fn from(row: RsvpRow) -> Self {
        RsvpEntry {
            id: row.id,
            normalized_name: row
                .normalized_name
                .unwrap_or_else(|| normalize_name(&row.name)),
            name: row.name,
            guest_count: row.guest_count,
            attendance: row.attendance,
            created_at: row.created_at.unwrap_or_default(),
            updated_at: row.updated_at,
        }
    }
}

#[derive(Deserialize)]
struct UpdateRow {
    #[serde(deserialize_with = "de::id")]
    id: String,
    message: String,
    #[serde(default)]
    created_at: String,
}

/// Upsert body. The row id is never sent: on a normalized-name conflict the
/// backend keeps the id it already has.
#[derive(Serialize)]
struct RsvpPayload<'a> {
    name: &'a str,
    normalized_name: &'a str,
    guest_count: i64,
    attendance: Attendance,
    created_at: &'a str,
}

#[derive(Serialize)]
struct UpdatePayload<'a> {
    message: &'a str,
}

/// Client for a PostgREST-style endpoint exposing `rsvps` and `updates`.
pub struct RemoteStore {
    client: Client,
    base_url: String,
    key: String,
}

impl RemoteStore {
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url,
            key: config.anon_key,
        }
    }

    pub async fn get_rsvps(&self) -> Result<Vec<RsvpEntry>, StoreError> {
        let rows: Option<Vec<RsvpRow>> = self
            .request(
                Method::GET,
                RSVPS_PATH,
                &[("select", RSVP_COLUMNS), ("order", "updated_at.desc")],
                None::<&()>,
                None,
            )
            .await?;

        Ok(rows.unwrap_or_default().into_iter().map(RsvpEntry::from).collect())
    }

    pub async fn upsert_rsvp(&self, entry: RsvpEntry) -> Result<(), StoreError> {
        let body = [RsvpPayload {
            name: &entry.name,
            normalized_name: &entry.normalized_name,
            guest_count: entry.guest_count,
            attendance: entry.attendance,
            created_at: &entry.created_at,
        }];

        self.request::<serde_json::Value, _>(
            Method::POST,
            RSVPS_PATH,
            &[("on_conflict", "normalized_name")],
            Some(&body),
            Some(PREFER_MERGE),
        )
        .await?;
        Ok(())
    }

    pub async fn delete_rsvp(&self, id: &str) -> Result<(), StoreError> {
        let filter = format!("eq.{id}");
        self.request::<serde_json::Value, ()>(
            Method::DELETE,
            RSVPS_PATH,
            &[("id", filter.as_str())],
            None,
            None,
        )
        .await?;
        Ok(())
    }

    pub async fn clear_rsvps(&self) -> Result<(), StoreError> {
        self.request::<serde_json::Value, ()>(
            Method::DELETE,
            RSVPS_PATH,
            &[("id", "not.is.null")],
            None,
            None,
        )
        .await?;
        Ok(())
    }

    /// Newest first.
    pub async fn get_updates(&self) -> Result<Vec<UpdateEntry>, StoreError> {
        let rows: Option<Vec<UpdateRow>> = self
            .request(
                Method::GET,
                UPDATES_PATH,
                &[("select", UPDATE_COLUMNS), ("order", "created_at.desc")],
                None::<&()>,
                None,
            )
            .await?;

        Ok(rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| UpdateEntry {
                id: row.id,
                message: row.message,
                created_at: row.created_at,
            })
            .collect())
    }

    pub async fn add_update(&self, message: &str) -> Result<(), StoreError> {
        let body = [UpdatePayload { message }];
        self.request::<serde_json::Value, _>(
            Method::POST,
            UPDATES_PATH,
            &[],
            Some(&body),
            Some(PREFER_MINIMAL),
        )
        .await?;
        Ok(())
    }

    /// Sends one authenticated request. Returns `None` for 204 or an empty
    /// body; non-2xx statuses become [`StoreError::Remote`].
    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<&B>,
        prefer: Option<&str>,
    ) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{method} {path}");

        let mut req = self
            .client
            .request(method, &url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key);

        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(prefer) = prefer {
            req = req.header("Prefer", prefer);
        }

        let res = req.send().await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!("Backend request to {path} failed with {status}");
            return Err(StoreError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = res.text().await?;
        if text.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&text)?))
    }
}
