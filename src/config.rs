use std::{env, fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};
use url::Url;

const PLACEHOLDER_URL: &str = "YOUR_SUPABASE_URL";
const PLACEHOLDER_KEY: &str = "YOUR_SUPABASE_ANON_KEY";

pub const DEFAULT_ADMIN_PIN: &str = "4580";
pub const DEFAULT_EVENT_DATE: &str = "2026-03-14T18:30:00";

pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub secure_cookies: bool,
    pub remote: Option<RemoteConfig>,
    pub site: SiteConfig,
}

/// Everything the pages need that does not come from storage.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub event_title: String,
    pub event_at: DateTime<Utc>,
    pub admin_pin: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            event_title: "Our Engagement".to_string(),
            event_at: parse_event_date(DEFAULT_EVENT_DATE).unwrap_or_else(Utc::now),
            admin_pin: DEFAULT_ADMIN_PIN.to_string(),
        }
    }
}

/// Hosted database endpoint. Only constructed from usable values, so holding
/// one means cloud mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub anon_key: String,
}

impl RemoteConfig {
    /// Both values must be present, non-empty, free of the documented
    /// placeholder text, and the URL must parse as http(s).
    pub fn from_parts(url: Option<String>, key: Option<String>) -> Option<Self> {
        let url = url?.trim().to_string();
        let key = key?.trim().to_string();

        if url.is_empty() || key.is_empty() {
            return None;
        }
        if url.contains(PLACEHOLDER_URL) || key.contains(PLACEHOLDER_KEY) {
            return None;
        }

        match Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => {
                warn!("Ignoring malformed SUPABASE_URL: {url}");
                return None;
            }
        }

        Some(Self {
            base_url: url.trim_end_matches('/').to_string(),
            anon_key: key,
        })
    }
}

impl Config {
    pub fn load() -> Self {
        let defaults = SiteConfig::default();

        let event_at = var("EVENT_DATE")
            .ok()
            .and_then(|raw| {
                parse_event_date(&raw).or_else(|| {
                    warn!("Invalid EVENT_DATE value: {raw}");
                    None
                })
            })
            .unwrap_or(defaults.event_at);

        Self {
            database_url: try_load("DATABASE_URL", "sqlite:data/invite.db".to_string()),
            port: try_load("PORT", 3000),
            secure_cookies: try_load("SECURE_COOKIES", false),
            remote: RemoteConfig::from_parts(
                env::var("SUPABASE_URL").ok(),
                env::var("SUPABASE_ANON_KEY").ok(),
            ),
            site: SiteConfig {
                event_title: var("EVENT_TITLE").unwrap_or(defaults.event_title),
                event_at,
                admin_pin: var("ADMIN_PIN").unwrap_or(defaults.admin_pin),
            },
        }
    }
}

/// Accepts RFC 3339, or a bare `YYYY-MM-DDTHH:MM:SS` read as UTC.
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not set, using default");
    })
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = var(key) else {
        return default;
    };
    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value: {e}, using default: {default}");
        default
    })
}
