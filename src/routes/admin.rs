use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect},
    routing::{delete, get, post},
    Form, Router,
};
use serde::Deserialize;
use std::collections::HashSet;
use tower_sessions::Session;

use crate::auth::{self, AdminSession};
use crate::error::AppError;
use crate::models::{Attendance, RsvpEntry};
use crate::routes::{format_timestamp, update_views, UpdateView};
use crate::store::{normalize_name, StorageMode};
use crate::AppState;

#[derive(Template)]
#[template(path = "admin/login.html")]
struct LoginTemplate {
    error: Option<String>,
    static_hash: &'static str,
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    mode_label: &'static str,
    rsvps: RsvpPanel,
    updates: Vec<UpdateView>,
    static_hash: &'static str,
}

#[derive(Template)]
#[template(path = "admin/rsvps.html")]
struct RsvpPanelTemplate {
    rsvps: RsvpPanel,
}

#[derive(Template)]
#[template(path = "admin/updates.html")]
struct UpdatesPanelTemplate {
    updates: Vec<UpdateView>,
}

pub struct RsvpView {
    pub id: String,
    pub name: String,
    pub guest_count: i64,
    pub label: &'static str,
    pub time: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub yes: usize,
    pub no: usize,
    pub maybe: usize,
    pub total_guests: i64,
}

pub struct RsvpPanel {
    pub entries: Vec<RsvpView>,
    pub stats: Stats,
}

impl RsvpPanel {
    fn new(entries: Vec<RsvpEntry>) -> Self {
        let stats = tally(&entries);
        let entries = entries
            .into_iter()
            .map(|entry| RsvpView {
                label: entry.attendance.label(),
                time: format_timestamp(&entry.created_at)
                    .unwrap_or_else(|| "Unknown time".to_string()),
                id: entry.id,
                name: entry.name,
                guest_count: entry.guest_count,
            })
            .collect();
        Self { entries, stats }
    }
}

#[derive(Deserialize)]
pub struct PinForm {
    #[serde(default)]
    pin: String,
}

#[derive(Deserialize)]
pub struct UpdateForm {
    #[serde(default)]
    message: String,
}

pub fn tally(entries: &[RsvpEntry]) -> Stats {
    entries.iter().fold(Stats::default(), |mut stats, entry| {
        match entry.attendance {
            Attendance::Yes => stats.yes += 1,
            Attendance::No => stats.no += 1,
            Attendance::Maybe => stats.maybe += 1,
        }
        stats.total_guests += entry.guest_count;
        stats
    })
}

/// Ids of every entry whose normalized name was already seen earlier in
/// `entries`. The first occurrence of each name is kept.
pub fn duplicate_ids(entries: &[RsvpEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    entries
        .iter()
        .filter(|entry| !seen.insert(normalize_name(&entry.name)))
        .map(|entry| entry.id.clone())
        .collect()
}

fn mode_label(mode: StorageMode) -> &'static str {
    match mode {
        StorageMode::Cloud => "Backend: Cloud (shared across devices)",
        StorageMode::Local => "Backend: Local (this server only)",
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin_page))
        .route("/admin/unlock", post(unlock))
        .route("/admin/lock", post(lock))
        .route("/admin/rsvps", get(rsvp_panel))
        .route("/admin/rsvps/{id}", delete(delete_rsvp))
        .route("/admin/rsvps/dedupe", post(dedupe_rsvps))
        .route("/admin/rsvps/clear", post(clear_rsvps))
        .route("/admin/updates", get(updates_panel))
        .route("/admin/updates", post(add_update))
}

fn render_login(error: Option<String>) -> Result<Html<String>, AppError> {
    let template = LoginTemplate {
        error,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

async fn render_rsvp_panel(state: &AppState) -> Result<Html<String>, AppError> {
    let entries = state.store.get_rsvps().await?;
    let template = RsvpPanelTemplate {
        rsvps: RsvpPanel::new(entries),
    };
    Ok(Html(template.render()?))
}

async fn render_updates_panel(state: &AppState) -> Result<Html<String>, AppError> {
    let updates = state.store.get_updates().await?;
    let template = UpdatesPanelTemplate {
        updates: update_views(updates),
    };
    Ok(Html(template.render()?))
}

async fn admin_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    if !auth::is_unlocked(&session).await {
        return render_login(None);
    }

    let entries = state.store.get_rsvps().await?;
    let updates = state.store.get_updates().await?;

    let template = DashboardTemplate {
        mode_label: mode_label(state.store.mode()),
        rsvps: RsvpPanel::new(entries),
        updates: update_views(updates),
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

async fn unlock(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PinForm>,
) -> Result<impl IntoResponse, AppError> {
    if !auth::pin_matches(&form.pin, &state.site.admin_pin) {
        tracing::info!("Rejected admin PIN");
        return Ok(render_login(Some("Incorrect PIN".to_string()))?.into_response());
    }

    auth::unlock(&session).await?;
    Ok(Redirect::to("/admin").into_response())
}

async fn lock(session: Session) -> Result<impl IntoResponse, AppError> {
    auth::lock(&session).await?;
    Ok(Redirect::to("/admin"))
}

async fn rsvp_panel(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<impl IntoResponse, AppError> {
    render_rsvp_panel(&state).await
}

async fn delete_rsvp(
    State(state): State<AppState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.store.delete_rsvp(&id).await?;
    render_rsvp_panel(&state).await
}

async fn dedupe_rsvps(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.store.get_rsvps().await?;
    let duplicates = duplicate_ids(&entries);
    tracing::info!("Removing {} duplicate RSVPs", duplicates.len());

    for id in &duplicates {
        state.store.delete_rsvp(id).await?;
    }
    render_rsvp_panel(&state).await
}

async fn clear_rsvps(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<impl IntoResponse, AppError> {
    state.store.clear_rsvps().await?;
    tracing::info!("Cleared all RSVPs");
    render_rsvp_panel(&state).await
}

async fn updates_panel(
    State(state): State<AppState>,
    _admin: AdminSession,
) -> Result<impl IntoResponse, AppError> {
    render_updates_panel(&state).await
}

async fn add_update(
    State(state): State<AppState>,
    _admin: AdminSession,
    Form(form): Form<UpdateForm>,
) -> Result<impl IntoResponse, AppError> {
    state.store.add_update(&form.message).await?;
    render_updates_panel(&state).await
}
