use askama::Template;
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;

use crate::countdown::Countdown;
use crate::error::AppError;
use crate::models::{Attendance, NewRsvp};
use crate::routes::{update_views, UpdateView};
use crate::AppState;

const THANKS: &str = "Thank you! Your RSVP has been received.";
const SAVE_FAILED: &str = "Could not save RSVP right now. Please try again.";

pub struct Notice {
    pub text: &'static str,
    pub is_error: bool,
}

#[derive(Template)]
#[template(path = "invite.html")]
struct InviteTemplate {
    title: String,
    event_iso: String,
    event_display: String,
    countdown: Countdown,
    updates: Vec<UpdateView>,
    notice: Option<Notice>,
    static_hash: &'static str,
}

#[derive(Deserialize)]
pub struct RsvpForm {
    #[serde(default)]
    guest_name: String,
    #[serde(default)]
    guest_count: String,
    #[serde(default)]
    attendance: Option<String>,
}

/// Turns a raw form into an upsert payload, or `None` when the submission
/// should be ignored: blank name, guest count that is not an integer of at
/// least 1, or an unknown attendance value.
pub fn parse_submission(form: &RsvpForm) -> Option<NewRsvp> {
    let name = form.guest_name.trim();
    if name.is_empty() {
        return None;
    }

    let guest_count: i64 = form.guest_count.trim().parse().ok()?;
    if guest_count < 1 {
        return None;
    }

    let attendance = match form.attendance.as_deref().map(str::trim) {
        None | Some("") => Attendance::Yes,
        Some(raw) => raw.parse().ok()?,
    };

    Some(NewRsvp {
        created_at: Some(Utc::now().to_rfc3339()),
        ..NewRsvp::new(name, guest_count, attendance)
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(invite_page))
        .route("/rsvp", post(submit_rsvp))
}

async fn render_page(state: &AppState, notice: Option<Notice>) -> Result<Html<String>, AppError> {
    let updates = state.store.get_updates().await.unwrap_or_else(|e| {
        tracing::warn!("Could not load updates: {e}");
        Vec::new()
    });

    let template = InviteTemplate {
        title: state.site.event_title.clone(),
        event_iso: state.site.event_at.to_rfc3339(),
        event_display: state.site.event_at.format("%A, %B %-d, %Y").to_string(),
        countdown: Countdown::until(state.site.event_at, Utc::now()),
        updates: update_views(updates),
        notice,
        static_hash: crate::STATIC_HASH,
    };
    Ok(Html(template.render()?))
}

async fn invite_page(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    render_page(&state, None).await
}

async fn submit_rsvp(
    State(state): State<AppState>,
    Form(form): Form<RsvpForm>,
) -> Result<impl IntoResponse, AppError> {
    let Some(rsvp) = parse_submission(&form) else {
        return render_page(&state, None).await;
    };

    let notice = match state.store.upsert_rsvp(rsvp).await {
        Ok(()) => Notice {
            text: THANKS,
            is_error: false,
        },
        Err(e) => {
            tracing::error!("Could not save RSVP: {e}");
            Notice {
                text: SAVE_FAILED,
                is_error: true,
            }
        }
    };

    render_page(&state, Some(notice)).await
}
