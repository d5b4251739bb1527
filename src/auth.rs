use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

const ADMIN_UNLOCKED_KEY: &str = "admin_unlocked";

/// Present when the session has been unlocked with the admin PIN. This is a
/// convenience gate, not access control.
pub struct AdminSession;

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = LockedRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locked = LockedRedirect {
            htmx: parts.headers.contains_key("hx-request"),
        };
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|_| locked)?;

        if is_unlocked(&session).await {
            Ok(AdminSession)
        } else {
            Err(locked)
        }
    }
}

/// Sends a locked browser back to the PIN page. htmx requests get an
/// `HX-Redirect` so the panel poll navigates the whole page instead of
/// swapping the login form into the panel.
#[derive(Clone, Copy)]
pub struct LockedRedirect {
    htmx: bool,
}

impl IntoResponse for LockedRedirect {
    fn into_response(self) -> Response {
        if self.htmx {
            (StatusCode::UNAUTHORIZED, [("HX-Redirect", "/admin")]).into_response()
        } else {
            Redirect::to("/admin").into_response()
        }
    }
}

pub fn pin_matches(submitted: &str, expected: &str) -> bool {
    submitted.trim() == expected
}

pub async fn is_unlocked(session: &Session) -> bool {
    session
        .get::<bool>(ADMIN_UNLOCKED_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or(false)
}

pub async fn unlock(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.insert(ADMIN_UNLOCKED_KEY, true).await
}

pub async fn lock(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<bool>(ADMIN_UNLOCKED_KEY).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_compare_trims_input() {
        assert!(pin_matches(" 4580 ", "4580"));
        assert!(!pin_matches("4581", "4580"));
        assert!(!pin_matches("", "4580"));
    }
}
