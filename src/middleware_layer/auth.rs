use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{handlers::auth::SESSION_COOKIE, models::session::Session, state::AppState};

use redis::AsyncCommands;

/// Extracts the session id from the request cookies.
fn extract_session_token(cookies: &Cookies) -> Option<Uuid> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Loads the session referenced by the cookie, if it is present, parseable
/// and not expired.
async fn load_session(state: &mut AppState, cookies: &Cookies) -> Option<Session> {
    let session_id = extract_session_token(cookies)?;

    let session_json: Option<String> = state
        .redis
        .get(format!("session:{}", session_id))
        .await
        .map_err(|e| tracing::error!("❌ Redis error while loading session: {}", e))
        .ok()?;

    let session: Session = sonic_rs::from_str(&session_json?)
        .map_err(|e| tracing::warn!("❌ Invalid session JSON: {}", e))
        .ok()?;

    if !session.logged_in || session.is_expired(chrono::Utc::now()) {
        tracing::debug!("Session expired for student: {}", session.student_id);
        let _: () = state
            .redis
            .del(format!("session:{}", session_id))
            .await
            .unwrap_or(());
        return None;
    }

    Some(session)
}

/// Middleware guarding the dashboard: without a valid session the browser is
/// sent back to the login page with the `sessionexpired` marker the frontend
/// turns into a toast.
pub async fn require_session(
    State(mut state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match load_session(&mut state, &cookies).await {
        Some(session) => {
            tracing::debug!("✅ Session valid for student: {}", session.student_id);
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => Redirect::to("/login?sessionexpired=1").into_response(),
    }
}
