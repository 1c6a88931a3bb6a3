use axum::{Extension, Json, response::IntoResponse};
use serde::Serialize;

use crate::{error::Result, models::session::Session};

/// The dashboard shell payload; the frontend renders the greeting and the
/// static widgets around it.
#[derive(Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub firstname: String,
}

/// Serves the dashboard shell for an authenticated student. The session
/// extension is inserted by `middleware_layer::auth::require_session`.
#[axum::debug_handler]
pub async fn dashboard(Extension(session): Extension<Session>) -> Result<impl IntoResponse> {
    Ok(Json(DashboardResponse {
        success: true,
        firstname: session.firstname,
    }))
}
