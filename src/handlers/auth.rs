use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies, cookie::time::Duration};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::session::Session,
    services::{auth as auth_service, registration as registration_service},
    state::AppState,
    validation::forms::*,
};

use redis::AsyncCommands;

/// The registration form, including the anti-automation fields.
#[derive(Deserialize, Debug)]
pub struct RegisterForm {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub dob: String,
    #[serde(default)]
    pub password: String,
    /// Honeypot: CSS-hidden field, must stay empty.
    #[serde(default)]
    pub website: String,
    /// Honeypot: JS-injected field, must stay empty.
    #[serde(default)]
    pub nickname: String,
    /// Client render timestamp in milliseconds since the epoch. Kept as a
    /// string so a tampered value fails the honeypot check with the uniform
    /// JSON body instead of failing form deserialization.
    #[serde(default)]
    pub form_render_time: String,
}

/// The login form.
#[derive(Deserialize, Debug)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Email + code pair, accepted from the mailed link (query) or a form post.
#[derive(Deserialize, Debug)]
pub struct VerifyParams {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
}

/// The uniform `{success, message}` response body.
#[derive(Serialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

/// The login response; `firstname` feeds the personalized welcome.
#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    pub message: String,
}

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Creates the session cookie: HttpOnly, SameSite=Strict, Secure in
/// production.
fn session_cookie(value: String, max_age_days: i64, production: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_http_only(true);
    if production {
        cookie.set_secure(true);
    }
    cookie.set_same_site(tower_cookies::cookie::SameSite::Strict);
    cookie.set_max_age(Duration::seconds(max_age_days * 86400));
    cookie.set_path("/");
    cookie
}

/// Handles registration form posts.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<impl IntoResponse> {
    tracing::info!("📝 Register attempt: {}", form.email);

    check_honeypot(
        &form.website,
        &form.nickname,
        &form.form_render_time,
        Utc::now().timestamp_millis(),
        state.config.min_form_dwell_secs,
    )?;

    let firstname = form.firstname.trim().to_string();
    let lastname = form.lastname.trim().to_string();
    let email = form.email.trim().to_string();
    let gender = form.gender.trim().to_string();
    let dob = form.dob.trim().to_string();

    if firstname.is_empty() || email.is_empty() || form.password.is_empty() || dob.is_empty() {
        return Err(AppError::Validation(
            "Please fill in all required fields.".to_string(),
        ));
    }

    validate_email(&email)?;
    validate_password(&form.password)?;
    let dob = validate_dob(&dob)?;

    registration_service::register(
        &state,
        registration_service::Registration {
            firstname,
            lastname,
            email,
            gender,
            dob,
            password: form.password,
        },
    )
    .await?;

    let response = ApiResponse {
        success: true,
        message: "Registration successful! Please check your email for the verification code."
            .to_string(),
    };

    Ok((StatusCode::CREATED, axum::Json(response)).into_response())
}

/// Verifies an email from the mailed link (`GET /verify_email?email=&token=`).
#[axum::debug_handler]
pub async fn verify_email_link(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Result<Response> {
    verify_email(state, params).await
}

/// Verifies an email from a form post (`POST /verify_email`).
#[axum::debug_handler]
pub async fn verify_email_form(
    State(state): State<AppState>,
    Form(params): Form<VerifyParams>,
) -> Result<Response> {
    verify_email(state, params).await
}

async fn verify_email(state: AppState, params: VerifyParams) -> Result<Response> {
    let email = params.email.trim();
    let token = params.token.trim();
    tracing::info!("🔎 Verification attempt: {}", email);

    registration_service::verify_email(&state, email, token).await?;

    let response = ApiResponse {
        success: true,
        message: "Email verified successfully! You can now log in.".to_string(),
    };

    Ok((StatusCode::OK, axum::Json(response)).into_response())
}

/// Handles login form posts.
#[axum::debug_handler]
pub async fn login(
    State(mut state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let email = form.email.trim();
    let password = form.password.trim();
    tracing::info!("🔐 Login attempt: {}", email);

    if email.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Please enter both email and password.".to_string(),
        ));
    }

    let student = auth_service::authenticate_student(&state.db, email, password).await?;

    // Session-fixation mitigation: a fresh id on every login, and whatever
    // session the browser was holding is dropped first.
    if let Some(old) = cookies.get(SESSION_COOKIE) {
        let _: () = state
            .redis
            .del(format!("session:{}", old.value()))
            .await
            .unwrap_or(());
    }

    let session_id = Uuid::new_v4();
    let session = Session {
        student_id: student.id,
        firstname: student.firstname.clone(),
        logged_in: true,
        created_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::days(state.config.session_duration_days),
    };

    let session_json = sonic_rs::to_string(&session)
        .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

    let expiration_seconds = (state.config.session_duration_days * 86400) as u64;
    let _: () = state
        .redis
        .set_ex(
            format!("session:{}", session_id),
            &session_json,
            expiration_seconds,
        )
        .await?;

    cookies.add(session_cookie(
        session_id.to_string(),
        state.config.session_duration_days,
        state.config.production,
    ));

    tracing::info!("✅ Student logged in: {}", student.id);

    let response = LoginResponse {
        success: true,
        firstname: Some(student.firstname),
        message: "Login successful!".to_string(),
    };

    Ok((StatusCode::OK, axum::Json(response)).into_response())
}

/// Clears the session and sends the browser back to the login page.
#[axum::debug_handler]
pub async fn logout(State(mut state): State<AppState>, cookies: Cookies) -> Result<Response> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let _: () = state
            .redis
            .del(format!("session:{}", cookie.value()))
            .await
            .unwrap_or(());
        tracing::info!("👋 Session deleted");
    }

    let mut expired = Cookie::new(SESSION_COOKIE, "");
    expired.set_max_age(Duration::seconds(0));
    expired.set_path("/");
    cookies.remove(expired);

    Ok(Redirect::to("/login?logout=1").into_response())
}
