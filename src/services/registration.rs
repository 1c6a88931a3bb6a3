use crate::error::{AppError, Result};
use crate::mailer::{self, VerificationMail};
use crate::models::pending::PendingUser;
use crate::repositories::{pending as pending_repo, student as student_repo};
use crate::state::AppState;
use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;
use subtle::ConstantTimeEq;

/// A validated registration, ready to become a pending row.
#[derive(Clone, Debug)]
pub struct Registration {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub gender: String,
    pub dob: NaiveDate,
    pub password: String,
}

/// Generates a six-digit one-time code.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Compares a submitted code against the stored one in constant time.
pub fn code_matches(submitted: &str, stored: &str) -> bool {
    submitted.as_bytes().ct_eq(stored.as_bytes()).into()
}

/// Creates a pending registration and sends the verification mail.
///
/// The pending insert is atomic with respect to duplicates (see the
/// repository); a mail-delivery failure rolls the row back so no
/// unverifiable account is left behind.
pub async fn register(state: &AppState, reg: Registration) -> Result<()> {
    let hashed_password = crate::services::auth::hash_password(&reg.password)?;
    let code = generate_otp();
    let expires_at = Utc::now() + Duration::minutes(state.config.otp_ttl_minutes);

    let pending = PendingUser {
        email: reg.email.clone(),
        firstname: reg.firstname.clone(),
        lastname: reg.lastname,
        password: hashed_password,
        gender: reg.gender,
        dob: reg.dob,
        token: code.clone(),
        token_expires_at: expires_at,
    };

    if !pending_repo::insert(&state.db, &pending).await? {
        return Err(AppError::DuplicateEmail);
    }
    tracing::info!("📝 Pending registration stored: {}", reg.email);

    let mail = VerificationMail {
        verify_link: mailer::verify_link(&state.config.verify_base_url, &reg.email, &code),
        to: reg.email.clone(),
        firstname: reg.firstname,
        code,
    };

    if let Err(e) = state.mailer.send_verification(mail).await {
        // At-most-once: a pending row nobody can verify must not survive.
        if let Err(rollback) = pending_repo::delete_by_email(&state.db, &reg.email).await {
            tracing::error!("❌ Rollback of pending row failed: {}", rollback);
        }
        return Err(e);
    }

    tracing::info!("✅ Verification mail sent: {}", reg.email);
    Ok(())
}

/// Verifies a one-time code and activates the account.
///
/// Wrong code, unknown email and expired code all fail identically; a
/// second call with the same pair fails because the pending row is gone.
pub async fn verify_email(state: &AppState, email: &str, token: &str) -> Result<()> {
    if email.is_empty() || token.is_empty() {
        return Err(AppError::Validation("Missing email or token.".to_string()));
    }

    let pending = pending_repo::find_by_email(&state.db, email)
        .await?
        .ok_or(AppError::VerificationFailed)?;

    if !code_matches(token, &pending.token) {
        return Err(AppError::VerificationFailed);
    }

    if pending.is_expired(Utc::now()) {
        return Err(AppError::VerificationFailed);
    }

    let student_id = student_repo::activate_from_pending(&state.db, &pending).await?;
    tracing::info!("✅ Email verified, student activated: {}", student_id);
    Ok(())
}

/// Removes pending registrations whose code has expired. Returns the number
/// of rows deleted; runs on a schedule from `main`.
pub async fn cleanup_expired(state: &AppState) -> Result<u64> {
    pending_repo::delete_expired(&state.db).await
}
