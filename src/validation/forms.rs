use crate::error::{AppError, Result};
use chrono::{NaiveDate, Utc};

/// Validates an email address: one `@`, non-empty local and domain parts,
/// a dot in the domain, at most 254 characters.
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() || email.len() > 254 {
        return Err(AppError::Validation(
            "Please enter a valid email address.".to_string(),
        ));
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.ends_with('.') {
        return Err(AppError::Validation(
            "Please enter a valid email address.".to_string(),
        ));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Please enter a valid email address.".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be at most 128 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates a date of birth: `YYYY-MM-DD`, not in the future.
pub fn validate_dob(dob: &str) -> Result<NaiveDate> {
    let date = NaiveDate::parse_from_str(dob, "%Y-%m-%d").map_err(|_| {
        AppError::Validation("Please enter your date of birth as YYYY-MM-DD.".to_string())
    })?;

    if date > Utc::now().date_naive() {
        return Err(AppError::Validation(
            "Date of birth cannot be in the future.".to_string(),
        ));
    }

    Ok(date)
}

/// Anti-automation checks on the registration form.
///
/// `website` is a CSS-hidden field and `nickname` a JS-injected one; a
/// legitimate browser submits both empty. `form_render_time` is the client's
/// render timestamp in milliseconds, passed through as submitted so a
/// malformed value is a bot rejection rather than a deserialization failure;
/// submissions arriving faster than `min_dwell_secs` after render are
/// rejected, as are submissions without a usable timestamp.
pub fn check_honeypot(
    website: &str,
    nickname: &str,
    form_render_time: &str,
    now_ms: i64,
    min_dwell_secs: i64,
) -> Result<()> {
    if !website.is_empty() || !nickname.is_empty() {
        return Err(AppError::BotDetected);
    }

    let form_render_time_ms: i64 = match form_render_time.trim().parse() {
        Ok(ms) if ms > 0 => ms,
        _ => return Err(AppError::BotDetected),
    };

    let dwell_ms = now_ms.saturating_sub(form_render_time_ms);
    if dwell_ms < min_dwell_secs.saturating_mul(1000) {
        return Err(AppError::BotDetected);
    }

    Ok(())
}
