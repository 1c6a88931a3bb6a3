use chrono::{DateTime, NaiveDate, Utc};

/// A registration awaiting email verification.
///
/// At most one live row exists per email (UNIQUE constraint). The row is
/// removed on successful verification or by the cleanup job once
/// `token_expires_at` has passed.
#[derive(Clone, Debug)]
pub struct PendingUser {
    /// The email address being verified.
    pub email: String,
    /// The applicant's first name.
    pub firstname: String,
    /// The applicant's last name.
    pub lastname: String,
    /// The applicant's Argon2id password hash.
    pub password: String,
    /// The applicant's self-reported gender (may be empty).
    pub gender: String,
    /// The applicant's date of birth.
    pub dob: NaiveDate,
    /// The six-digit one-time code emailed to the applicant.
    pub token: String,
    /// When the one-time code stops being accepted.
    pub token_expires_at: DateTime<Utc>,
}

impl PendingUser {
    /// Whether the one-time code has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.token_expires_at < now
    }
}
