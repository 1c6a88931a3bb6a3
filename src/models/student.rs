use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// An activated student account.
///
/// Rows are written exclusively by the verification step, so `email_verified`
/// and `active` are true for every account created through the normal flow.
#[derive(Clone, Debug)]
pub struct Student {
    /// The unique identifier for the student.
    pub id: Uuid,
    /// The student's email address (globally unique).
    pub email: String,
    /// The student's first name.
    pub firstname: String,
    /// The student's last name.
    pub lastname: String,
    /// The student's Argon2id password hash.
    pub password: String,
    /// The student's self-reported gender (may be empty).
    pub gender: String,
    /// The student's date of birth.
    pub dob: NaiveDate,
    /// Whether the email address has been verified.
    pub email_verified: bool,
    /// Whether the account is active.
    pub active: bool,
    /// The timestamp when the account was activated.
    pub created_at: DateTime<Utc>,
}
