use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-side session state stored in Redis under `session:{id}`.
///
/// The Redis TTL matches `expires_at`, but the field is still checked on
/// read so a stale blob is never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The ID of the student this session belongs to.
    pub student_id: Uuid,
    /// The student's first name, kept for the dashboard greeting.
    pub firstname: String,
    /// Whether the session represents a completed login.
    pub logged_in: bool,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session expires.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}
