use crate::{
    error::{AppError, Result},
    models::pending::PendingUser,
};
use deadpool_postgres::Pool;
use tokio_postgres::Row;

/// A helper function to map a `tokio_postgres::Row` to a `PendingUser`.
fn row_to_pending(row: &Row) -> Result<PendingUser> {
    Ok(PendingUser {
        email: row
            .try_get("email")
            .map_err(|_| AppError::Internal("missing column: email".to_string()))?,
        firstname: row
            .try_get("firstname")
            .map_err(|_| AppError::Internal("missing column: firstname".to_string()))?,
        lastname: row
            .try_get("lastname")
            .map_err(|_| AppError::Internal("missing column: lastname".to_string()))?,
        password: row
            .try_get("password")
            .map_err(|_| AppError::Internal("missing column: password".to_string()))?,
        gender: row
            .try_get("gender")
            .map_err(|_| AppError::Internal("missing column: gender".to_string()))?,
        dob: row
            .try_get("dob")
            .map_err(|_| AppError::Internal("missing column: dob".to_string()))?,
        token: row
            .try_get("token")
            .map_err(|_| AppError::Internal("missing column: token".to_string()))?,
        token_expires_at: row
            .try_get("token_expires_at")
            .map_err(|_| AppError::Internal("missing column: token_expires_at".to_string()))?,
    })
}

/// Inserts a pending registration.
///
/// A single statement covers both duplicate cases: the `WHERE NOT EXISTS`
/// guard skips emails already activated in `students`, and
/// `ON CONFLICT DO NOTHING` lets the UNIQUE constraint absorb a concurrent
/// pending registration instead of a check-then-insert race. Returns `true`
/// when the row was actually written.
pub async fn insert(pool: &Pool, pending: &PendingUser) -> Result<bool> {
    let client = pool.get().await?;
    let rows = client
        .execute(
            r#"
            INSERT INTO pending_users
                (email, firstname, lastname, password, gender, dob, token, token_expires_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE NOT EXISTS (SELECT 1 FROM students WHERE email = $1)
            ON CONFLICT (email) DO NOTHING
            "#,
            &[
                &pending.email,
                &pending.firstname,
                &pending.lastname,
                &pending.password,
                &pending.gender,
                &pending.dob,
                &pending.token,
                &pending.token_expires_at,
            ],
        )
        .await?;
    Ok(rows == 1)
}

/// Finds a pending registration by email.
pub async fn find_by_email(pool: &Pool, email: &str) -> Result<Option<PendingUser>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT email, firstname, lastname, password, gender, dob, token, token_expires_at
            FROM pending_users
            WHERE email = $1
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_pending(&r)).transpose()
}

/// Deletes a pending registration, e.g. to roll back after a failed
/// verification-mail delivery.
pub async fn delete_by_email(pool: &Pool, email: &str) -> Result<()> {
    let client = pool.get().await?;
    client
        .execute("DELETE FROM pending_users WHERE email = $1", &[&email])
        .await?;
    Ok(())
}

/// Deletes all pending registrations whose one-time code has expired.
/// Returns the number of rows removed.
pub async fn delete_expired(pool: &Pool) -> Result<u64> {
    let client = pool.get().await?;
    let rows = client
        .execute(
            "DELETE FROM pending_users WHERE token_expires_at < NOW()",
            &[],
        )
        .await?;
    Ok(rows)
}
