use crate::{
    error::{AppError, Result},
    models::{pending::PendingUser, student::Student},
};
use deadpool_postgres::Pool;
use tokio_postgres::{Row, error::SqlState};
use uuid::Uuid;

/// A helper function to map a `tokio_postgres::Row` to a `Student`.
fn row_to_student(row: &Row) -> Result<Student> {
    Ok(Student {
        id: row
            .try_get("id")
            .map_err(|_| AppError::Internal("missing column: id".to_string()))?,
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
        email_verified: row
            .try_get("email_verified")
            .map_err(|_| AppError::Internal("missing column: email_verified".to_string()))?,
        active: row
            .try_get("active")
            .map_err(|_| AppError::Internal("missing column: active".to_string()))?,
        created_at: row
            .try_get("created_at")
            .map_err(|_| AppError::Internal("missing column: created_at".to_string()))?,
    })
}

/// Finds an active student by email.
pub async fn find_active_by_email(pool: &Pool, email: &str) -> Result<Option<Student>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT id, email, firstname, lastname, password, gender, dob,
                   email_verified, active, created_at
            FROM students
            WHERE email = $1 AND active = true
            "#,
            &[&email],
        )
        .await?;
    row.map(|r| row_to_student(&r)).transpose()
}

/// Promotes a verified pending registration into `students` and removes the
/// pending row, in one transaction. A unique violation on the student email
/// (the address got activated concurrently) reports as a duplicate.
pub async fn activate_from_pending(pool: &Pool, pending: &PendingUser) -> Result<Uuid> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let id = Uuid::new_v4();
    let inserted = tx
        .execute(
            r#"
            INSERT INTO students
                (id, email, firstname, lastname, password, gender, dob, email_verified, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, true, true)
            "#,
            &[
                &id,
                &pending.email,
                &pending.firstname,
                &pending.lastname,
                &pending.password,
                &pending.gender,
                &pending.dob,
            ],
        )
        .await;

    if let Err(e) = inserted {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            return Err(AppError::DuplicateEmail);
        }
        return Err(e.into());
    }

    tx.execute(
        "DELETE FROM pending_users WHERE email = $1",
        &[&pending.email],
    )
    .await?;

    tx.commit().await?;
    Ok(id)
}
