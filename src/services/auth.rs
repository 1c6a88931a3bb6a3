use crate::error::{AppError, Result};
use crate::models::student::Student;
use crate::repositories::student as student_repo;
use argon2::{
    Argon2, ParamsBuilder,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use deadpool_postgres::Pool;
use rand::{RngCore, rngs::OsRng};
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 6;

/// Hashes a password using Argon2id with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Internal(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Internal(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a password against a stored PHC-format hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Hash parse error: {}", e)))?;
    let argon2 = Argon2::default();
    let result = argon2.verify_password(&password_bytes, &parsed_hash).is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Authenticates a student by email and password.
///
/// Unknown email and wrong password answer with the same message so the
/// endpoint cannot be used for account enumeration.
pub async fn authenticate_student(pool: &Pool, email: &str, password: &str) -> Result<Student> {
    tracing::debug!("🔐 Authenticating student: {}", email);

    let student = student_repo::find_active_by_email(pool, email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid email or password.".to_string()))?;

    if !verify_password(password, &student.password)? {
        return Err(AppError::Authentication(
            "Invalid email or password.".to_string(),
        ));
    }

    tracing::info!("✅ Student authenticated: {}", student.id);
    Ok(student)
}
