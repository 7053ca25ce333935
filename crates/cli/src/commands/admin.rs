//! Admin user management commands.

use clover_server::services::auth::hash_password;

use super::CommandError;

/// Create an admin user, or promote an existing account to admin.
///
/// The password is hashed with the same argon2 parameters the server uses,
/// so the account can log in through the normal auth flow.
///
/// # Errors
///
/// Returns `CommandError` if hashing fails or the upsert cannot be executed.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let password_hash =
        hash_password(password).map_err(|e| CommandError::Invalid(e.to_string()))?;

    sqlx::query(
        r"
        INSERT INTO users (name, email, password_hash, role)
        VALUES ($1, lower($2), $3, 'admin')
        ON CONFLICT (email)
        DO UPDATE SET role = 'admin', name = EXCLUDED.name
        ",
    )
    .bind(name)
    .bind(email)
    .bind(&password_hash)
    .execute(&pool)
    .await?;

    tracing::info!("Admin user {email} ready");
    Ok(())
}
