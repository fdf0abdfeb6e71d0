use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::User;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow!("Failed to parse password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Create a new user
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    username: &str,
    password: &str,
    role: &str,
) -> Result<User> {
    let id = Uuid::new_v4().to_string();
    let password_hash = hash_password(password)?;

    sqlx::query("INSERT INTO users (id, email, username, password_hash, role) VALUES (?, ?, ?, ?, ?)")
        .bind(&id)
        .bind(email)
        .bind(username)
        .bind(&password_hash)
        .bind(role)
        .execute(pool)
        .await?;

    Ok(User {
        id,
        email: email.to_string(),
        username: username.to_string(),
        password_hash,
        role: role.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    })
}

/// Check credentials against the stored user document.
/// Returns None for an unknown email or a wrong password; the caller cannot
/// tell which, and the response must not say.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> Result<Option<User>> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    let Some(user) = user else {
        return Ok(None);
    };

    if verify_password(password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Idempotent startup seed: create the well-known admin account if absent
pub async fn seed_admin(
    pool: &SqlitePool,
    email: &str,
    username: &str,
    password: &str,
) -> Result<bool> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Ok(false);
    }

    create_user(pool, email, username, password, "admin").await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::migrate(&pool).await.unwrap();
        pool
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("p").unwrap();
        assert_ne!(hash, "p"); // never stored in plaintext
        assert!(verify_password("p", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_authenticate_success_and_failure() {
        let pool = test_pool().await;
        create_user(&pool, "a@x.com", "a", "p", "user").await.unwrap();

        let user = authenticate(&pool, "a@x.com", "p").await.unwrap().unwrap();
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, "user");

        assert!(authenticate(&pool, "a@x.com", "bad").await.unwrap().is_none());
        assert!(authenticate(&pool, "nobody@x.com", "p").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_admin_is_idempotent() {
        let pool = test_pool().await;

        assert!(seed_admin(&pool, "admin@movie.com", "Admin", "admin").await.unwrap());
        assert!(!seed_admin(&pool, "admin@movie.com", "Admin", "admin").await.unwrap());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = test_pool().await;
        create_user(&pool, "a@x.com", "a", "p", "user").await.unwrap();
        assert!(create_user(&pool, "a@x.com", "b", "q", "user").await.is_err());
    }
}
