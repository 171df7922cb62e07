//! Accounts and credentials.

use boardstack_db::{DbPool, UserRow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::avatar::gravatar_url;
use crate::error::{BoardError, BoardResult};
use crate::validation;

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRow> for UserProfile {
    fn from(row: &UserRow) -> Self {
        Self {
            id: row.id.clone(),
            email: row.email.clone(),
            full_name: row.full_name.clone(),
            avatar: gravatar_url(&row.email),
            created_at: row.created_at,
        }
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hash a password as `salt$hex(sha256(salt || password))`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

/// Register a new account.
pub async fn signup(
    pool: &DbPool,
    email: &str,
    full_name: &str,
    password: &str,
) -> BoardResult<UserProfile> {
    let email = validation::email(email)?;
    let full_name = validation::bounded_text("full_name", full_name, validation::MAX_TITLE_LEN)?;
    validation::password(password)?;

    if pool.find_user_by_email(&email).await?.is_some() {
        return Err(BoardError::conflict("email is already registered"));
    }

    let row = UserRow {
        id: Uuid::new_v4().to_string(),
        email,
        full_name,
        password_hash: hash_password(password),
        created_at: Utc::now(),
    };
    pool.insert_user(&row).await?;
    info!(user = %row.id, "User registered");
    Ok(UserProfile::from(&row))
}

/// Check credentials. Unknown email and wrong password fail the same way.
pub async fn authenticate(pool: &DbPool, email: &str, password: &str) -> BoardResult<UserProfile> {
    let email = email.trim().to_lowercase();
    match pool.find_user_by_email(&email).await? {
        Some(row) if verify_password(password, &row.password_hash) => Ok(UserProfile::from(&row)),
        _ => Err(BoardError::InvalidCredentials),
    }
}

pub async fn get_profile(pool: &DbPool, user_id: &str) -> BoardResult<UserProfile> {
    pool.get_user(user_id)
        .await?
        .map(|row| UserProfile::from(&row))
        .ok_or_else(|| BoardError::UserNotFound(user_id.to_string()))
}

/// Profile lookup for display purposes; missing users yield `None`.
pub(crate) async fn find_profile(pool: &DbPool, user_id: &str) -> BoardResult<Option<UserProfile>> {
    Ok(pool.get_user(user_id).await?.map(|row| UserProfile::from(&row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardstack_db::MemoryStore;
    use std::sync::Arc;

    #[test]
    fn test_password_hash_round_trip() {
        let stored = hash_password("correct horse");
        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
        assert_ne!(stored, hash_password("correct horse"));
        assert!(!verify_password("x", "no-separator"));
    }

    #[tokio::test]
    async fn test_signup_then_authenticate() {
        let pool: DbPool = Arc::new(MemoryStore::new());
        let profile = signup(&pool, "Ada@Example.com", "Ada Lovelace", "analytical")
            .await
            .unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.avatar, gravatar_url("ada@example.com"));

        let again = authenticate(&pool, "ada@example.com", "analytical").await.unwrap();
        assert_eq!(again.id, profile.id);

        let err = authenticate(&pool, "ada@example.com", "nope-nope").await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidCredentials));
        let err = authenticate(&pool, "who@example.com", "analytical").await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool: DbPool = Arc::new(MemoryStore::new());
        signup(&pool, "ada@example.com", "Ada", "analytical").await.unwrap();
        let err = signup(&pool, "ADA@example.com", "Ada 2", "analytical")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let pool: DbPool = Arc::new(MemoryStore::new());
        assert!(signup(&pool, "bad", "Ada", "analytical").await.is_err());
        assert!(signup(&pool, "ada@example.com", "", "analytical").await.is_err());
        assert!(signup(&pool, "ada@example.com", "Ada", "short").await.is_err());
    }
}
