//! Account records and database operations.
//!
//! An account is what the identity provider knows about a user:
//! credentials and nothing else. Display data lives in the directory's
//! `users` collection under the same id.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// A stored identity account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub email: String,
    /// `None` for federated accounts.
    pub password_hash: Option<String>,
    pub provider: String,
    pub external_subject: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create an email/password account.
pub async fn create_email_account(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
) -> Result<Account, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash, provider, external_subject, created_at)
        VALUES (?1, ?2, ?3, 'password', NULL, ?4)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(password_hash)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Account {
        id,
        email: email.to_string(),
        password_hash: Some(password_hash.to_string()),
        provider: "password".to_string(),
        external_subject: None,
        created_at: now,
    })
}

/// Get an account by email.
pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, provider, external_subject, created_at
        FROM accounts
        WHERE email = ?1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Get an account by id.
pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, provider, external_subject, created_at
        FROM accounts
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Get an existing federated account by external subject, or create one.
///
/// Returns the account and whether it was created by this call.
pub async fn get_or_create_federated(
    pool: &SqlitePool,
    subject: &str,
    email: &str,
) -> Result<(Account, bool), sqlx::Error> {
    let existing = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, email, password_hash, provider, external_subject, created_at
        FROM accounts
        WHERE external_subject = ?1
        "#,
    )
    .bind(subject)
    .fetch_optional(pool)
    .await?;

    if let Some(account) = existing {
        return Ok((account, false));
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, password_hash, provider, external_subject, created_at)
        VALUES (?1, ?2, NULL, 'federated', ?3, ?4)
        "#,
    )
    .bind(&id)
    .bind(email)
    .bind(subject)
    .bind(now)
    .execute(pool)
    .await?;

    Ok((
        Account {
            id,
            email: email.to_string(),
            password_hash: None,
            provider: "federated".to_string(),
            external_subject: Some(subject.to_string()),
            created_at: now,
        },
        true,
    ))
}
