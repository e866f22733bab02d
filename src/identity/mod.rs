//! Identity adapter.
//!
//! Email/password sign-up and sign-in, federated sign-in, session
//! observation, and sign-out. Credentials live in the `accounts` table;
//! profiles are the directory's concern.
//!
//! Sessions are stateless JWTs (see [`sessions`]). The adapter additionally
//! keeps a `watch` channel holding the most recent session so embedded
//! callers can observe sign-in/sign-out transitions.

pub mod accounts;
pub mod sessions;

use tokio::sync::watch;

use sqlx::SqlitePool;

use crate::error::{ChatError, ChatResult};
use accounts::Account;
use sessions::create_token;

/// An authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub account_id: String,
    pub email: String,
    pub token: String,
}

/// Outcome of a federated sign-in.
///
/// On first use for a given external identity no profile exists yet; the
/// caller must complete username reservation before proceeding.
#[derive(Debug, Clone)]
pub struct FederatedSignIn {
    pub session: Session,
    pub new_account: bool,
}

/// The identity adapter. Cheap to clone; clones share the account store
/// and the session channel.
#[derive(Clone)]
pub struct Identity {
    pool: SqlitePool,
    current: watch::Sender<Option<Session>>,
}

impl Identity {
    pub fn new(pool: SqlitePool) -> Self {
        let (current, _) = watch::channel(None);
        Self { pool, current }
    }

    /// Register a new email/password account.
    ///
    /// Fails with `EmailInUse` when the email is already registered and
    /// `Invalid` on malformed input (no `@`, password under 8 chars).
    pub async fn sign_up_email(&self, email: &str, password: &str) -> ChatResult<Session> {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ChatError::invalid("invalid email address"));
        }
        if password.len() < 8 {
            return Err(ChatError::invalid("password must be at least 8 characters"));
        }

        if accounts::get_by_email(&self.pool, &email)
            .await?
            .is_some()
        {
            tracing::warn!("sign-up rejected, email already registered: {}", email);
            return Err(ChatError::EmailInUse);
        }

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
            .map_err(|e| ChatError::Unknown(format!("password hashing failed: {e}")))?;
        let account = accounts::create_email_account(&self.pool, &email, &hash).await?;

        tracing::info!("account created: {}", account.id);
        self.establish(account)
    }

    /// Sign in with email and password.
    ///
    /// Unknown email and wrong password both map to `InvalidCredentials`.
    pub async fn sign_in_email(&self, email: &str, password: &str) -> ChatResult<Session> {
        let email = email.trim().to_lowercase();

        let account = accounts::get_by_email(&self.pool, &email)
            .await?
            .ok_or(ChatError::InvalidCredentials)?;

        let hash = account
            .password_hash
            .as_deref()
            .ok_or(ChatError::InvalidCredentials)?;
        let matches = bcrypt::verify(password, hash)
            .map_err(|e| ChatError::Unknown(format!("password verification failed: {e}")))?;
        if !matches {
            tracing::warn!("failed sign-in attempt for {}", email);
            return Err(ChatError::InvalidCredentials);
        }

        self.establish(account)
    }

    /// Sign in through a federated provider.
    ///
    /// The account is keyed by the provider's stable subject identifier and
    /// created on first use. `new_account` tells the caller whether username
    /// reservation still has to happen.
    pub async fn sign_in_federated(&self, subject: &str, email: &str) -> ChatResult<FederatedSignIn> {
        if subject.is_empty() {
            return Err(ChatError::invalid("missing federated subject"));
        }

        let (account, new_account) =
            accounts::get_or_create_federated(&self.pool, subject, email).await?;
        if new_account {
            tracing::info!("federated account created: {}", account.id);
        }

        let session = self.establish(account)?;
        Ok(FederatedSignIn {
            session,
            new_account,
        })
    }

    /// Observe the current session.
    ///
    /// The receiver yields the current value immediately and every
    /// subsequent sign-in/sign-out for as long as it is held.
    pub fn observe_session(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }

    /// Drop the current session.
    pub fn sign_out(&self) {
        tracing::info!("signed out");
        let _ = self.current.send(None);
    }

    /// Verify a bearer token and return the session it represents.
    pub fn session_from_token(&self, token: &str) -> ChatResult<Session> {
        let claims = sessions::verify_token(token)?;
        Ok(Session {
            account_id: claims.sub,
            email: claims.email,
            token: token.to_string(),
        })
    }

    /// Look up an account by id.
    pub async fn account(&self, account_id: &str) -> ChatResult<Account> {
        accounts::get_by_id(&self.pool, account_id)
            .await?
            .ok_or_else(|| ChatError::not_found("account"))
    }

    fn establish(&self, account: Account) -> ChatResult<Session> {
        let token = create_token(&account.id, &account.email)?;
        let session = Session {
            account_id: account.id,
            email: account.email,
            token,
        };
        let _ = self.current.send(Some(session.clone()));
        Ok(session)
    }
}
