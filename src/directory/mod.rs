//! User directory.
//!
//! Maps usernames to user ids (uniqueness reservations in the `usernames`
//! collection) and user ids to profile records (the `users` collection).
//! The reservation and the profile are created together in one write batch,
//! so a crash can never leave one without the other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ChatError, ChatResult};
use crate::store::DocumentStore;

pub const USERS: &str = "users";
pub const USERNAMES: &str = "usernames";

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 20;

/// A user profile record, stored at `users/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub profile_pic: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub verification_request_denied: bool,
    pub created_at: DateTime<Utc>,
}

/// Owner-editable profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

/// Lowercase a candidate username and strip everything outside `[a-z0-9_]`.
///
/// This is the same normalization the sign-up form applies on every
/// keystroke; server-side operations apply it again so the two can never
/// disagree.
pub fn normalize_username(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect()
}

fn validate_username(username: &str) -> ChatResult<()> {
    if username.len() < USERNAME_MIN || username.len() > USERNAME_MAX {
        return Err(ChatError::invalid(format!(
            "username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }
    if normalize_username(username) != username {
        return Err(ChatError::invalid(
            "username may only contain lowercase letters, digits, and underscores",
        ));
    }
    Ok(())
}

/// Reserve a username and create the owning profile in one commit.
///
/// Fails with `Conflict` when the username is already reserved.
pub async fn reserve_username(
    store: &DocumentStore,
    username: &str,
    uid: &str,
    name: &str,
    email: &str,
    profile_pic: &str,
) -> ChatResult<UserProfile> {
    let username = normalize_username(username);
    validate_username(&username)?;

    if store.get(USERNAMES, &username).await?.is_some() {
        tracing::warn!("username already reserved: {}", username);
        return Err(ChatError::Conflict(format!(
            "username \"{username}\" is already taken"
        )));
    }

    let profile = UserProfile {
        uid: uid.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        username: username.clone(),
        profile_pic: profile_pic.to_string(),
        bio: String::new(),
        verified: false,
        verification_request_denied: false,
        created_at: Utc::now(),
    };

    store
        .batch()
        .set(USERNAMES, &username, json!({ "uid": uid }))
        .set(USERS, uid, serde_json::to_value(&profile)?)
        .commit()
        .await?;

    tracing::info!("reserved username {} for {}", username, uid);
    Ok(profile)
}

/// Resolve a username to its profile: reservation first, then profile.
/// Either link missing yields `NotFound`.
pub async fn lookup_by_username(store: &DocumentStore, username: &str) -> ChatResult<UserProfile> {
    let username = normalize_username(username);

    let reservation = store
        .get(USERNAMES, &username)
        .await?
        .ok_or_else(|| ChatError::not_found("user"))?;
    let uid = reservation["uid"]
        .as_str()
        .ok_or_else(|| ChatError::not_found("user"))?
        .to_string();

    lookup_by_id(store, &uid).await
}

/// Look up a profile by user id.
pub async fn lookup_by_id(store: &DocumentStore, uid: &str) -> ChatResult<UserProfile> {
    let doc = store
        .get(USERS, uid)
        .await?
        .ok_or_else(|| ChatError::not_found("user"))?;
    Ok(serde_json::from_value(doc)?)
}

/// True iff the candidate normalizes to a valid, unreserved username.
pub async fn username_available(store: &DocumentStore, candidate: &str) -> ChatResult<bool> {
    let candidate = normalize_username(candidate);
    if validate_username(&candidate).is_err() {
        return Ok(false);
    }
    Ok(store.get(USERNAMES, &candidate).await?.is_none())
}

/// Update the owner-editable profile fields.
pub async fn update_profile(
    store: &DocumentStore,
    uid: &str,
    update: ProfileUpdate,
) -> ChatResult<UserProfile> {
    let mut fields = serde_json::Map::new();
    if let Some(name) = update.name {
        fields.insert("name".to_string(), json!(name));
    }
    if let Some(bio) = update.bio {
        fields.insert("bio".to_string(), json!(bio));
    }
    if let Some(pic) = update.profile_pic {
        fields.insert("profilePic".to_string(), json!(pic));
    }

    if !fields.is_empty() {
        store
            .update(USERS, uid, serde_json::Value::Object(fields))
            .await?;
    }

    lookup_by_id(store, uid).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_username() {
        assert_eq!(normalize_username("Alice"), "alice");
        assert_eq!(normalize_username("al ice!"), "alice");
        assert_eq!(normalize_username("bob_42"), "bob_42");
        assert_eq!(normalize_username("émile"), "mile");
    }

    #[test]
    fn test_validate_username_bounds() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
    }

    proptest! {
        #[test]
        fn normalized_usernames_use_allowed_charset(raw in ".*") {
            let normalized = normalize_username(&raw);
            prop_assert!(normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        }

        #[test]
        fn normalization_is_idempotent(raw in ".*") {
            let once = normalize_username(&raw);
            prop_assert_eq!(normalize_username(&once), once);
        }
    }
}
