//! Conversation record types as stored (camelCase fields, RFC3339
//! timestamps).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::directory::UserProfile;

/// Reserved sender id for messages authored by the platform itself.
pub const SYSTEM_SENDER: &str = "system";

/// Display name attached to system messages.
pub const SYSTEM_SENDER_NAME: &str = "ChatX System";

/// A message in a conversation's sub-collection.
///
/// Sender display metadata is denormalized at write time, so a later
/// profile change does not rewrite history. Mutable after creation only
/// through: text + edited flag (original sender), the reader set
/// (append-only), and full deletion (original sender).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender_id: String,
    pub sender_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_profile_pic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_verified: Option<bool>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_sender_name: Option<String>,
}

impl Message {
    /// A user-authored message with the sender's display metadata
    /// denormalized in and the reader set seeded with the sender.
    pub fn user(sender: &UserProfile, text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            sender_id: sender.uid.clone(),
            sender_name: if sender.name.is_empty() {
                sender.username.clone()
            } else {
                sender.name.clone()
            },
            sender_username: Some(sender.username.clone()),
            sender_profile_pic: Some(sender.profile_pic.clone()),
            sender_verified: Some(sender.verified),
            created_at: Utc::now(),
            read_by: vec![sender.uid.clone()],
            edited: None,
            edited_at: None,
            reply_to: None,
            reply_to_text: None,
            reply_to_sender_name: None,
        }
    }

    /// A platform-authored notice. The reader set is seeded with the acting
    /// user's id, uniformly across every emitting flow.
    pub fn system(text: String, actor_uid: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text,
            sender_id: SYSTEM_SENDER.to_string(),
            sender_name: SYSTEM_SENDER_NAME.to_string(),
            sender_username: None,
            sender_profile_pic: None,
            sender_verified: None,
            created_at: Utc::now(),
            read_by: vec![actor_uid.to_string()],
            edited: None,
            edited_at: None,
            reply_to: None,
            reply_to_text: None,
            reply_to_sender_name: None,
        }
    }

    pub fn is_system(&self) -> bool {
        self.sender_id == SYSTEM_SENDER
    }
}

/// A direct conversation between exactly two users.
///
/// `pair_key` is the canonical lookup key derived from the sorted
/// participant pair, so finding an existing conversation is a point query
/// rather than a scan over all of a user's conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectChat {
    pub participants: Vec<String>,
    pub pair_key: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub last_message: Option<Message>,
}

/// A group conversation.
///
/// Invariant: the creator is an initial member and admin, and the admin
/// set stays a subset of the member set (every removal path removes from
/// both).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub profile_pic: String,
    pub created_by: String,
    pub members: Vec<String>,
    pub admins: Vec<String>,
    #[serde(default)]
    pub admin_only_invites: bool,
    #[serde(default)]
    pub invite_code: Option<String>,
    #[serde(default)]
    pub invite_created_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    #[serde(default)]
    pub last_message: Option<Message>,
}

impl Group {
    pub fn is_member(&self, uid: &str) -> bool {
        self.members.iter().any(|m| m == uid)
    }

    pub fn is_admin(&self, uid: &str) -> bool {
        self.admins.iter().any(|a| a == uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            uid: "u1".into(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            username: "alice".into(),
            profile_pic: String::new(),
            bio: String::new(),
            verified: false,
            verification_request_denied: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_message_seeds_reader_set_with_sender() {
        let msg = Message::user(&profile(), "hi");
        assert_eq!(msg.read_by, vec!["u1"]);
        assert!(!msg.is_system());
    }

    #[test]
    fn test_system_message_seeds_reader_set_with_actor() {
        let msg = Message::system("Alice left the group".into(), "u1");
        assert!(msg.is_system());
        assert_eq!(msg.sender_name, SYSTEM_SENDER_NAME);
        assert_eq!(msg.read_by, vec!["u1"]);
    }

    #[test]
    fn test_message_falls_back_to_username_for_display() {
        let mut p = profile();
        p.name = String::new();
        let msg = Message::user(&p, "hi");
        assert_eq!(msg.sender_name, "alice");
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let msg = Message::user(&profile(), "hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("senderId").is_some());
        assert!(value.get("readBy").is_some());
        assert!(value.get("createdAt").is_some());
        // Unset options stay out of the document.
        assert!(value.get("edited").is_none());
    }
}
