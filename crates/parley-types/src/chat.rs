//! Chat, folder, and message types for Parley.
//!
//! A chat owns its messages; folders group chats for the sidebar view.
//! Deleting a folder never deletes its chats.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::{Turn, TurnRole};
use crate::llm::Attachment;

/// Title given to a freshly created chat.
pub const DEFAULT_CHAT_TITLE: &str = "New chat";

/// Color given to a folder when none is chosen.
pub const DEFAULT_FOLDER_COLOR: &str = "#3B82F6";

/// A chat owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub folder_id: Option<Uuid>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named, colored group of chats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFolder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: String,
    pub icon_url: Option<String>,
    pub position: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a folder. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    /// `Some(None)` clears the icon.
    pub icon_url: Option<Option<String>>,
    pub position: Option<i64>,
}

impl FolderUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.icon_url.is_none()
            && self.position.is_none()
    }

    pub fn apply(&self, folder: &mut ChatFolder) {
        if let Some(name) = &self.name {
            folder.name = name.clone();
        }
        if let Some(color) = &self.color {
            folder.color = color.clone();
        }
        if let Some(icon_url) = &self.icon_url {
            folder.icon_url = icon_url.clone();
        }
        if let Some(position) = self.position {
            folder.position = position;
        }
    }
}

/// How a chat listing is ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatOrder {
    /// Sidebar order: by `position` ascending.
    #[default]
    Position,
    /// Most recently active first.
    Recent,
}

/// A persisted message in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: TurnRole,
    pub content: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Model that produced the message (assistant messages only).
    pub model: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(chat_id: Uuid, role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            chat_id,
            role,
            content: content.into(),
            attachments: Vec::new(),
            model: None,
            created_at: Utc::now(),
        }
    }

    pub fn to_turn(&self) -> Turn {
        Turn {
            role: self.role,
            content: self.content.clone(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder() -> ChatFolder {
        let now = Utc::now();
        ChatFolder {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            name: "Work".to_string(),
            color: DEFAULT_FOLDER_COLOR.to_string(),
            icon_url: Some("https://icons.example/work.svg".to_string()),
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_folder_update_partial() {
        let mut f = folder();
        let update = FolderUpdate {
            name: Some("Personal".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut f);
        assert_eq!(f.name, "Personal");
        assert_eq!(f.color, DEFAULT_FOLDER_COLOR);
        assert!(f.icon_url.is_some());
    }

    #[test]
    fn test_folder_update_clears_icon() {
        let mut f = folder();
        FolderUpdate {
            icon_url: Some(None),
            ..Default::default()
        }
        .apply(&mut f);
        assert!(f.icon_url.is_none());
        assert!(FolderUpdate::default().is_empty());
    }

    #[test]
    fn test_message_to_turn_keeps_timestamp() {
        let msg = ChatMessage::new(Uuid::now_v7(), TurnRole::User, "hello");
        let turn = msg.to_turn();
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.content, "hello");
        assert_eq!(turn.created_at, msg.created_at);
    }

    #[test]
    fn test_chat_order_serde() {
        let order: ChatOrder = serde_json::from_str("\"recent\"").unwrap();
        assert_eq!(order, ChatOrder::Recent);
        assert_eq!(ChatOrder::default(), ChatOrder::Position);
    }
}
