//! Chat service: chats, folders, messages, and conversation loading.
//!
//! Every operation is scoped to the calling user; chats and folders owned by
//! someone else behave as if they did not exist.

use chrono::Utc;
use parley_types::chat::{
    Chat, ChatFolder, ChatMessage, ChatOrder, DEFAULT_CHAT_TITLE, DEFAULT_FOLDER_COLOR,
    FolderUpdate,
};
use parley_types::context::TurnRole;
use parley_types::error::{ChatError, ContextError, RepositoryError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::repository::{ChatRepository, FolderRepository};
use crate::context::conversation::Conversation;
use crate::context::store::SummaryStore;

/// Generic over the repositories and digest store so parley-core never
/// depends on parley-infra.
pub struct ChatService<C: ChatRepository, F: FolderRepository, St: SummaryStore> {
    chat_repo: C,
    folder_repo: F,
    summaries: St,
}

impl<C: ChatRepository, F: FolderRepository, St: SummaryStore> ChatService<C, F, St> {
    pub fn new(chat_repo: C, folder_repo: F, summaries: St) -> Self {
        Self {
            chat_repo,
            folder_repo,
            summaries,
        }
    }

    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    // --- Chats ---

    /// Create a chat at the end of the user's list.
    pub async fn create_chat(
        &self,
        user_id: Uuid,
        title: Option<String>,
    ) -> Result<Chat, ChatError> {
        let title = match title.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => t,
            _ => DEFAULT_CHAT_TITLE.to_string(),
        };
        let position = self.chat_repo.count_chats(&user_id).await? as i64;
        let now = Utc::now();
        let chat = Chat {
            id: Uuid::now_v7(),
            user_id,
            title,
            folder_id: None,
            position,
            created_at: now,
            updated_at: now,
        };
        self.chat_repo.create_chat(&chat).await?;
        info!(chat_id = %chat.id, user_id = %user_id, "Chat created");
        Ok(chat)
    }

    pub async fn get_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<Chat, ChatError> {
        match self.chat_repo.get_chat(&chat_id).await? {
            Some(chat) if chat.user_id == user_id => Ok(chat),
            _ => Err(ChatError::ChatNotFound),
        }
    }

    pub async fn list_chats(&self, user_id: Uuid, order: ChatOrder) -> Result<Vec<Chat>, ChatError> {
        Ok(self.chat_repo.list_chats(&user_id, order).await?)
    }

    pub async fn rename_chat(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        title: &str,
    ) -> Result<Chat, ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::InvalidInput("chat title cannot be empty".to_string()));
        }
        let mut chat = self.get_chat(user_id, chat_id).await?;
        chat.title = title.to_string();
        chat.updated_at = Utc::now();
        self.update_chat(&chat).await?;
        Ok(chat)
    }

    /// Put a chat into a folder, or take it out of any folder with `None`.
    pub async fn move_chat_to_folder(
        &self,
        user_id: Uuid,
        chat_id: Uuid,
        folder_id: Option<Uuid>,
    ) -> Result<Chat, ChatError> {
        if let Some(folder_id) = folder_id {
            self.get_folder(user_id, folder_id).await?;
        }
        let mut chat = self.get_chat(user_id, chat_id).await?;
        chat.folder_id = folder_id;
        chat.updated_at = Utc::now();
        self.update_chat(&chat).await?;
        debug!(chat_id = %chat_id, folder_id = ?folder_id, "Chat moved");
        Ok(chat)
    }

    /// Delete a chat with its messages and digest.
    pub async fn delete_chat(&self, user_id: Uuid, chat_id: Uuid) -> Result<(), ChatError> {
        self.get_chat(user_id, chat_id).await?;
        self.summaries
            .delete(&chat_id)
            .await
            .map_err(ContextError::from)?;
        self.chat_repo.delete_chat(&chat_id).await?;
        info!(chat_id = %chat_id, "Chat deleted");
        Ok(())
    }

    pub async fn touch_chat(&self, chat_id: &Uuid) -> Result<(), ChatError> {
        Ok(self.chat_repo.touch_chat(chat_id, Utc::now()).await?)
    }

    async fn update_chat(&self, chat: &Chat) -> Result<(), ChatError> {
        self.chat_repo.update_chat(chat).await.map_err(|e| match e {
            RepositoryError::NotFound => ChatError::ChatNotFound,
            other => other.into(),
        })
    }

    // --- Folders ---

    /// Create a folder at the end of the user's folder list.
    pub async fn create_folder(
        &self,
        user_id: Uuid,
        name: &str,
        color: Option<String>,
        icon_url: Option<String>,
    ) -> Result<ChatFolder, ChatError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChatError::InvalidInput("folder name cannot be empty".to_string()));
        }
        let position = self.folder_repo.list_folders(&user_id).await?.len() as i64;
        let now = Utc::now();
        let folder = ChatFolder {
            id: Uuid::now_v7(),
            user_id,
            name: name.to_string(),
            color: color.unwrap_or_else(|| DEFAULT_FOLDER_COLOR.to_string()),
            icon_url,
            position,
            created_at: now,
            updated_at: now,
        };
        self.folder_repo.create_folder(&folder).await?;
        info!(folder_id = %folder.id, name = %folder.name, "Folder created");
        Ok(folder)
    }

    pub async fn get_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<ChatFolder, ChatError> {
        match self.folder_repo.get_folder(&folder_id).await? {
            Some(folder) if folder.user_id == user_id => Ok(folder),
            _ => Err(ChatError::FolderNotFound),
        }
    }

    pub async fn list_folders(&self, user_id: Uuid) -> Result<Vec<ChatFolder>, ChatError> {
        Ok(self.folder_repo.list_folders(&user_id).await?)
    }

    pub async fn update_folder(
        &self,
        user_id: Uuid,
        folder_id: Uuid,
        update: FolderUpdate,
    ) -> Result<ChatFolder, ChatError> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ChatError::InvalidInput("folder name cannot be empty".to_string()));
        }
        let mut folder = self.get_folder(user_id, folder_id).await?;
        if update.is_empty() {
            return Ok(folder);
        }
        update.apply(&mut folder);
        folder.updated_at = Utc::now();
        self.folder_repo.update_folder(&folder).await.map_err(|e| match e {
            RepositoryError::NotFound => ChatError::FolderNotFound,
            other => other.into(),
        })?;
        Ok(folder)
    }

    /// Delete a folder. Its chats survive, moved out of any folder.
    pub async fn delete_folder(&self, user_id: Uuid, folder_id: Uuid) -> Result<u64, ChatError> {
        self.get_folder(user_id, folder_id).await?;
        let detached = self.chat_repo.detach_folder(&folder_id).await?;
        self.folder_repo.delete_folder(&folder_id).await?;
        info!(folder_id = %folder_id, detached, "Folder deleted");
        Ok(detached)
    }

    // --- Messages ---

    pub async fn save_message(&self, message: &ChatMessage) -> Result<(), ChatError> {
        Ok(self.chat_repo.save_message(message).await?)
    }

    pub async fn messages(&self, user_id: Uuid, chat_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        self.get_chat(user_id, chat_id).await?;
        Ok(self.chat_repo.get_messages(&chat_id).await?)
    }

    /// Rebuild the in-memory conversation for a chat from its messages and
    /// stored digest.
    ///
    /// The model is the one that produced the latest assistant reply, or
    /// `default_model` for chats without one.
    pub async fn load_conversation(
        &self,
        chat_id: &Uuid,
        default_model: &str,
    ) -> Result<Conversation, ChatError> {
        let messages = self.chat_repo.get_messages(chat_id).await?;
        let digest = self
            .summaries
            .load(chat_id)
            .await
            .map_err(ContextError::from)?;

        let model = messages
            .iter()
            .rev()
            .filter(|m| m.role == TurnRole::Assistant)
            .find_map(|m| m.model.clone())
            .unwrap_or_else(|| default_model.to_string());
        let turns = messages.iter().map(ChatMessage::to_turn).collect();

        Ok(Conversation::restore(*chat_id, model, turns, digest)?)
    }
}
