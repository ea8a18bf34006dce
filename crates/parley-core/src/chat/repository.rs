//! ChatRepository and FolderRepository trait definitions.
//!
//! CRUD for chats, their messages, and the folders that group them.

use chrono::{DateTime, Utc};
use parley_types::chat::{Chat, ChatFolder, ChatMessage, ChatOrder};
use parley_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat and message persistence.
///
/// Implementations live in parley-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    fn create_chat(
        &self,
        chat: &Chat,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_chat(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// List a user's chats in the requested order.
    fn list_chats(
        &self,
        user_id: &Uuid,
        order: ChatOrder,
    ) -> impl std::future::Future<Output = Result<Vec<Chat>, RepositoryError>> + Send;

    fn count_chats(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Persist title, folder and position. Returns `NotFound` for unknown chats.
    fn update_chat(
        &self,
        chat: &Chat,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Bump `updated_at` so the chat sorts first in the recent view.
    fn touch_chat(
        &self,
        chat_id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a chat together with its messages and digest.
    fn delete_chat(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Move every chat in `folder_id` out of any folder. Returns how many moved.
    fn detach_folder(
        &self,
        folder_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    fn save_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Messages of a chat, ordered by created_at ASC.
    fn get_messages(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}

/// Repository trait for chat folders.
pub trait FolderRepository: Send + Sync {
    fn create_folder(
        &self,
        folder: &ChatFolder,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn get_folder(
        &self,
        folder_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatFolder>, RepositoryError>> + Send;

    /// A user's folders ordered by position.
    fn list_folders(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatFolder>, RepositoryError>> + Send;

    fn update_folder(
        &self,
        folder: &ChatFolder,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn delete_folder(
        &self,
        folder_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
