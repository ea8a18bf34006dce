//! In-memory repository fakes shared by the service tests.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use parley_types::chat::{Chat, ChatFolder, ChatMessage, ChatOrder};
use parley_types::error::RepositoryError;
use parley_types::profile::{DailyActivity, ModelUsage, Profile, UserRole, UserSettings};
use uuid::Uuid;

use crate::chat::repository::{ChatRepository, FolderRepository};
use crate::profile::repository::ProfileRepository;

#[derive(Default)]
pub(crate) struct InMemoryChatRepository {
    chats: Mutex<Vec<Chat>>,
    messages: Mutex<Vec<ChatMessage>>,
}

impl ChatRepository for InMemoryChatRepository {
    async fn create_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        self.chats.lock().unwrap().push(chat.clone());
        Ok(())
    }

    async fn get_chat(&self, chat_id: &Uuid) -> Result<Option<Chat>, RepositoryError> {
        Ok(self.chats.lock().unwrap().iter().find(|c| c.id == *chat_id).cloned())
    }

    async fn list_chats(&self, user_id: &Uuid, order: ChatOrder) -> Result<Vec<Chat>, RepositoryError> {
        let mut chats: Vec<Chat> = self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect();
        match order {
            ChatOrder::Position => chats.sort_by_key(|c| c.position),
            ChatOrder::Recent => chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
        }
        Ok(chats)
    }

    async fn count_chats(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        Ok(self.chats.lock().unwrap().iter().filter(|c| c.user_id == *user_id).count() as u64)
    }

    async fn update_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let mut chats = self.chats.lock().unwrap();
        let existing = chats
            .iter_mut()
            .find(|c| c.id == chat.id)
            .ok_or(RepositoryError::NotFound)?;
        *existing = chat.clone();
        Ok(())
    }

    async fn touch_chat(&self, chat_id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        if let Some(chat) = self.chats.lock().unwrap().iter_mut().find(|c| c.id == *chat_id) {
            chat.updated_at = at;
        }
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &Uuid) -> Result<(), RepositoryError> {
        self.messages.lock().unwrap().retain(|m| m.chat_id != *chat_id);
        self.chats.lock().unwrap().retain(|c| c.id != *chat_id);
        Ok(())
    }

    async fn detach_folder(&self, folder_id: &Uuid) -> Result<u64, RepositoryError> {
        let mut moved = 0;
        for chat in self.chats.lock().unwrap().iter_mut() {
            if chat.folder_id == Some(*folder_id) {
                chat.folder_id = None;
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn get_messages(&self, chat_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == *chat_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryFolderRepository {
    folders: Mutex<Vec<ChatFolder>>,
}

impl FolderRepository for InMemoryFolderRepository {
    async fn create_folder(&self, folder: &ChatFolder) -> Result<(), RepositoryError> {
        self.folders.lock().unwrap().push(folder.clone());
        Ok(())
    }

    async fn get_folder(&self, folder_id: &Uuid) -> Result<Option<ChatFolder>, RepositoryError> {
        Ok(self.folders.lock().unwrap().iter().find(|f| f.id == *folder_id).cloned())
    }

    async fn list_folders(&self, user_id: &Uuid) -> Result<Vec<ChatFolder>, RepositoryError> {
        let mut folders: Vec<ChatFolder> = self
            .folders
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == *user_id)
            .cloned()
            .collect();
        folders.sort_by_key(|f| f.position);
        Ok(folders)
    }

    async fn update_folder(&self, folder: &ChatFolder) -> Result<(), RepositoryError> {
        let mut folders = self.folders.lock().unwrap();
        let existing = folders
            .iter_mut()
            .find(|f| f.id == folder.id)
            .ok_or(RepositoryError::NotFound)?;
        *existing = folder.clone();
        Ok(())
    }

    async fn delete_folder(&self, folder_id: &Uuid) -> Result<(), RepositoryError> {
        self.folders.lock().unwrap().retain(|f| f.id != *folder_id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryProfileRepository {
    profiles: Mutex<Vec<Profile>>,
    settings: Mutex<HashMap<Uuid, UserSettings>>,
    usage: Mutex<HashMap<(Uuid, String), u64>>,
    activity: Mutex<HashMap<Uuid, (u64, u64, Vec<DailyActivity>)>>,
}

impl InMemoryProfileRepository {
    /// Preload chat/message totals and per-day counts for a user.
    pub(crate) fn seed_activity(
        &self,
        user_id: &Uuid,
        chats: u64,
        messages: u64,
        days: Vec<DailyActivity>,
    ) {
        self.activity
            .lock()
            .unwrap()
            .insert(*user_id, (chats, messages, days));
    }
}

impl ProfileRepository for InMemoryProfileRepository {
    async fn create_profile(&self, profile: &Profile) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.lock().unwrap();
        if profiles.iter().any(|p| p.id == profile.id) {
            return Err(RepositoryError::Conflict(profile.id.to_string()));
        }
        profiles.push(profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: &Uuid) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.profiles.lock().unwrap().iter().find(|p| p.id == *user_id).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, RepositoryError> {
        Ok(self.profiles.lock().unwrap().clone())
    }

    async fn set_role(&self, user_id: &Uuid, role: UserRole) -> Result<(), RepositoryError> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles
            .iter_mut()
            .find(|p| p.id == *user_id)
            .ok_or(RepositoryError::NotFound)?;
        profile.role = role;
        Ok(())
    }

    async fn get_settings(&self, user_id: &Uuid) -> Result<Option<UserSettings>, RepositoryError> {
        Ok(self.settings.lock().unwrap().get(user_id).cloned())
    }

    async fn save_settings(&self, settings: &UserSettings) -> Result<(), RepositoryError> {
        self.settings
            .lock()
            .unwrap()
            .insert(settings.user_id, settings.clone());
        Ok(())
    }

    async fn increment_model_usage(&self, user_id: &Uuid, model_name: &str) -> Result<(), RepositoryError> {
        *self
            .usage
            .lock()
            .unwrap()
            .entry((*user_id, model_name.to_string()))
            .or_insert(0) += 1;
        Ok(())
    }

    async fn model_usage(&self, user_id: &Uuid) -> Result<Vec<ModelUsage>, RepositoryError> {
        let mut usage: Vec<ModelUsage> = self
            .usage
            .lock()
            .unwrap()
            .iter()
            .filter(|((user, _), _)| user == user_id)
            .map(|((_, model), count)| ModelUsage {
                model_name: model.clone(),
                usage_count: *count,
            })
            .collect();
        usage.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        Ok(usage)
    }

    async fn count_chats(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        Ok(self.activity.lock().unwrap().get(user_id).map_or(0, |a| a.0))
    }

    async fn count_messages(&self, user_id: &Uuid) -> Result<u64, RepositoryError> {
        Ok(self.activity.lock().unwrap().get(user_id).map_or(0, |a| a.1))
    }

    async fn daily_message_counts(
        &self,
        user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyActivity>, RepositoryError> {
        let since = since.date_naive();
        Ok(self
            .activity
            .lock()
            .unwrap()
            .get(user_id)
            .map(|a| a.2.iter().filter(|d| d.date >= since).cloned().collect())
            .unwrap_or_default())
    }
}
