//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by the CLI and the HTTP
//! proxy. Services are generic over repository and summarizer traits; AppState
//! pins them to the SQLite and gateway implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use parley_core::chat::dialog::{CompletionSettings, DialogService};
use parley_core::chat::service::ChatService;
use parley_core::context::{ContextManager, ContextManagerConfig, LlmSummarizer};
use parley_core::llm::box_provider::BoxLlmProvider;
use parley_core::profile::repository::ProfileRepository;
use parley_core::profile::service::ProfileService;
use parley_infra::config::load_global_config;
use parley_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use parley_infra::llm::{API_KEY_ENV, create_provider, resolve_api_key};
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::folder::SqliteFolderRepository;
use parley_infra::sqlite::pool::{DatabasePool, database_url};
use parley_infra::sqlite::profile::SqliteProfileRepository;
use parley_infra::sqlite::summary::SqliteSummaryStore;
use parley_types::config::GlobalConfig;
use parley_types::profile::{Profile, UserRole};
use tracing::info;
use uuid::Uuid;

pub type ConcreteChatService =
    ChatService<SqliteChatRepository, SqliteFolderRepository, SqliteSummaryStore>;

pub type ConcreteProfileService = ProfileService<SqliteProfileRepository>;

pub type ConcreteDialogService = DialogService<
    SqliteChatRepository,
    SqliteFolderRepository,
    SqliteProfileRepository,
    LlmSummarizer,
    SqliteSummaryStore,
>;

/// File holding the id of the local CLI user.
const USER_ID_FILE: &str = "user.id";

/// Email recorded for the local user unless `PARLEY_USER_EMAIL` is set.
const DEFAULT_LOCAL_EMAIL: &str = "local@parley";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub profile_service: Arc<ConcreteProfileService>,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Initialize the application state: load config, connect to the DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = ensure_data_dir(&resolve_data_dir()).await?;
        let config = load_global_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .with_context(|| format!("failed to open database in {}", data_dir.display()))?;

        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqliteFolderRepository::new(db_pool.clone()),
            SqliteSummaryStore::new(db_pool.clone()),
        );
        let profile_service = ProfileService::new(
            SqliteProfileRepository::new(db_pool.clone()),
            config.limits.default_daily_message_limit,
        );

        Ok(Self {
            chat_service: Arc::new(chat_service),
            profile_service: Arc::new(profile_service),
            config,
            data_dir,
            db_pool,
        })
    }

    /// Build the gateway provider. Fails when no API key is configured.
    pub fn provider(&self) -> anyhow::Result<Arc<BoxLlmProvider>> {
        let key = resolve_api_key(&self.config.gateway).with_context(|| {
            format!("no gateway API key: set {API_KEY_ENV} or gateway.api_key in config.toml")
        })?;
        let provider = create_provider(&self.config.gateway, Some(key))?;
        Ok(Arc::new(provider))
    }

    /// Context manager whose digests are written to the chats table.
    pub fn context_manager(
        &self,
        provider: Arc<BoxLlmProvider>,
    ) -> ContextManager<LlmSummarizer, SqliteSummaryStore> {
        let context = &self.config.context;
        ContextManager::new(
            LlmSummarizer::new(
                provider,
                context.summarizer_model.clone(),
                context.summary_max_tokens,
            ),
            SqliteSummaryStore::new(self.db_pool.clone()),
            ContextManagerConfig::from(context),
        )
    }

    /// Wire a dialog service for interactive chat.
    pub fn dialog_service(&self) -> anyhow::Result<ConcreteDialogService> {
        let provider = self.provider()?;
        Ok(DialogService::new(
            Arc::clone(&self.chat_service),
            Arc::clone(&self.profile_service),
            self.context_manager(Arc::clone(&provider)),
            provider,
            CompletionSettings::from(&self.config.gateway),
        ))
    }

    /// The local CLI user, created on first run.
    ///
    /// The first profile in an empty database becomes an admin so that
    /// `parley users` is usable without manual SQL.
    pub async fn current_user(&self) -> anyhow::Result<Profile> {
        let user_id = load_or_create_user_id(&self.data_dir).await?;
        let email =
            std::env::var("PARLEY_USER_EMAIL").unwrap_or_else(|_| DEFAULT_LOCAL_EMAIL.to_string());
        let profile = self.profile_service.ensure_profile(user_id, &email).await?;
        if profile.is_admin() {
            return Ok(profile);
        }

        let repo = self.profile_service.repo();
        let profiles = repo.list_profiles().await?;
        if profiles.len() == 1 && profiles[0].id == user_id {
            repo.set_role(&user_id, UserRole::Admin).await?;
            info!(user_id = %user_id, "First profile promoted to admin");
            return Ok(self.profile_service.get_profile(user_id).await?);
        }
        Ok(profile)
    }
}

/// Read `{data_dir}/user.id`, writing a fresh id when it is missing.
pub async fn load_or_create_user_id(data_dir: &Path) -> anyhow::Result<Uuid> {
    let path = data_dir.join(USER_ID_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Uuid::parse_str(content.trim())
            .with_context(|| format!("{} does not contain a valid id", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let id = Uuid::now_v7();
            tokio::fs::write(&path, id.to_string()).await?;
            Ok(id)
        }
        Err(e) => Err(e.into()),
    }
}
