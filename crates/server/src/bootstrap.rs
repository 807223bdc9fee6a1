use thiserror::Error;
use tracing::info;

use intake_chat::events::{
    BlockActionHandler, EventDispatcher, SlashCommandHandler, ViewSubmissionHandler,
};
use intake_chat::service::OnboardingFlowService;
use intake_chat::socket::SocketModeRunner;
use intake_core::config::{AppConfig, ConfigError, LoadOptions};
use intake_core::flows::engine::{EngineSettings, OnboardingEngine};
use intake_core::session::SessionManager;
use intake_db::{
    connect_with_settings, migrations, DbPool, SqlFieldCatalog, SqlResponseStore, SqlSessionStore,
};

use crate::referral::CompletionNotifier;

pub type FlowService =
    OnboardingFlowService<SqlFieldCatalog, SqlResponseStore, CompletionNotifier, SqlSessionStore>;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub chat_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(correlation_id = "bootstrap", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(correlation_id = "bootstrap", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(correlation_id = "bootstrap", "database migrations applied");

    let dispatcher = build_dispatcher(&db_pool, &config);
    let chat_runner = SocketModeRunner::with_noop_transport(
        dispatcher,
        intake_chat::socket::ReconnectPolicy::default(),
    );

    Ok(Application { config, db_pool, chat_runner })
}

/// Each handler gets its own service instance; the services share the pool
/// and are otherwise stateless, so nothing needs to be shared in-process.
pub fn build_dispatcher(db_pool: &DbPool, config: &AppConfig) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(flow_service(db_pool, config)));
    dispatcher.register(BlockActionHandler::new(flow_service(db_pool, config)));
    dispatcher.register(ViewSubmissionHandler::new(flow_service(db_pool, config)));
    dispatcher
}

pub fn flow_service(db_pool: &DbPool, config: &AppConfig) -> FlowService {
    OnboardingFlowService::new(
        OnboardingEngine::new(
            SqlFieldCatalog::new(db_pool.clone()),
            SqlResponseStore::new(db_pool.clone()),
            CompletionNotifier::from_config(&config.referral),
            EngineSettings { fields_per_modal: config.engine.fields_per_modal },
        ),
        SessionManager::new(
            SqlSessionStore::new(db_pool.clone()),
            config.engine.session_ttl_minutes,
        ),
    )
}
