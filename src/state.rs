use crate::config::Config;
use crate::error::Result;
use crate::mailer::{LogMailer, Mailer};
use deadpool_postgres::Pool;
use redis::aio::ConnectionManager;
use std::sync::Arc;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The Redis connection manager (session store).
    pub redis: ConnectionManager,
    /// The application's configuration.
    pub config: Config,
    /// The verification-mail collaborator.
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// Creates a new `AppState` from the configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis connection manager initialized");

        Ok(AppState {
            db,
            redis,
            config: config.clone(),
            mailer: Arc::new(LogMailer),
        })
    }
}
