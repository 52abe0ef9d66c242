use anyhow::Context;
use gloss_config::GlossConfig;
use gloss_db::service::GlossService;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: GlossService,
    pub config: GlossConfig,
}

impl AppContext {
    /// Open the configured database and run migrations.
    pub async fn init(config: GlossConfig) -> anyhow::Result<Self> {
        let service = GlossService::open(&config)
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?;

        tracing::debug!(
            path = %config.database.path,
            pool_size = service.db().pool_size(),
            "glossary database ready"
        );

        Ok(Self { service, config })
    }
}
