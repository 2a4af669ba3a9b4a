use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info};
use std::sync::Arc;

use remember::core::{Config, SinkKind};
use remember::features::notifications::{LogSink, NotificationSink};
use remember::features::reminders::RememberService;
use remember::storage::{FsRecordStore, RecordStore};

fn build_sink(kind: SinkKind) -> Arc<dyn NotificationSink> {
    match kind {
        #[cfg(feature = "prompt")]
        SinkKind::Prompt => Arc::new(remember::features::notifications::PromptSink),
        #[cfg(not(feature = "prompt"))]
        SinkKind::Prompt => Arc::new(LogSink),
        SinkKind::Log => Arc::new(LogSink),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting Remember...");
    info!("📂 Events directory: {}", config.events_dir.display());

    let records: Arc<dyn RecordStore> = Arc::new(FsRecordStore::new(config.events_dir.clone()));
    let sink = build_sink(config.sink);

    let service = RememberService::start(records, sink).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }

    service.shutdown().await;
    Ok(())
}
