use dotenv::dotenv;
use std::sync::Arc;

mod channels;
mod commands;
mod config;
mod conversation;
mod food_diary;
mod i18n;
mod notes;
mod storage;

use channels::MessageDispatcher;
use config::Config;
use conversation::{DraftStore, InMemoryDraftStore};
use storage::UserStorage;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .init();

    log::info!("Initializing storage at {}", config.data_dir.display());
    let storage = match UserStorage::open(&config.data_dir) {
        Ok(storage) => Arc::new(storage.with_slow_threshold(config.slow_op_threshold)),
        Err(e) => {
            log::error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };

    let drafts: Arc<dyn DraftStore> = Arc::new(InMemoryDraftStore::new());
    let dispatcher = Arc::new(MessageDispatcher::new(storage, drafts, config.locale_default.clone()));

    log::info!("Starting Telegram bot (default locale '{}')", config.locale_default);
    if let Err(e) = channels::telegram::run(config.bot_token.clone(), dispatcher).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
