use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quotecard::bot::{self, BotServices};
use quotecard::config::Config;
use quotecard::dialogue::QuoteDialogueState;
use quotecard::localization::init_localization;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Structured JSON output for log shippers, human-readable otherwise
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    init_tracing();

    info!("Starting Quote Card Telegram Bot");

    let config = Arc::new(Config::from_env().context("Invalid configuration")?);
    info!(?config, "Configuration loaded");

    init_localization().context("Failed to load message catalogs")?;

    let services = Arc::new(BotServices::from_config(Arc::clone(&config))?);

    // Initialize the bot
    let bot = Bot::new(&config.bot_token);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<QuoteDialogueState>, QuoteDialogueState>()
                .endpoint(bot::message_handler),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<QuoteDialogueState>, QuoteDialogueState>()
                .endpoint(bot::callback_handler),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            services,
            InMemStorage::<QuoteDialogueState>::new()
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
