//! Shared services handed to every handler through the dispatcher

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::card_store::CardStore;
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::image_job::ImageJobClient;
use crate::interaction_log::InteractionLog;

/// Clients and stores used by the message and callback handlers
pub struct BotServices {
    pub config: Arc<Config>,
    pub completion: CompletionClient,
    pub images: ImageJobClient,
    pub interactions: InteractionLog,
    pub cards: CardStore,
}

impl BotServices {
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let completion = CompletionClient::new(&config.completion_api_key, &config.catalog_id)
            .context("Failed to build completion client")?;
        let images = ImageJobClient::new(
            &config.image_api_key,
            &config.catalog_id,
            config.image_dir.clone(),
            config.poll.clone(),
        )
        .context("Failed to build image job client")?;
        let interactions = InteractionLog::new(config.interaction_log_path.clone());

        Ok(Self {
            config,
            completion,
            images,
            interactions,
            cards: CardStore::new(),
        })
    }
}
