//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::t_lang;

// Import dialogue types
use crate::dialogue::{QuoteDialogue, QuoteDialogueState};

use super::card_pipeline::generate_quote_card;
use super::services::BotServices;

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    text: &str,
    services: &BotServices,
    dialogue: QuoteDialogue,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str());

    // The wait-state is consumed by this message whatever the outcome
    let state = dialogue.get().await?.unwrap_or_default();
    if state == QuoteDialogueState::AwaitingFreshQuery {
        info!(user_id = %msg.chat.id, "Received fresh query after regeneration request");
    }
    let next_state = state.after_text_message();
    if next_state != state {
        if next_state == QuoteDialogueState::default() {
            dialogue.exit().await?;
        } else {
            dialogue.update(next_state).await?;
        }
    }

    match generate_quote_card(bot, services, msg.chat.id, text, language_code).await {
        Ok(quote) => {
            info!(
                user_id = %msg.chat.id,
                quote_length = quote.quote.len(),
                author = %quote.author,
                "Quote card sent"
            );
        }
        Err(e) => {
            let details = format!("{e:#}");
            error!(user_id = %msg.chat.id, error = %details, "Quote card generation failed");

            if services.config.apologize_on_error {
                if let Err(send_err) = bot
                    .send_message(msg.chat.id, t_lang("error-apology", language_code))
                    .await
                {
                    warn!(user_id = %msg.chat.id, error = %send_err, "Failed to send apology");
                }
            }
        }
    }

    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    services: Arc<BotServices>,
    dialogue: QuoteDialogue,
) -> Result<()> {
    match msg.text() {
        Some(text) => handle_text_message(&bot, &msg, text, &services, dialogue).await?,
        None => debug!(user_id = %msg.chat.id, "Ignoring non-text message"),
    }

    Ok(())
}
