//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{debug, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::dialogue::{CardAction, QuoteDialogue};

use super::services::BotServices;
use super::ui_builder::channel_recipient;

/// Handle callback queries from inline keyboards
///
/// The query is always answered, even when the action fails, so the client
/// stops showing its loading indicator.
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    services: Arc<BotServices>,
    dialogue: QuoteDialogue,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    let language_code = q.from.language_code.as_deref();
    let outcome = handle_card_action(&bot, &q, &services, &dialogue, language_code).await;

    // Answer the callback query to remove the loading state
    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Ok(Some(notice)) = &outcome {
        answer = answer.text(notice.clone());
    }
    if let Err(e) = answer.await {
        warn!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    outcome.map(|_| ())
}

/// Run the action behind a button, returning a short notice for the user
async fn handle_card_action(
    bot: &Bot,
    q: &CallbackQuery,
    services: &BotServices,
    dialogue: &QuoteDialogue,
    language_code: Option<&str>,
) -> Result<Option<String>> {
    let action = match q.data.as_deref().and_then(CardAction::from_data) {
        Some(action) => action,
        None => {
            debug!(user_id = %q.from.id, "Ignoring unknown callback data");
            return Ok(None);
        }
    };

    let chat_id = dialogue.chat_id();
    let state = dialogue.get().await?.unwrap_or_default();

    match action {
        CardAction::GenerateAgain => {
            // The chat waits for a fresh query even if the prompt is lost
            dialogue.update(state.after_action(action)).await?;
            info!(user_id = %chat_id, "Waiting for a fresh query");

            bot.send_message(chat_id, t_lang("fresh-query-prompt", language_code))
                .await?;
            Ok(None)
        }
        CardAction::SendToChannel => {
            let Some(card) = services.cards.last(chat_id).await else {
                debug!(user_id = %chat_id, "No card to send to channel");
                return Ok(Some(t_lang("channel-nothing-to-send", language_code)));
            };

            let channel = &services.config.broadcast_channel;
            bot.send_photo(channel_recipient(channel), InputFile::file_id(card.file_id))
                .caption(card.caption)
                .parse_mode(ParseMode::MarkdownV2)
                .await?;

            info!(user_id = %chat_id, channel = %channel, "Quote card sent to channel");
            Ok(Some(t_args_lang(
                "channel-sent",
                &[("channel", channel.as_str())],
                language_code,
            )))
        }
    }
}
