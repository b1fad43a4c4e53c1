//! Card Pipeline module: query → completion → quote → image → photo message

use anyhow::{bail, Context, Result};
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::{debug, error, info};

use crate::card_store::QuoteCard;
use crate::completion::CompletionResult;
use crate::interaction_log::InteractionRecord;
use crate::quote_extractor::{extract, ExtractedQuote};

use super::services::BotServices;
use super::ui_builder::{create_card_keyboard, format_caption};

/// Check a completion result and extract its quote
pub fn quote_from_completion(completion: &CompletionResult) -> Result<ExtractedQuote> {
    if !completion.is_success() {
        bail!("completion has no usable text: {}", completion.response);
    }
    if completion.response.trim().is_empty() {
        bail!("completion returned an empty response");
    }

    extract(&completion.response).context("Completion is not in the expected quote format")
}

/// Run the whole pipeline for one query and send the card to `chat_id`
///
/// On success the card is remembered for "send to channel" and the
/// interaction is logged. A logging failure does not fail the pipeline.
pub async fn generate_quote_card(
    bot: &Bot,
    services: &BotServices,
    chat_id: ChatId,
    query: &str,
    language_code: Option<&str>,
) -> Result<ExtractedQuote> {
    let completion = services
        .completion
        .generate(query)
        .await
        .context("Completion request failed")?;
    debug!(user_id = %chat_id, status = ?completion.status, "Completion received");

    let quote = quote_from_completion(&completion)?;
    info!(user_id = %chat_id, author = %quote.author, "Quote extracted");

    let seed = u64::from(rand::random::<u32>());
    let image_path = services
        .images
        .generate(&quote.quote, seed)
        .await
        .context("Image generation failed")?;

    if !tokio::fs::try_exists(&image_path).await.unwrap_or(false) {
        bail!("generated image does not exist: {}", image_path.display());
    }

    let caption = format_caption(
        &quote.quote,
        &quote.author,
        &services.config.channel_url,
        language_code,
    );

    let sent = bot
        .send_photo(chat_id, InputFile::file(image_path.clone()))
        .caption(caption.clone())
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(create_card_keyboard(language_code))
        .await
        .context("Failed to send quote card")?;

    match sent.photo().and_then(|sizes| sizes.last()) {
        Some(largest) => {
            services
                .cards
                .remember(
                    chat_id,
                    QuoteCard {
                        file_id: largest.file.id.clone(),
                        caption,
                    },
                )
                .await;
        }
        None => debug!(user_id = %chat_id, "Sent message carries no photo, card not remembered"),
    }

    let record = InteractionRecord::new(chat_id.0, query, &quote.quote, &quote.author);
    if let Err(e) = services.interactions.save(record).await {
        error!(user_id = %chat_id, error = %e, "Failed to save interaction");
    }

    Ok(quote)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionStatus, MISSING_TEXT_PLACEHOLDER};

    fn completion(response: &str, status: CompletionStatus) -> CompletionResult {
        CompletionResult {
            response: response.to_string(),
            status,
        }
    }

    #[test]
    fn test_error_tagged_completion_rejected() {
        let result = quote_from_completion(&completion(
            MISSING_TEXT_PLACEHOLDER,
            CompletionStatus::Error,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_completion_rejected() {
        assert!(quote_from_completion(&completion("  ", CompletionStatus::Success)).is_err());
    }

    #[test]
    fn test_unquoted_completion_rejected() {
        let result = quote_from_completion(&completion(
            "Courage is grace under pressure - Hemingway",
            CompletionStatus::Success,
        ));
        assert!(result.is_err());
    }
}
