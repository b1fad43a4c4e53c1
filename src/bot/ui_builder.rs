//! UI Builder module for creating keyboards and formatting captions

use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Recipient};
use teloxide::utils::markdown;

// Import localization
use crate::localization::t_lang;

// Import dialogue types
use crate::dialogue::CardAction;

/// Format a quote card caption for MarkdownV2
///
/// The quote sits in guillemets, the author is italic and the caption ends
/// with a link to the channel.
pub fn format_caption(
    quote: &str,
    author: &str,
    channel_url: &str,
    language_code: Option<&str>,
) -> String {
    format!(
        "«{}»\n\n{}\n\n{}",
        markdown::escape(quote),
        markdown::italic(&markdown::escape(author)),
        markdown::link(
            channel_url,
            &markdown::escape(&t_lang("channel-link-text", language_code))
        )
    )
}

/// Create the inline keyboard shown under every quote card
pub fn create_card_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            t_lang("button-generate-again", language_code),
            CardAction::GenerateAgain.data(),
        ),
        InlineKeyboardButton::callback(
            t_lang("button-send-to-channel", language_code),
            CardAction::SendToChannel.data(),
        ),
    ]])
}

/// Turn the configured channel into a send target
///
/// Numeric values are chat ids, anything else is a public `@username`.
pub fn channel_recipient(channel: &str) -> Recipient {
    let channel = channel.trim();
    match channel.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if channel.starts_with('@') => Recipient::ChannelUsername(channel.to_string()),
        Err(_) => Recipient::ChannelUsername(format!("@{channel}")),
    }
}
