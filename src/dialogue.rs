//! Per-chat conversation state for the quote card dialogue.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Represents whether the bot expects a fresh query from the chat
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuoteDialogueState {
    #[default]
    Idle,
    /// Entered after "Generate again"; left once the next text is consumed
    AwaitingFreshQuery,
}

/// Type alias for our quote dialogue
pub type QuoteDialogue = Dialogue<QuoteDialogueState, InMemStorage<QuoteDialogueState>>;

/// Inline button actions, encoded as callback data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardAction {
    GenerateAgain,
    SendToChannel,
}

impl CardAction {
    pub const GENERATE_AGAIN_DATA: &'static str = "generate_again";
    pub const SEND_TO_CHANNEL_DATA: &'static str = "send_to_channel";

    pub fn from_data(data: &str) -> Option<Self> {
        match data {
            Self::GENERATE_AGAIN_DATA => Some(CardAction::GenerateAgain),
            Self::SEND_TO_CHANNEL_DATA => Some(CardAction::SendToChannel),
            _ => None,
        }
    }

    pub fn data(self) -> &'static str {
        match self {
            CardAction::GenerateAgain => Self::GENERATE_AGAIN_DATA,
            CardAction::SendToChannel => Self::SEND_TO_CHANNEL_DATA,
        }
    }
}

impl QuoteDialogueState {
    /// State after a text message has been consumed
    ///
    /// Both states fall back to idle, whether or not generation succeeds.
    pub fn after_text_message(&self) -> QuoteDialogueState {
        QuoteDialogueState::Idle
    }

    /// State after a button press
    pub fn after_action(&self, action: CardAction) -> QuoteDialogueState {
        match action {
            CardAction::GenerateAgain => QuoteDialogueState::AwaitingFreshQuery,
            CardAction::SendToChannel => self.clone(),
        }
    }
}
