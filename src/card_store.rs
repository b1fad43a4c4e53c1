//! # Card Store Module
//!
//! Remembers the last quote card sent to each chat so the "send to channel"
//! button can repost it without generating a new image.

use std::collections::HashMap;

use teloxide::types::{ChatId, FileId};
use tokio::sync::RwLock;

/// A sent quote card, reusable through its Telegram file id
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteCard {
    pub file_id: FileId,
    pub caption: String,
}

/// Last sent card per chat
#[derive(Debug, Default)]
pub struct CardStore {
    cards: RwLock<HashMap<ChatId, QuoteCard>>,
}

impl CardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `card` as the latest one for `chat_id`, returning the card it replaces
    pub async fn remember(&self, chat_id: ChatId, card: QuoteCard) -> Option<QuoteCard> {
        self.cards.write().await.insert(chat_id, card)
    }

    pub async fn last(&self, chat_id: ChatId) -> Option<QuoteCard> {
        self.cards.read().await.get(&chat_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }
}
