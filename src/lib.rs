//! # Quote Card Telegram Bot
//!
//! A Telegram bot that asks a language model for a quotation on the user's
//! topic, illustrates it with a generated image and replies with the image
//! and a formatted caption.

pub mod bot;
pub mod card_store;
pub mod completion;
pub mod config;
pub mod dialogue;
pub mod errors;
pub mod image_job;
pub mod interaction_log;
pub mod localization;
pub mod quote_extractor;
