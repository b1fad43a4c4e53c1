//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Handles incoming text messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `card_pipeline`: Turns a query into a sent quote card
//! - `ui_builder`: Creates keyboards and formats captions
//! - `services`: Clients and stores shared by the handlers

pub mod callback_handler;
pub mod card_pipeline;
pub mod message_handler;
pub mod services;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use card_pipeline::{generate_quote_card, quote_from_completion};
pub use services::BotServices;
pub use ui_builder::{channel_recipient, create_card_keyboard, format_caption};
