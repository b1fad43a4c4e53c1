//! # Error Types Module
//!
//! This module defines the error types used throughout the quote card pipeline.
//! Configuration problems are fatal at startup; every other error aborts the
//! processing of a single update and is logged by the handler.

/// Errors raised while reading the environment at startup
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required variable is absent or empty
    Missing(String),
    /// A variable is present but cannot be parsed
    Invalid { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "environment variable {key} is not set"),
            ConfigError::Invalid { key, value } => {
                write!(f, "environment variable {key} has an invalid value: {value:?}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised while parsing a completion into a quote and author
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteError {
    /// The text does not start with a «quoted» segment
    MalformedFormat(String),
}

impl std::fmt::Display for QuoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteError::MalformedFormat(text) => {
                write!(f, "Malformed format: not enough data to extract a quote from {text:?}")
            }
        }
    }
}

impl std::error::Error for QuoteError {}

/// Errors raised by the completion and image generation clients
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Non-success HTTP status, with the raw response body
    Status { status: u16, reason: String, body: String },
    /// Connection failures, timeouts and undecodable bodies
    Network(String),
    /// The response JSON is missing an expected field
    Shape(String),
    /// The image job finished with an `error` field
    OperationFailed(String),
    /// The image job did not finish within the poll budget
    Timeout(String),
    /// The decoded image could not be written to disk
    Io(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Status { status, reason, body } => {
                write!(f, "API error: {status} {reason}, response: {body}")
            }
            ApiError::Network(msg) => write!(f, "Network error: {msg}"),
            ApiError::Shape(msg) => write!(f, "Unexpected response shape: {msg}"),
            ApiError::OperationFailed(msg) => write!(f, "Operation failed: {msg}"),
            ApiError::Timeout(msg) => write!(f, "Timeout error: {msg}"),
            ApiError::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}
