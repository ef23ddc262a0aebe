//! Error types for the structural mail layer.
//!
//! Only MIME parsing can fail. Classification and attribute extraction
//! degrade to unknown/absent results instead of erroring.

use thiserror::Error;

/// Errors that can occur while parsing a raw message
#[derive(Error, Debug)]
pub enum ParseError {
    /// Failed to parse the message structure
    #[error("Failed to parse message structure: {0}")]
    Structure(String),

    /// Failed to decode a body payload
    #[error("Failed to decode content: {0}")]
    Decode(String),
}

/// Result type for message parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;
