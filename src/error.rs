//! Error handling and custom error types
//!
//! Provides unified error handling across the engine using thiserror.

use crate::modes::HintKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sentence provider error: {0}")]
    Provider(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No eligible sentence for the requested difficulty range")]
    NoEligibleContent,

    #[error("No {0} hint available for the current arrangement")]
    NoHintAvailable(HintKind),

    #[error("No {0} hints left")]
    OutOfHints(HintKind),

    #[error("The {0} hint is disabled in this mode")]
    HintDisabled(HintKind),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("No active puzzle")]
    NoActivePuzzle,

    #[error("Malformed sentence record: {0}")]
    StaleData(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, Error>;
