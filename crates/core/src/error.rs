// Central Error Type for the Application

use crate::domain::{DomainError, QueueFull};
use crate::port::{AssetError, ConvertError, LocateError, ResolveError, SetupError};
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    QueueFull(#[from] QueueFull),

    #[error("Destination error: {0}")]
    Locate(#[from] LocateError),

    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Convert error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Human-readable reply for the requester's channel
    pub fn user_message(&self) -> String {
        match self {
            AppError::QueueFull(_) => "The queue is full!".to_string(),
            AppError::Locate(e) => e.to_string(),
            AppError::Resolve(ResolveError::DownloadFailed { reason, .. }) => {
                format!("Unable to download video: {}", reason)
            }
            AppError::Resolve(e) => format!("Unable to search for video: {}", e),
            AppError::Convert(e) => format!("Unable to convert video to audio: {}", e),
            AppError::Asset(e) => format!("Unable to store converted audio: {}", e),
            AppError::Setup(e) => format!("Unable to start voice worker: {}", e),
            AppError::Validation(msg) => msg.clone(),
            other => format!("Something went wrong: {}", other),
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
