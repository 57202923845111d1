//! Error types for arplace

use crate::platform::InputSourceId;
use crate::scene::NodeId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArPlaceError {
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    #[error("Failed to load asset '{path}': {reason}")]
    AssetLoad { path: String, reason: String },

    #[error("Scene node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Unknown controller: {0}")]
    UnknownController(InputSourceId),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Scene graph error: {0}")]
    Scene(String),
}

pub type Result<T> = std::result::Result<T, ArPlaceError>;
