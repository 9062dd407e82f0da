//! Error types for resource loading
//!
//! Only startup map loading can fail. Everything that runs per tick is total.

use std::io;

/// Errors raised while loading map documents
#[derive(thiserror::Error, Debug)]
pub enum MapError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed map JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid map '{name}': {reason}")]
    Invalid { name: String, reason: String },

    #[error("Failed to fetch map '{name}': {reason}")]
    Fetch { name: String, reason: String },

    #[error("Map '{0}' is in the cycle order but was not loaded")]
    UnknownMap(String),

    #[error("Map cycle order is empty")]
    EmptyCycle,
}
