use crate::types::EventIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Invalid configuration: {field} {reason}")]
    Configuration { field: &'static str, reason: String },

    #[error("Event {event_index} is not covered by any block")]
    EventNotFound { event_index: EventIndex },

    #[error("Dataset '{name}' not found")]
    DatasetNotFound { name: String },

    #[error("Malformed layout: {0}")]
    MalformedLayout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeedError {
    pub fn config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            reason: reason.into(),
        }
    }
}

pub type SeedResult<T> = Result<T, SeedError>;
