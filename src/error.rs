use thiserror::Error;

use crate::model::ItemKey;

/// Failures talking to a schedule store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Failures surfaced to the user by the Gantt engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not save {item}: {source}")]
    Persistence {
        item: ItemKey,
        #[source]
        source: StoreError,
    },

    #[error("no schedule is loaded")]
    NoSchedule,
}

pub type StoreResult<T> = Result<T, StoreError>;
