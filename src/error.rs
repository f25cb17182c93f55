//! Error types for the scoring pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CdIndexError>;

#[derive(Error, Debug)]
pub enum CdIndexError {
    #[error("Invalid date: {year}-{month:?}-{day:?}")]
    InvalidDate {
        year: i32,
        month: Option<u32>,
        day: Option<u32>,
    },

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Dangling edge endpoint: {src} -> {dst}")]
    DanglingEdgeEndpoint { src: String, dst: String },

    #[error("Source store unavailable ({path}): {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("Destination store unavailable ({path}): {reason}")]
    DestinationUnavailable { path: String, reason: String },

    #[error("Scoring failed for {key}: {reason}")]
    ScoringFailure { key: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CdIndexError {
    /// Stable identifier printed next to diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            CdIndexError::InvalidDate { .. } => "INVALID_DATE",
            CdIndexError::DuplicateKey(_) => "DUPLICATE_KEY",
            CdIndexError::DanglingEdgeEndpoint { .. } => "DANGLING_EDGE_ENDPOINT",
            CdIndexError::SourceUnavailable { .. } => "SOURCE_UNAVAILABLE",
            CdIndexError::DestinationUnavailable { .. } => "DESTINATION_UNAVAILABLE",
            CdIndexError::ScoringFailure { .. } => "SCORING_FAILURE",
            CdIndexError::InvalidConfig(_) => "INVALID_CONFIG",
            CdIndexError::WorkerPool(_) => "WORKER_POOL",
            CdIndexError::Store(_) => "STORE",
            CdIndexError::Io(_) | CdIndexError::Json(_) => "INTERNAL_ERROR",
        }
    }

    /// Record-level errors are absorbed by the ingestion and scoring loops;
    /// everything else aborts the run.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            CdIndexError::InvalidDate { .. }
                | CdIndexError::DuplicateKey(_)
                | CdIndexError::DanglingEdgeEndpoint { .. }
                | CdIndexError::ScoringFailure { .. }
        )
    }
}
