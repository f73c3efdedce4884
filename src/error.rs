use thiserror::Error;

use crate::collect::FetchFailure;

#[derive(Error, Debug)]
pub enum Error {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid job table: {0}")]
    InvalidTable(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error(
        "Collection finished with {} failure(s): {}",
        .0.len(),
        FetchFailure::join(.0)
    )]
    Collection(Vec<FetchFailure>),
}

pub type Result<T> = std::result::Result<T, Error>;
