use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No transaction rows were supplied")]
    NoRows,

    #[error("Required column '{0}' not found in input")]
    MissingColumn(String),

    #[error("Unknown aggregate '{0}' referenced by section configuration")]
    UnknownAggregate(String),

    #[error("Run cancelled between pipeline stages")]
    Cancelled,

    #[error("Text generation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
