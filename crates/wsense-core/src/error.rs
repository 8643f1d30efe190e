//! Error types for the WSense pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("format error in {source_name}: {reason}")]
    Format { source_name: String, reason: String },

    #[error("missing mandatory column '{column}' in {source_name}")]
    MissingColumn { source_name: String, column: String },

    #[error("reshape mismatch in {source_name}: {bytes} bytes cannot fill shape {shape:?}")]
    ReshapeMismatch {
        source_name: String,
        bytes: usize,
        shape: [usize; 4],
    },

    #[error("not a supported dataset: {0}")]
    UnknownDataset(String),

    #[error("no input file under {0}")]
    EmptyInput(String),

    #[error("invalid dataset configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::Config(format!("invalid filename pattern: {e}"))
    }
}
