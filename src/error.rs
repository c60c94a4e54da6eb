use crate::schema::Category;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CreditAnalysisError {
    #[error("Unknown risk category code '{0}': expected one of A, B, C, D, E")]
    UnknownCategory(String),

    #[error("No provision rate configured for category {0}")]
    MissingProvisionRate(Category),

    #[error("Invalid regulatory configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Risk classifier failed: {0}")]
    Classifier(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CreditAnalysisError>;
