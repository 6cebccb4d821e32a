// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode), // e.g., 404 Not Found, 403 Forbidden

    #[error("SEC Rate limit likely exceeded")]
    RateLimited,

    #[error("Could not find CIK for ticker {0}")]
    TickerNotFound(String),

    #[error("Could not find specified filing: {0}")]
    FilingDocNotFound(String),

    #[error("Failed to parse EDGAR response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Could not read document {}: {source}", path.display())]
    DocumentRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Document {} is not valid UTF-8", .0.display())]
    DocumentDecode(PathBuf),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Could not read artifact {}: {source}", path.display())]
    ArtifactRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Malformed artifact: {0}")]
    MalformedArtifact(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Could not write artifact {}: {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unknown company: {0}")]
    UnknownCompany(String),

    #[error("No analysis named '{analysis}' for {company}")]
    UnknownAnalysis { company: String, analysis: String },

    #[error("No relevant data found for {company} in {years}")]
    NoData { company: String, years: String },

    #[error("Completion request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Completion API call failed with status code: {0}")]
    Http(reqwest::StatusCode),

    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError), // Automatically convert Edgar errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
