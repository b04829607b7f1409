/*!
 * Error types for the scriptwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * `ParseError`, `SchemaError` and `ScopeError` are fatal for a run.
 * `RewriteFailure` is always contained to a single scene.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a later attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// The source document cannot be decoded into a canonical screenplay
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The document is not structurally valid
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// The document format is not one we read
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// A paragraph list could not be decoded from JSON
    #[error("Invalid paragraph list: {0}")]
    InvalidParagraphList(String),
}

/// The change plan violates its contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The plan is not valid JSON
    #[error("Change plan is not valid JSON: {0}")]
    InvalidJson(String),

    /// The plan root is not a JSON object
    #[error("Change plan must be a JSON object")]
    NotAnObject,

    /// The `scene_level_changes` key is absent
    #[error("Change plan is missing the 'scene_level_changes' key")]
    MissingChanges,

    /// The `scene_level_changes` value is not an array
    #[error("'scene_level_changes' must be a list")]
    ChangesNotASequence,
}

/// The requested scene range is invalid
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// Range end lies before its start
    #[error("Scene range end {end} is before start {start}")]
    Reversed { start: usize, end: usize },

    /// Range reaches outside the screenplay
    #[error("Scene range {start}-{end} is outside 1-{total}")]
    OutOfBounds { start: usize, end: usize, total: usize },
}

/// A single scene could not be rewritten; the scene keeps its original content
#[derive(Error, Debug, Clone)]
pub enum RewriteFailure {
    /// The rewrite capability returned an error
    #[error("Rewrite capability failed: {0}")]
    Provider(#[from] ProviderError),

    /// The task did not settle within its deadline
    #[error("Rewrite timed out after {0:?}")]
    Timeout(Duration),

    /// The response could not be decoded into a scene
    #[error("Malformed rewrite response: {0}")]
    MalformedResponse(String),

    /// The response was empty
    #[error("Rewrite capability returned an empty response")]
    EmptyResponse,

    /// An element-aligned response did not match the scene shape
    #[error("Expected {expected} elements, got {actual}")]
    ElementCountMismatch { expected: usize, actual: usize },
}

/// Fatal errors of a transformation run
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    /// Document could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Change plan is invalid
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Scene range is invalid
    #[error("Scope error: {0}")]
    Scope(#[from] ScopeError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Fatal pipeline error
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
