/*!
 * Tests for error types and conversions
 */

use std::time::Duration;
use scriptwai::errors::{
    AppError, ParseError, PipelineError, ProviderError, RewriteFailure, SchemaError, ScopeError,
};

#[test]
fn test_providerError_apiError_shouldDisplayStatusAndMessage() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    let display = format!("{}", error);
    assert!(display.contains("429"));
    assert!(display.contains("Too many requests"));
}

#[test]
fn test_providerError_isRetryable_shouldSeparateTransientErrors() {
    assert!(ProviderError::ConnectionError("reset".to_string()).is_retryable());
    assert!(ProviderError::RateLimitExceeded("slow down".to_string()).is_retryable());
    assert!(ProviderError::ApiError { status_code: 503, message: String::new() }.is_retryable());
    assert!(!ProviderError::ApiError { status_code: 400, message: String::new() }.is_retryable());
    assert!(!ProviderError::AuthenticationError("bad key".to_string()).is_retryable());
}

#[test]
fn test_scopeError_shouldDisplayRange() {
    let error = ScopeError::OutOfBounds { start: 3, end: 9, total: 4 };
    assert_eq!(error.to_string(), "Scene range 3-9 is outside 1-4");

    let error = ScopeError::Reversed { start: 5, end: 2 };
    assert!(error.to_string().contains("before start 5"));
}

#[test]
fn test_rewriteFailure_fromProviderError_shouldWrap() {
    let failure: RewriteFailure = ProviderError::RequestFailed("boom".to_string()).into();
    assert!(matches!(failure, RewriteFailure::Provider(_)));
    assert!(failure.to_string().contains("boom"));

    let timeout = RewriteFailure::Timeout(Duration::from_secs(3));
    assert_eq!(timeout.to_string(), "Rewrite timed out after 3s");
}

#[test]
fn test_pipelineError_fromFatalErrors_shouldKeepKind() {
    let parse: PipelineError = ParseError::MalformedDocument("x".to_string()).into();
    let schema: PipelineError = SchemaError::MissingChanges.into();
    let scope: PipelineError = ScopeError::Reversed { start: 2, end: 1 }.into();

    assert!(matches!(parse, PipelineError::Parse(_)));
    assert!(matches!(schema, PipelineError::Schema(_)));
    assert!(matches!(scope, PipelineError::Scope(_)));
}

#[test]
fn test_appError_conversions_shouldMapToVariants() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "draft.fdx");
    assert!(matches!(AppError::from(io_error), AppError::File(_)));

    let anyhow_error = anyhow::anyhow!("something odd");
    assert!(matches!(AppError::from(anyhow_error), AppError::Unknown(_)));

    let pipeline: AppError = PipelineError::from(SchemaError::NotAnObject).into();
    assert!(pipeline.to_string().contains("Change plan must be a JSON object"));
}
