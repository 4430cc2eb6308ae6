use crate::prelude::f;
use gamesense_core::api::ErrorCategory;
use gamesense_core::guide::GuideError;
use gamesense_core::payload::AssemblyError;
use gamesense_core::retry::FailureClass;

/// Failure to turn one guide URL into text. Never reaches the caller.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Invalid guide URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Could not extract text from {url}: {source}")]
    Extract {
        url: String,
        #[source]
        source: GuideError,
    },

    #[error("{url} is larger than {limit} bytes")]
    TooLarge { url: String, limit: usize },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },
}

/// Failure of a single model call.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Rate limited (HTTP 429): {message}")]
    RateLimited { message: String },

    #[error("Upstream server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request rejected (HTTP {status}): {message}")]
    Validation { status: u16, message: String },

    #[error("Model call failed: {0}")]
    Unknown(String),
}

impl ModelError {
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match FailureClass::from_status(status) {
            FailureClass::RateLimited => ModelError::RateLimited { message },
            FailureClass::Server => ModelError::Server { status, message },
            FailureClass::Client => ModelError::Validation { status, message },
            FailureClass::Unknown => ModelError::Unknown(f!("unexpected HTTP {status}: {message}")),
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            ModelError::RateLimited { .. } => FailureClass::RateLimited,
            ModelError::Server { .. } => FailureClass::Server,
            ModelError::Validation { .. } => FailureClass::Client,
            ModelError::Unknown(_) => FailureClass::Unknown,
        }
    }
}

/// Outcome of the dispatcher once its retry policy is done with a request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Fatal(ModelError),

    #[error("Model still failing after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: ModelError },
}

/// Anything that ends a generate-content request without text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl From<AssemblyError> for GenerateError {
    fn from(err: AssemblyError) -> Self {
        GenerateError::Validation(err.to_string())
    }
}

impl From<FetchError> for GenerateError {
    fn from(err: FetchError) -> Self {
        GenerateError::Validation(err.to_string())
    }
}

impl GenerateError {
    /// The caller-facing category; internal detail stays in the logs.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GenerateError::Validation(message) => ErrorCategory::BadRequest(message.clone()),
            GenerateError::Dispatch(DispatchError::ExhaustedRetries { .. }) => {
                ErrorCategory::ServiceUnavailable
            }
            GenerateError::Dispatch(DispatchError::Fatal(_)) => ErrorCategory::Internal,
        }
    }
}
