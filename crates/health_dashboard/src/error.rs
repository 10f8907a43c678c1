//! Error types for the dashboard core.

use health_platform::PlatformError;
use thiserror::Error;

/// Why the authorization flow stopped short of `Authorized`.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("Google Fit / Apple Health / Health Connect not available.")]
    Unavailable,

    #[error("Authorization denied by user.")]
    Denied,

    #[error("Error during health access: {0}")]
    Platform(#[source] PlatformError),
}

/// Why a single metric could not be loaded.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("expected an array of records, got {0}")]
    UnexpectedShape(&'static str),

    #[error("record {index} is malformed: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("daily values sum to a non-finite total")]
    Overflow,

    #[error("could not serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_user_facing_text() {
        assert_eq!(
            AuthorizationError::Denied.to_string(),
            "Authorization denied by user."
        );
        let err = AuthorizationError::Platform(PlatformError::Rejected("boom".into()));
        assert_eq!(
            err.to_string(),
            "Error during health access: platform call rejected: boom"
        );
        assert_eq!(
            FetchError::UnexpectedShape("object").to_string(),
            "expected an array of records, got object"
        );
    }
}
