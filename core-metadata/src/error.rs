use thiserror::Error;

/// Failure reported by the remote catalog.
///
/// Last.fm reports failures with a numeric code; the codes the app can act on
/// get their own variant and everything else, transport and decoding failures
/// included, collapses to [`ApiError::Undefined`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiError {
    #[error("undefined catalog error")]
    Undefined,

    #[error("invalid parameter (6)")]
    InvalidParameter,

    #[error("operation failed (8)")]
    OperationFailed,

    #[error("service offline (11)")]
    ServiceOffline,

    #[error("temporary error (16)")]
    TemporaryError,

    #[error("suspended API key (26)")]
    SuspendedApiKey,

    #[error("rate limit exceeded (29)")]
    RateLimitExceeded,
}

impl ApiError {
    /// Classify a Last.fm error code.
    pub fn from_code(code: i64) -> Self {
        match code {
            6 => ApiError::InvalidParameter,
            8 => ApiError::OperationFailed,
            11 => ApiError::ServiceOffline,
            16 => ApiError::TemporaryError,
            26 => ApiError::SuspendedApiKey,
            29 => ApiError::RateLimitExceeded,
            _ => ApiError::Undefined,
        }
    }

    /// The Last.fm error code, if this is a classified error.
    pub fn code(&self) -> Option<u16> {
        match self {
            ApiError::Undefined => None,
            ApiError::InvalidParameter => Some(6),
            ApiError::OperationFailed => Some(8),
            ApiError::ServiceOffline => Some(11),
            ApiError::TemporaryError => Some(16),
            ApiError::SuspendedApiKey => Some(26),
            ApiError::RateLimitExceeded => Some(29),
        }
    }

    /// Message suitable for showing to the user.
    pub fn description(&self) -> &'static str {
        match self {
            ApiError::ServiceOffline => "This service is temporarily offline. Try again later.",
            ApiError::TemporaryError => {
                "There was a temporary error processing your request. Please try again."
            }
            ApiError::SuspendedApiKey => {
                "Access for your account has been suspended, please contact Last.fm"
            }
            ApiError::RateLimitExceeded => "Your IP has made too many requests in a short period.",
            _ => "We ran into a problem. Please try again.",
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_round_trip() {
        for code in [6, 8, 11, 16, 26, 29] {
            let error = ApiError::from_code(code);
            assert_ne!(error, ApiError::Undefined);
            assert_eq!(error.code(), Some(code as u16));
        }
    }

    #[test]
    fn test_unknown_codes_are_undefined() {
        assert_eq!(ApiError::from_code(0), ApiError::Undefined);
        assert_eq!(ApiError::from_code(10), ApiError::Undefined);
        assert_eq!(ApiError::from_code(404), ApiError::Undefined);
        assert_eq!(ApiError::Undefined.code(), None);
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(
            ApiError::RateLimitExceeded.description(),
            "Your IP has made too many requests in a short period."
        );
        assert_eq!(
            ApiError::InvalidParameter.description(),
            ApiError::Undefined.description()
        );
    }
}
