//! Error types and the wire error envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Relay error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed inbound request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request contained no messages.
    #[error("messages must not be empty")]
    EmptyMessages,

    /// Inbound shared-secret check failed.
    #[error("invalid or missing api key")]
    Unauthorized,

    /// Upstream gateway failure that is not quota exhaustion.
    #[error("upstream error: {message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// Every configured credential is quota-exhausted.
    #[error("all credentials exhausted: {message}")]
    QuotaExhausted {
        message: String,
        next_reset: DateTime<Utc>,
    },

    /// Remote key-value store failure.
    #[error("store error: {0}")]
    Store(String),

    /// Streaming failure.
    #[error("stream error: {0}")]
    Stream(String),

    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wire error kind for the envelope's `error.type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) | Error::EmptyMessages | Error::Json(_) => {
                "invalid_request_error"
            }
            Error::Unauthorized => "authentication_error",
            Error::QuotaExhausted { .. } => "quota_exhausted_error",
            Error::Upstream { .. } | Error::Store(_) | Error::Stream(_) | Error::Http(_) => {
                "api_error"
            }
        }
    }

    /// HTTP status to surface for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidRequest(_) | Error::EmptyMessages | Error::Json(_) => 400,
            Error::Unauthorized => 401,
            Error::QuotaExhausted { .. } => 429,
            Error::Upstream { status: Some(s), .. } if *s >= 400 => *s,
            _ => 500,
        }
    }

    /// Render this error as a wire envelope.
    pub fn envelope(&self) -> ErrorEnvelope {
        let next_reset = match self {
            Error::QuotaExhausted { next_reset, .. } => {
                Some(next_reset.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
            }
            _ => None,
        };
        ErrorEnvelope {
            envelope_type: "error".to_string(),
            error: ErrorBody {
                error_type: self.kind().to_string(),
                message: self.to_string(),
                next_reset,
            },
        }
    }
}

/// Wire error envelope: `{ "type": "error", "error": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "type")]
    pub envelope_type: String,
    pub error: ErrorBody,
}

/// Inner error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    /// ISO-8601 timestamp of the next monthly reset; quota errors only.
    #[serde(rename = "nextReset", skip_serializing_if = "Option::is_none")]
    pub next_reset: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_quota_envelope_carries_next_reset() {
        let err = Error::QuotaExhausted {
            message: "billing".into(),
            next_reset: Utc.with_ymd_and_hms(2026, 9, 15, 0, 0, 0).unwrap(),
        };
        assert_eq!(err.http_status(), 429);
        let envelope = err.envelope();
        assert_eq!(envelope.envelope_type, "error");
        assert_eq!(envelope.error.error_type, "quota_exhausted_error");
        assert_eq!(
            envelope.error.next_reset.as_deref(),
            Some("2026-09-15T00:00:00Z")
        );
    }

    #[test]
    fn test_invalid_request_is_400_without_next_reset() {
        let err = Error::InvalidRequest("max_tokens must be positive".into());
        assert_eq!(err.http_status(), 400);
        let body = serde_json::to_string(&err.envelope()).unwrap();
        assert!(body.contains(r#""type":"invalid_request_error""#));
        assert!(!body.contains("nextReset"));
    }
}
