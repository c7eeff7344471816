//! Configuration surface and constants for the relay.

use std::time::Duration;

/// Delimiter separating credentials in the multi-credential config value.
pub const CREDENTIAL_DELIMITER: char = ',';

/// Calendar day on which disabled credentials become eligible for reset.
pub const RESET_DAY: u32 = 15;

/// Expiry applied to remote disablement records. Chosen to outlive the
/// longest possible gap to the next monthly reset.
pub const DISABLED_RECORD_TTL: Duration = Duration::from_secs(35 * 24 * 60 * 60);

/// Textual delimiter used to fold prior thinking into upstream context.
/// The downstream model has no first-class "prior thinking" slot.
pub const THINKING_OPEN_TAG: &str = "<thinking>";
pub const THINKING_CLOSE_TAG: &str = "</thinking>";

/// Default keyword set for quota-exhaustion classification. Matched
/// case-insensitively against upstream failure text. Configuration, not a
/// hard-coded contract: upstream wording changes are absorbed here.
pub fn default_exhaustion_keywords() -> Vec<String> {
    [
        "quota",
        "insufficient",
        "limit",
        "billing",
        "payment",
        "credit",
        "balance",
        "spending",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Relay runtime configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Rotation-ordered upstream credentials.
    pub credentials: Vec<String>,
    /// Optional inbound shared secret, compared against `x-api-key`.
    pub inbound_secret: Option<String>,
    /// Base URL of the upstream model gateway.
    pub upstream_base_url: String,
    /// Keyword set for exhaustion classification.
    pub exhaustion_keywords: Vec<String>,
}

impl RelayConfig {
    /// Build a config from a delimited credential string.
    pub fn new(credentials: &str, upstream_base_url: impl Into<String>) -> Self {
        Self {
            credentials: parse_credentials(credentials),
            inbound_secret: None,
            upstream_base_url: upstream_base_url.into(),
            exhaustion_keywords: default_exhaustion_keywords(),
        }
    }

    /// Set the inbound shared secret.
    pub fn with_inbound_secret(mut self, secret: impl Into<String>) -> Self {
        self.inbound_secret = Some(secret.into());
        self
    }

    /// Override the exhaustion keyword set.
    pub fn with_exhaustion_keywords(mut self, keywords: Vec<String>) -> Self {
        self.exhaustion_keywords = keywords;
        self
    }

    /// Load from environment: `RELAY_CREDENTIALS` (delimited list) with
    /// `RELAY_CREDENTIAL` as the single-credential legacy fallback,
    /// `RELAY_UPSTREAM_URL`, and optional `RELAY_INBOUND_SECRET`.
    pub fn from_env() -> crate::error::Result<Self> {
        let credentials = std::env::var("RELAY_CREDENTIALS")
            .or_else(|_| std::env::var("RELAY_CREDENTIAL"))
            .map_err(|_| {
                crate::error::Error::InvalidRequest("no credentials configured".to_string())
            })?;
        let upstream = std::env::var("RELAY_UPSTREAM_URL").map_err(|_| {
            crate::error::Error::InvalidRequest("RELAY_UPSTREAM_URL not set".to_string())
        })?;
        let mut config = Self::new(&credentials, upstream);
        if let Ok(secret) = std::env::var("RELAY_INBOUND_SECRET") {
            if !secret.is_empty() {
                config.inbound_secret = Some(secret);
            }
        }
        Ok(config)
    }
}

/// Parse a delimited multi-credential string into a rotation list.
/// A single credential yields a length-1 list. Empty entries are dropped.
pub fn parse_credentials(raw: &str) -> Vec<String> {
    raw.split(CREDENTIAL_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
