//! Credential rotation, exhaustion classification, and monthly reset.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::{DISABLED_RECORD_TTL, RESET_DAY};
use crate::rotation::store::{DisabledRecord, KvStore};

/// Stable non-reversible digest of a credential value.
pub fn credential_digest(credential: &str) -> String {
    format!("{:x}", Sha256::digest(credential.as_bytes()))
}

/// Process-local rotation state: round-robin cursor plus the set of
/// credential digests known (to this process) to be disabled.
#[derive(Debug, Default)]
struct RotationState {
    cursor: usize,
    disabled: HashSet<String>,
}

/// Operational status of one configured credential.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatus {
    pub digest: String,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_at: Option<i64>,
}

/// Owns the rotation list of upstream credentials.
///
/// One long-lived instance is shared across concurrent request handlers.
/// The local disabled set is populated lazily and never proactively
/// synchronized; candidate lists are optimistic and may briefly include a
/// credential another instance already exhausted.
pub struct CredentialManager {
    credentials: Vec<String>,
    state: Mutex<RotationState>,
    store: Arc<dyn KvStore>,
    /// Lowercased exhaustion keywords.
    keywords: Vec<String>,
}

impl CredentialManager {
    pub fn new(credentials: Vec<String>, store: Arc<dyn KvStore>, keywords: Vec<String>) -> Self {
        Self {
            credentials,
            state: Mutex::new(RotationState::default()),
            store,
            keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// Number of configured credentials.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Rotation-ordered candidate list, skipping locally disabled
    /// credentials. The cursor advances by exactly one per call regardless
    /// of how many were skipped, so every credential gets an equal long-run
    /// share of the first position.
    pub fn candidates(&self) -> Vec<String> {
        if self.credentials.is_empty() {
            return Vec::new();
        }
        let mut state = self.state.lock().expect("rotation state poisoned");
        let start = state.cursor % self.credentials.len();
        state.cursor = state.cursor.wrapping_add(1);

        (0..self.credentials.len())
            .map(|offset| &self.credentials[(start + offset) % self.credentials.len()])
            .filter(|cred| !state.disabled.contains(&credential_digest(cred)))
            .cloned()
            .collect()
    }

    /// Classify an upstream failure message as quota exhaustion.
    pub fn is_exhaustion(&self, failure_text: &str) -> bool {
        let lowered = failure_text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k))
    }

    /// Disable a credential: local exclusion takes effect immediately, the
    /// remote record write is best-effort.
    pub async fn disable(&self, credential: &str, reason: &str) {
        self.disable_at(credential, reason, Utc::now()).await
    }

    pub(crate) async fn disable_at(&self, credential: &str, reason: &str, now: DateTime<Utc>) {
        let digest = credential_digest(credential);
        {
            let mut state = self.state.lock().expect("rotation state poisoned");
            state.disabled.insert(digest.clone());
        }
        info!(digest = digest.as_str(), reason, "Credential disabled");

        let record = DisabledRecord {
            disabled_at: now.timestamp_millis(),
            reason: reason.to_string(),
            month: now.month(),
        };
        if let Err(e) = self.store.put(&digest, &record, DISABLED_RECORD_TTL).await {
            warn!(
                digest = digest.as_str(),
                store = self.store.name(),
                "Failed to persist disablement: {}",
                e
            );
        }
    }

    /// Status of one credential. The only path that forces a remote read;
    /// also the sole reset path: a stale record observed on or after day
    /// 15 of a later month is deleted here.
    pub async fn status(&self, credential: &str) -> CredentialStatus {
        self.status_at(credential, Utc::now()).await
    }

    pub(crate) async fn status_at(&self, credential: &str, now: DateTime<Utc>) -> CredentialStatus {
        let digest = credential_digest(credential);

        let record = match self.store.get(&digest).await {
            Ok(record) => record,
            Err(e) => {
                // Assume available rather than falsely blocking a usable credential
                warn!(
                    digest = digest.as_str(),
                    store = self.store.name(),
                    "Status read failed: {}",
                    e
                );
                return CredentialStatus {
                    digest,
                    disabled: false,
                    reason: None,
                    disabled_at: None,
                };
            }
        };

        match record {
            Some(record) if still_disabled(&record, now) => CredentialStatus {
                digest,
                disabled: true,
                reason: Some(record.reason),
                disabled_at: Some(record.disabled_at),
            },
            Some(_) => {
                if let Err(e) = self.store.delete(&digest).await {
                    warn!(
                        digest = digest.as_str(),
                        store = self.store.name(),
                        "Reset delete failed: {}",
                        e
                    );
                }
                let mut state = self.state.lock().expect("rotation state poisoned");
                state.disabled.remove(&digest);
                info!(digest = digest.as_str(), "Credential reset after monthly cycle");
                CredentialStatus {
                    digest,
                    disabled: false,
                    reason: None,
                    disabled_at: None,
                }
            }
            None => CredentialStatus {
                digest,
                disabled: false,
                reason: None,
                disabled_at: None,
            },
        }
    }

    /// Status of every configured credential, in rotation-list order.
    pub async fn status_all(&self) -> Vec<CredentialStatus> {
        let mut statuses = Vec::with_capacity(self.credentials.len());
        for credential in &self.credentials {
            statuses.push(self.status(credential).await);
        }
        statuses
    }
}

/// Whether a disablement record still holds at `now`: before day 15 of any
/// month, or any time during the month it was recorded in.
fn still_disabled(record: &DisabledRecord, now: DateTime<Utc>) -> bool {
    now.day() < RESET_DAY || record.month == now.month()
}

/// The next reset instant: the 15th of the current month if today precedes
/// it, else the 15th of the next month, at the start of the UTC day.
pub fn next_reset_at(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if now.day() < RESET_DAY {
        (now.year(), now.month())
    } else if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    chrono::NaiveDate::from_ymd_opt(year, month, RESET_DAY)
        .expect("day 15 exists in every month")
        .and_hms_opt(0, 0, 0)
        .expect("midnight exists")
        .and_utc()
}
