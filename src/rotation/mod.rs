//! Credential rotation and quota-failover management.

pub mod manager;
pub mod store;

pub use manager::{credential_digest, next_reset_at, CredentialManager, CredentialStatus};
pub use store::{DisabledRecord, KvStore, MemoryKvStore, RestKvStore};
