//! # anthropic-relay
//!
//! Relay server translating the Anthropic Messages API onto a
//! schema-based model gateway.
//!
//! Inbound requests arrive in Anthropic wire format (content blocks,
//! tools, streaming SSE); they are converted to the gateway's parts-based
//! format, dispatched with credential rotation and quota failover, and the
//! results are re-framed back into Messages API responses and event
//! streams.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use anthropic_relay::{
//!     AppState, CredentialManager, Dispatcher, HttpGatewayConnector, MemoryKvStore, RelayConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RelayConfig::from_env().unwrap();
//!     let rotation = CredentialManager::new(
//!         config.credentials.clone(),
//!         Arc::new(MemoryKvStore::new()),
//!         config.exhaustion_keywords.clone(),
//!     );
//!     let connector = Arc::new(HttpGatewayConnector::new(&config.upstream_base_url));
//!     let state = AppState {
//!         dispatcher: Arc::new(Dispatcher::new(rotation, connector)),
//!         inbound_secret: config.inbound_secret.clone(),
//!     };
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, anthropic_relay::router(state)).await.unwrap();
//! }
//! ```

pub mod config;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod rotation;
pub mod server;
pub mod stream;
pub mod upstream;

// Re-exports for ergonomic usage
pub use config::RelayConfig;
pub use dispatch::{Dispatcher, MessagesRequestBuilder};
pub use error::{Error, Result};
pub use models::request::{
    ContentBlock, Message, MessageContent, MessagesRequest, Role, SystemPrompt, ThinkingConfig,
    Tool, ToolChoice,
};
pub use models::response::{MessagesResponse, ResponseContentBlock, StopReason, Usage};
pub use models::stream::{ContentDelta, MessageDelta, StreamEvent};
pub use rotation::{CredentialManager, CredentialStatus, KvStore, MemoryKvStore, RestKvStore};
pub use server::{router, AppState};
pub use upstream::client::{GatewayConnector, HttpGatewayConnector, ModelGateway};
