//! The upstream model gateway: wire types, SSE framing, and clients.

pub mod client;
pub mod sse;
pub mod types;

pub use client::{GatewayConnector, GatewayEventStream, HttpGatewayConnector, ModelGateway};
