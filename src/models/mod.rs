//! Wire-format data models for the relay.

pub mod request;
pub mod response;
pub mod stream;
