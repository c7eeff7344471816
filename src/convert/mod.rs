//! Conversion between the Messages wire format and the gateway convention.

pub mod request;
pub mod response;
pub mod schema;
