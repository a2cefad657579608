//! Thin wrappers around the three external managed services. Each gateway
//! owns a validated copy of its configuration and a shared HTTP client, and
//! reports failures through [`crate::error::GatewayError`].

pub mod answer;
pub mod retrieval;
pub mod storage;
