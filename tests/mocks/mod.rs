//! Mock infrastructure for testing external services
//!
//! The only external dependency of the relay is its upstream provider, which
//! is mocked with wiremock in `upstream.rs`.

pub mod upstream;

pub use upstream::*;
