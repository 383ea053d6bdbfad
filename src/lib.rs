//! Transit Panel Library
//!
//! Aggregates São Paulo traffic and transit data behind a small HTTP API,
//! alongside a poll vote counter. Exposed as a library for integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod panel;
pub mod proxy;
pub mod server;
pub mod votes;
