//! Domain types and validation shared by the Bugspot API, datastore, and
//! embeddable widget crates.
//!
//! This crate has no internal dependencies so it can be used from the
//! server, the client SDK, and any future CLI tooling alike.

pub mod analysis;
pub mod api_keys;
pub mod environment;
pub mod error;
pub mod report;
pub mod types;
