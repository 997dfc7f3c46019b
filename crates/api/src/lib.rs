//! Bugspot HTTP API.
//!
//! Axum server exposing auth, bug report, widget configuration, and
//! analytics endpoints over a [`bugspot_db::store::Datastore`].

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
