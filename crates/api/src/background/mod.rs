//! Detached background work spawned by request handlers.

pub mod analysis;
