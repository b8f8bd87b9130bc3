//! Minstrel core: per-player audio preferences and playback routing
//!
//! The [`domain`] module holds the profile model, the per-player store, the
//! playback router and the synchronizer. [`service`] runs the synchronizer
//! as a single event loop so events for a player are handled one at a time
//! in arrival order.

pub mod domain;
pub mod service;

pub use service::{AudioService, AudioServiceHandle, ServiceError};
