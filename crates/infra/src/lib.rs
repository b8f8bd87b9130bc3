//! Concrete collaborators for the Minstrel audio manager
//!
//! - [`storage`]: player storage backed by JSON files
//! - [`playback`]: an in-process audio gizmo host
//! - [`client`]: per-player delivery of client-bound messages over channels

pub mod client;
pub mod playback;
pub mod storage;

pub use client::ChannelClientLink;
pub use playback::{GizmoHost, GizmoState};
pub use storage::FileStorage;
