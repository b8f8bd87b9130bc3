//! Playback primitive implementations

pub mod gizmo_host;

pub use gizmo_host::{GizmoHost, GizmoState};
