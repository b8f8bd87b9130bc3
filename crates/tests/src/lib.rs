//! Cross-crate integration tests for Minstrel
//!
//! The audio manager is driven against the real infra collaborators: JSON
//! files in a temporary directory, the in-process gizmo host and channel
//! client links.

#[cfg(test)]
mod lifecycle_integration;
#[cfg(test)]
mod service_integration;
