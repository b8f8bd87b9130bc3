//! Persistent player storage implementations

pub mod file;

pub use file::FileStorage;
