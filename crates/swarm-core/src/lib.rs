//! Core domain of Swarm.
//!
//! The backend streams plain text with inline protocol markers. This crate
//! turns that cumulative text into structured session state:
//!
//! - `protocol`: the stream classifier
//! - `session`: sessions, the reducer and the single-writer store
//! - `task`: the mission task list and its two mutation forms

pub mod config;
pub mod error;
pub mod layout;
pub mod protocol;
pub mod reference;
pub mod session;
pub mod task;

// Re-export common types
pub use error::SwarmError;
pub use layout::Layout;
pub use reference::{Reference, ReferenceKind};
