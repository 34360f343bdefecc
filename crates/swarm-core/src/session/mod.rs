//! Session domain module.
//!
//! This module contains all session-related domain models and the reducer
//! that projects provider updates onto them.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `SessionStatus`, `SessionSnapshot`)
//! - `request`: Submitted query and configuration (`QueryRequest`, `QueryConfig`)
//! - `update`: Provider emissions (`StreamUpdate`)
//! - `failure`: Provider failure taxonomy (`SessionFailure`, `FailureKind`)
//! - `reducer`: Per-session update folding (`SessionReducer`)
//! - `store`: Single-writer session store (`SessionStore`)
//!
//! # Usage
//!
//! ```ignore
//! use swarm_core::session::{SessionStore, StreamUpdate, QueryRequest};
//! ```

mod failure;
mod model;
mod reducer;
mod request;
mod store;
mod update;

// Re-export public API
pub use failure::{FailureKind, SessionFailure};
pub use model::{Session, SessionSnapshot, SessionStatus};
pub use reducer::SessionReducer;
pub use request::{
    Attachment, ConversationTurn, GeoLocation, ModelChoice, QueryConfig, QueryRequest, TurnRole,
};
pub use store::SessionStore;
pub use update::StreamUpdate;
