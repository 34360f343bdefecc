//! Application layer for Swarm.
//!
//! This crate runs sessions: it connects a `StreamProvider` to the
//! `SessionStore` and lets callers submit, cancel, retry and observe them.

pub mod session;
pub mod session_service;

pub use session::{DriveOutcome, SessionHandle};
pub use session_service::SessionService;
