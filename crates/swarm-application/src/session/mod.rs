//! Session application services.
//!
//! Helpers used by `SessionService` to run and observe sessions.

mod handle;
mod subscribers;

pub use handle::{DriveOutcome, SessionHandle};
pub use subscribers::SnapshotSubscribers;
