//! Session reducer.
//!
//! Folds provider updates into a session. One reducer belongs to one session
//! and must see that session's updates in arrival order.

use super::failure::SessionFailure;
use super::model::{Session, SessionStatus};
use super::update::StreamUpdate;
use crate::protocol::IncrementalClassifier;
use crate::task::TaskStore;

/// Applies stream updates and failures to a single session.
///
/// Holds the session's classifier cache, so successive cumulative texts are
/// not re-read from the start.
#[derive(Debug, Clone, Default)]
pub struct SessionReducer {
    classifier: IncrementalClassifier,
}

impl SessionReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the next session state from `update`.
    ///
    /// Terminal sessions are returned unchanged. Report, log lines and
    /// references are replaced wholesale; layout and payload only advance;
    /// task mutations are applied to `tasks` under the session's id, in order.
    pub fn apply(&mut self, session: Session, tasks: &mut TaskStore, update: &StreamUpdate) -> Session {
        if session.is_terminal() {
            tracing::warn!(
                "[SessionReducer] session={} is {:?}, update ignored",
                session.id,
                session.status
            );
            return session;
        }

        let fragments = if update.is_final {
            self.classifier.finish(&update.raw_text)
        } else {
            self.classifier.classify(&update.raw_text)
        };
        let mut next = session;

        next.report = fragments.report;
        next.log_lines = fragments.log_lines;
        next.references = update.references.clone();
        next.layout = next.layout.merge(fragments.layout);

        for mutation in &update.task_mutations {
            tasks.apply(&next.id, mutation);
        }

        if let Some(payload) = fragments.structured_payload {
            next.structured_payload = Some(payload);
        }

        let status = if update.is_final {
            SessionStatus::Completed
        } else {
            SessionStatus::Streaming
        };
        if status != next.status {
            tracing::info!(
                "[SessionReducer] session={} {:?} -> {:?}",
                next.id,
                next.status,
                status
            );
        }
        next.status = status;
        next.touch();

        tracing::debug!(
            "[SessionReducer] session={} report={}B logs={} layout={} payload={}",
            next.id,
            next.report.len(),
            next.log_lines.len(),
            next.layout,
            next.structured_payload.is_some()
        );
        next
    }

    /// Marks the session failed, keeping everything accumulated so far.
    pub fn fail(&mut self, session: Session, failure: SessionFailure) -> Session {
        if session.is_terminal() {
            tracing::warn!(
                "[SessionReducer] session={} is {:?}, failure ignored: {}",
                session.id,
                session.status,
                failure
            );
            return session;
        }

        tracing::warn!("[SessionReducer] session={} failed: {}", session.id, failure);
        let mut next = session;
        next.status = SessionStatus::Failed;
        next.failure = Some(failure);
        next.touch();
        next
    }
}
