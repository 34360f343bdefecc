//! Session store.
//!
//! The single owner of all session state. Every mutation goes through
//! `apply` or `fail`; reads hand out snapshots.

use std::collections::HashMap;

use super::failure::SessionFailure;
use super::model::{Session, SessionSnapshot};
use super::reducer::SessionReducer;
use super::request::QueryRequest;
use super::update::StreamUpdate;
use crate::error::{Result, SwarmError};
use crate::task::{Task, TaskStore};

struct SessionEntry {
    session: Session,
    request: QueryRequest,
    reducer: SessionReducer,
}

/// Sessions keyed by id, plus the task collection they own.
///
/// Taking `&mut self` for every write gives one writer at a time; callers
/// that share the store across tasks wrap it in a lock.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<String, SessionEntry>,
    /// Session ids in creation order
    order: Vec<String>,
    tasks: TaskStore,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session for `request` in `Initializing` state.
    pub fn create(&mut self, request: QueryRequest) -> SessionSnapshot {
        let session = Session::new(request.query.clone());
        let id = session.id.clone();
        tracing::info!("[SessionStore] created session={} query={:?}", id, session.query);

        self.order.push(id.clone());
        self.sessions.insert(
            id.clone(),
            SessionEntry {
                session,
                request,
                reducer: SessionReducer::new(),
            },
        );
        self.snapshot_of(&id)
    }

    /// Applies a provider update to a session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist. Updates to terminal
    /// sessions are ignored, not rejected.
    pub fn apply(&mut self, session_id: &str, update: &StreamUpdate) -> Result<SessionSnapshot> {
        let entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SwarmError::not_found("Session", session_id))?;

        let session = std::mem::take(&mut entry.session);
        entry.session = entry.reducer.apply(session, &mut self.tasks, update);
        Ok(self.snapshot_of(session_id))
    }

    /// Records a provider failure on a session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the session does not exist.
    pub fn fail(&mut self, session_id: &str, failure: SessionFailure) -> Result<SessionSnapshot> {
        let entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| SwarmError::not_found("Session", session_id))?;

        let session = std::mem::take(&mut entry.session);
        entry.session = entry.reducer.fail(session, failure);
        Ok(self.snapshot_of(session_id))
    }

    pub fn get(&self, session_id: &str) -> Option<&Session> {
        self.sessions.get(session_id).map(|entry| &entry.session)
    }

    /// The request a session was created from.
    pub fn request(&self, session_id: &str) -> Option<&QueryRequest> {
        self.sessions.get(session_id).map(|entry| &entry.request)
    }

    pub fn tasks(&self, session_id: &str) -> &[Task] {
        self.tasks.tasks(session_id)
    }

    pub fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.sessions
            .contains_key(session_id)
            .then(|| self.snapshot_of(session_id))
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<&Session> {
        self.order
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Forgets a session and its tasks.
    pub fn remove(&mut self, session_id: &str) -> Option<Session> {
        let entry = self.sessions.remove(session_id)?;
        self.order.retain(|id| id != session_id);
        self.tasks.remove_session(session_id);
        tracing::info!("[SessionStore] removed session={}", session_id);
        Some(entry.session)
    }

    fn snapshot_of(&self, session_id: &str) -> SessionSnapshot {
        SessionSnapshot {
            session: self.get(session_id).cloned().unwrap_or_default(),
            tasks: self.tasks.tasks(session_id).to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FailureKind, SessionStatus};
    use crate::task::{TaskMutation, TaskStatus};

    #[test]
    fn test_create_and_list_in_order() {
        let mut store = SessionStore::new();
        let first = store.create(QueryRequest::new("first"));
        let second = store.create(QueryRequest::new("second"));

        let queries: Vec<&str> = store.list().iter().map(|s| s.query.as_str()).collect();
        assert_eq!(queries, vec!["first", "second"]);
        assert_eq!(first.session.status, SessionStatus::Initializing);
        assert_eq!(store.request(&second.session.id).unwrap().query, "second");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_apply_unknown_session_is_not_found() {
        let mut store = SessionStore::new();
        let err = store.apply("missing", &StreamUpdate::text("x")).unwrap_err();
        assert!(err.is_not_found());
        let err = store
            .fail("missing", SessionFailure::new(FailureKind::Unknown, "x"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut store = SessionStore::new();
        let a = store.create(QueryRequest::new("a")).session.id;
        let b = store.create(QueryRequest::new("b")).session.id;

        store
            .apply(
                &a,
                &StreamUpdate::text("alpha\n").with_mutations(vec![TaskMutation::create(
                    "t1",
                    "A task",
                    TaskStatus::Pending,
                )]),
            )
            .unwrap();
        store.apply(&b, &StreamUpdate::text("beta\n")).unwrap();
        store
            .fail(&b, SessionFailure::new(FailureKind::Network, "reset"))
            .unwrap();

        assert_eq!(store.get(&a).unwrap().report, "alpha\n");
        assert_eq!(store.get(&a).unwrap().status, SessionStatus::Streaming);
        assert_eq!(store.tasks(&a).len(), 1);
        assert_eq!(store.get(&b).unwrap().status, SessionStatus::Failed);
        assert!(store.tasks(&b).is_empty());
    }

    #[test]
    fn test_snapshot_includes_tasks() {
        let mut store = SessionStore::new();
        let id = store.create(QueryRequest::new("q")).session.id;
        let snapshot = store
            .apply(
                &id,
                &StreamUpdate::text("x").with_mutations(vec![TaskMutation::create(
                    "t1",
                    "Search",
                    TaskStatus::InProgress,
                )]),
            )
            .unwrap();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(snapshot.session.id, id);
        assert_eq!(store.snapshot(&id), Some(snapshot));
        assert!(store.snapshot("missing").is_none());
    }

    #[test]
    fn test_remove_drops_tasks() {
        let mut store = SessionStore::new();
        let id = store.create(QueryRequest::new("q")).session.id;
        store
            .apply(
                &id,
                &StreamUpdate::text("x").with_mutations(vec![TaskMutation::create(
                    "t1",
                    "Search",
                    TaskStatus::Pending,
                )]),
            )
            .unwrap();

        assert!(store.remove(&id).is_some());
        assert!(store.tasks(&id).is_empty());
        assert!(store.list().is_empty());
        assert!(store.remove(&id).is_none());
    }
}
