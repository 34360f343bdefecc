//! Session service.
//!
//! Owns the session store and runs one driver task per submitted query.
//! A driver consumes its provider stream strictly in order and commits every
//! update through the store, which is the only place session state changes.

use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use swarm_core::SwarmError;
use swarm_core::error::Result;
use swarm_core::session::{
    QueryRequest, Session, SessionFailure, SessionSnapshot, SessionStore, StreamUpdate,
};
use swarm_interaction::StreamProvider;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::session::{DriveOutcome, SessionHandle, SnapshotSubscribers};

struct ServiceInner<P> {
    provider: P,
    store: RwLock<SessionStore>,
    /// Cancellation tokens of running drivers, by session id
    drivers: Mutex<HashMap<String, CancellationToken>>,
    subscribers: SnapshotSubscribers,
    shutdown: CancellationToken,
}

/// Submits queries and tracks the sessions they produce.
///
/// Cheap to clone; clones share the same store and drivers.
pub struct SessionService<P: StreamProvider + 'static> {
    inner: Arc<ServiceInner<P>>,
}

impl<P: StreamProvider + 'static> Clone for SessionService<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: StreamProvider + 'static> SessionService<P> {
    pub fn new(provider: P) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                provider,
                store: RwLock::new(SessionStore::new()),
                drivers: Mutex::new(HashMap::new()),
                subscribers: SnapshotSubscribers::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Creates a session for `request` and starts streaming into it.
    ///
    /// # Errors
    ///
    /// Returns `ShutDown` once [`SessionService::shutdown`] has been called.
    pub async fn submit(&self, request: QueryRequest) -> Result<SessionHandle> {
        if self.inner.shutdown.is_cancelled() {
            tracing::warn!("[SessionService] rejecting query, service is shut down");
            return Err(SwarmError::ShutDown);
        }

        let snapshot = self.inner.store.write().await.create(request.clone());
        let session_id = snapshot.session.id.clone();
        self.inner.subscribers.publish(snapshot).await;

        let token = self.inner.shutdown.child_token();
        self.inner
            .drivers
            .lock()
            .await
            .insert(session_id.clone(), token.clone());

        let inner = Arc::clone(&self.inner);
        let join = tokio::spawn(drive(inner, session_id.clone(), request, token.clone()));

        Ok(SessionHandle::new(session_id, token, join))
    }

    /// Submits the request of an earlier session again, as a new session.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session, `SessionActive` while
    /// the earlier session is still streaming and `ShutDown` after shutdown.
    pub async fn retry(&self, session_id: &str) -> Result<SessionHandle> {
        if self.is_active(session_id).await {
            return Err(SwarmError::SessionActive {
                id: session_id.to_string(),
            });
        }

        let request = self
            .inner
            .store
            .read()
            .await
            .request(session_id)
            .cloned()
            .ok_or_else(|| SwarmError::not_found("Session", session_id))?;

        tracing::info!("[SessionService] retrying session={}", session_id);
        self.submit(request).await
    }

    /// Stops the driver of a session. Returns `false` if none was running.
    pub async fn cancel(&self, session_id: &str) -> bool {
        match self.inner.drivers.lock().await.get(session_id) {
            Some(token) => {
                tracing::info!("[SessionService] cancelling session={}", session_id);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a driver is still consuming the session's stream.
    pub async fn is_active(&self, session_id: &str) -> bool {
        self.inner.drivers.lock().await.contains_key(session_id)
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.inner.store.read().await.snapshot(session_id)
    }

    /// All sessions, oldest first.
    pub async fn list(&self) -> Vec<Session> {
        self.inner
            .store
            .read()
            .await
            .list()
            .into_iter()
            .cloned()
            .collect()
    }

    /// Receives a snapshot after every committed change to any session.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<SessionSnapshot> {
        self.inner.subscribers.subscribe().await
    }

    /// Cancels every running driver. Later submissions are rejected.
    pub fn shutdown(&self) {
        tracing::info!("[SessionService] shutting down");
        self.inner.shutdown.cancel();
    }
}

async fn drive<P: StreamProvider>(
    inner: Arc<ServiceInner<P>>,
    session_id: String,
    request: QueryRequest,
    token: CancellationToken,
) -> DriveOutcome {
    let outcome = inner.run(&session_id, &request, &token).await;
    inner.drivers.lock().await.remove(&session_id);
    tracing::info!(
        "[SessionService] session={} driver stopped: {:?}",
        session_id,
        outcome
    );
    outcome
}

impl<P: StreamProvider> ServiceInner<P> {
    async fn run(
        &self,
        session_id: &str,
        request: &QueryRequest,
        token: &CancellationToken,
    ) -> DriveOutcome {
        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return DriveOutcome::Cancelled,
            opened = self.provider.open(request) => opened,
        };

        let mut updates = match opened {
            Ok(updates) => updates,
            Err(failure) => {
                self.fail(session_id, failure).await;
                return DriveOutcome::Failed;
            }
        };

        let mut last: Option<StreamUpdate> = None;
        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return DriveOutcome::Cancelled,
                next = updates.next() => next,
            };

            match next {
                Some(Ok(update)) => {
                    self.apply(session_id, &update).await;
                    if update.is_final {
                        return DriveOutcome::Completed;
                    }
                    last = Some(update);
                }
                Some(Err(failure)) => {
                    self.fail(session_id, failure).await;
                    return DriveOutcome::Failed;
                }
                None => {
                    tracing::debug!(
                        "[SessionService] session={} stream ended without a final update",
                        session_id
                    );
                    let closing = match last {
                        Some(update) => StreamUpdate {
                            task_mutations: Vec::new(),
                            ..update
                        },
                        None => StreamUpdate::default(),
                    };
                    self.apply(session_id, &closing.finalized()).await;
                    return DriveOutcome::Completed;
                }
            }
        }
    }

    async fn apply(&self, session_id: &str, update: &StreamUpdate) {
        let result = self.store.write().await.apply(session_id, update);
        self.publish(session_id, result).await;
    }

    async fn fail(&self, session_id: &str, failure: SessionFailure) {
        tracing::debug!("[SessionService] session={} provider failure: {}", session_id, failure);
        let result = self.store.write().await.fail(session_id, failure);
        self.publish(session_id, result).await;
    }

    async fn publish(&self, session_id: &str, result: Result<SessionSnapshot>) {
        match result {
            Ok(snapshot) => self.subscribers.publish(snapshot).await,
            Err(err) => tracing::error!(
                "[SessionService] could not commit to session={}: {}",
                session_id,
                err
            ),
        }
    }
}
