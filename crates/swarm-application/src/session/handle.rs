use swarm_core::SwarmError;
use swarm_core::error::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a session driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The stream ended and the session is COMPLETED.
    Completed,
    /// The provider failed and the session is FAILED.
    Failed,
    /// Consumption stopped early; committed state was left as is.
    Cancelled,
}

/// Handle to a running session driver.
///
/// Dropping the handle does not stop the driver; call [`cancel`](Self::cancel).
pub struct SessionHandle {
    session_id: String,
    token: CancellationToken,
    join: JoinHandle<DriveOutcome>,
}

impl SessionHandle {
    pub(crate) fn new(
        session_id: String,
        token: CancellationToken,
        join: JoinHandle<DriveOutcome>,
    ) -> Self {
        Self {
            session_id,
            token,
            join,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Stops consuming the session's stream.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// A token that cancels this session when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Waits for the driver to stop.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the driver task panicked.
    pub async fn wait(self) -> Result<DriveOutcome> {
        self.join.await.map_err(|err| {
            SwarmError::internal(format!(
                "Driver for session {} stopped abnormally: {}",
                self.session_id, err
            ))
        })
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
