//! The seam between sessions and whatever produces their updates.

use async_trait::async_trait;
use futures::stream::BoxStream;
use swarm_core::session::{QueryRequest, SessionFailure, StreamUpdate};

/// Ordered updates for one request. The stream ends after an update with
/// `is_final` set or after the first error; dropping it cancels the
/// underlying request.
pub type UpdateStream = BoxStream<'static, Result<StreamUpdate, SessionFailure>>;

/// Produces a stream of cumulative updates for a query.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Opens a stream for `request`.
    ///
    /// # Errors
    ///
    /// Returns a failure when the request cannot be started at all
    /// (credentials, rejected request, unreachable backend).
    async fn open(&self, request: &QueryRequest) -> Result<UpdateStream, SessionFailure>;
}
