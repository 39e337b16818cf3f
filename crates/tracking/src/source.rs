use async_trait::async_trait;
use model::tracking::TrackingSnapshot;
use tokio_util::sync::CancellationToken;

use crate::FetchError;

/// One network round trip for the current tracking snapshot of an
/// order. Implementations must resolve to [`FetchError::Cancelled`]
/// when the token fires mid-flight instead of surfacing some unrelated
/// error.
///
/// Which source a session talks to (live backend, mock) is decided by
/// whoever constructs the session, not by a process-wide switch.
#[async_trait]
pub trait TrackingSource: Send + Sync + 'static {
    async fn fetch_snapshot(
        &self,
        order_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TrackingSnapshot, FetchError>;
}
