//! A tracking source that serves canned snapshots, for demos and UI
//! work without a backend.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use model::tracking::TrackingSnapshot;
use tokio_util::sync::CancellationToken;
use utility::geo::LatLng;

use crate::source::TrackingSource;
use crate::FetchError;

pub struct MockSource {
    snapshots: Mutex<Vec<TrackingSnapshot>>,
    latency: Duration,
}

impl MockSource {
    /// Serves the given snapshots in order, repeating the last one
    /// forever once the script runs out.
    pub fn new(snapshots: Vec<TrackingSnapshot>, latency: Duration) -> Self {
        Self {
            snapshots: Mutex::new(snapshots),
            latency,
        }
    }

    /// A stationary demo agent parked in lower Manhattan.
    pub fn stationary(order_id: &str) -> Self {
        Self::new(
            vec![TrackingSnapshot {
                order_id: order_id.to_owned(),
                encoded_route: Some("_p~iF~ps|U_ulLnnqC".to_owned()),
                position: Some(LatLng::new(40.7128, -74.006)),
            }],
            Duration::from_millis(800),
        )
    }

    fn next_snapshot(&self, order_id: &str) -> TrackingSnapshot {
        let mut snapshots = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
        let snapshot = if snapshots.len() > 1 {
            snapshots.remove(0)
        } else {
            snapshots.first().cloned().unwrap_or(TrackingSnapshot {
                order_id: order_id.to_owned(),
                encoded_route: None,
                position: None,
            })
        };
        log::debug!("mock snapshot for {}: {:?}", order_id, snapshot);
        snapshot
    }
}

#[async_trait]
impl TrackingSource for MockSource {
    async fn fetch_snapshot(
        &self,
        order_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TrackingSnapshot, FetchError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            _ = tokio::time::sleep(self.latency) => Ok(self.next_snapshot(order_id)),
        }
    }
}
