//! The live tracking endpoint: one GET per poll, plus the
//! normalization shim for the backend's drifting field names.
//!
//! The backend has shipped `encoded_route`, `encodedRoute`,
//! `robot_route` and `robotRoute` for the same field over time, and
//! the position either flat (`lat`/`lng`) or nested under
//! `position`/`current_location`. No authoritative schema exists, so
//! all observed shapes are accepted indefinitely; anything else is
//! logged and degrades to an empty snapshot.

use async_trait::async_trait;
use model::tracking::TrackingSnapshot;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracking::source::TrackingSource;
use tracking::FetchError;
use utility::geo::LatLng;

use crate::client::DispatchApiClient;
use crate::ApiError;

pub const TRACKING_ENDPOINT: &str = "dashboard/orders/tracking";

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(alias = "orderId")]
    order_id: Option<String>,
    #[serde(
        alias = "encodedRoute",
        alias = "robot_route",
        alias = "robotRoute",
        alias = "route"
    )]
    encoded_route: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    #[serde(alias = "current_location", alias = "currentLocation")]
    position: Option<LatLng>,
}

impl RawSnapshot {
    fn normalize(self, requested_order_id: &str) -> TrackingSnapshot {
        let position = match (self.lat, self.lng, self.position) {
            (Some(lat), Some(lng), _) => Some(LatLng::new(lat, lng)),
            (_, _, nested) => nested,
        };
        let snapshot = TrackingSnapshot {
            order_id: self.order_id.unwrap_or_else(|| requested_order_id.to_owned()),
            encoded_route: self.encoded_route,
            position,
        };
        if snapshot.is_empty() {
            log::warn!(
                "tracking response for {} matched no known shape, treating as empty",
                requested_order_id
            );
        }
        snapshot
    }
}

impl DispatchApiClient {
    /// Fetches the current tracking snapshot for one order.
    pub async fn get_tracking(&self, order_id: &str) -> Result<TrackingSnapshot, ApiError> {
        let raw: RawSnapshot = self.get(TRACKING_ENDPOINT, &[("id", order_id)]).await?;
        Ok(raw.normalize(order_id))
    }
}

#[async_trait]
impl TrackingSource for DispatchApiClient {
    async fn fetch_snapshot(
        &self,
        order_id: &str,
        cancel: &CancellationToken,
    ) -> Result<TrackingSnapshot, FetchError> {
        tokio::select! {
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.get_tracking(order_id) => result.map_err(FetchError::from),
        }
    }
}
