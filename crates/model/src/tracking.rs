use serde::{Deserialize, Serialize};
use utility::geo::LatLng;

use crate::order::AgentKind;

/// One poll's normalized tracking result for an order.
///
/// A snapshot with a position but no route is a valid marker-only
/// update. One with neither is the empty snapshot and is treated as a
/// failed poll by the session.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub order_id: String,
    pub encoded_route: Option<String>,
    pub position: Option<LatLng>,
}

impl TrackingSnapshot {
    pub fn is_empty(&self) -> bool {
        self.encoded_route.is_none() && self.position.is_none()
    }
}

/// A priced route offer for one agent kind.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuote {
    pub price: Option<f64>,
    #[serde(alias = "estimatedMinutes", alias = "duration_minutes")]
    pub estimated_minutes: Option<f64>,
    #[serde(alias = "encodedPolyline", alias = "encoded_route")]
    pub encoded_polyline: Option<String>,
}

/// Backend answer to a delivery-options request: one quote per agent
/// kind that can serve the shipment.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOptions {
    #[serde(alias = "robotRoute", alias = "robot_route")]
    pub robot: Option<RouteQuote>,
    #[serde(alias = "droneRoute", alias = "drone_route")]
    pub drone: Option<RouteQuote>,
}

impl DeliveryOptions {
    pub fn quote_for(&self, agent: AgentKind) -> Option<&RouteQuote> {
        match agent {
            AgentKind::Robot => self.robot.as_ref(),
            AgentKind::Drone => self.drone.as_ref(),
        }
    }
}
