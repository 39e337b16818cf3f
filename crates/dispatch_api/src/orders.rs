//! Order CRUD and delivery-option quotes. One canonical client for
//! the snake_case backend contract.

use model::order::{NewOrder, Order};
use model::tracking::DeliveryOptions;
use serde::Serialize;
use utility::geo::LatLng;
use utility::{geo, polyline};

use crate::client::DispatchApiClient;
use crate::ApiError;

pub const ORDERS_ENDPOINT: &str = "orders";
pub const DELIVERY_OPTIONS_ENDPOINT: &str = "dashboard/orders/deliveryOptions";

/// Body for the delivery-options quote request, mirroring what the
/// dashboard sends after geocoding both addresses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOptionsRequest {
    pub from_address: String,
    pub to_address: String,
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
}

impl DeliveryOptionsRequest {
    pub fn new(
        from_address: impl Into<String>,
        to_address: impl Into<String>,
        from: LatLng,
        to: LatLng,
    ) -> Self {
        Self {
            from_address: from_address.into(),
            to_address: to_address.into(),
            from_lat: from.lat,
            from_lng: from.lng,
            to_lat: to.lat,
            to_lng: to.lng,
        }
    }
}

impl DispatchApiClient {
    pub async fn get_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.get(ORDERS_ENDPOINT, &[]).await
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        self.post(ORDERS_ENDPOINT, order).await
    }

    /// Asks the backend to quote both agent kinds for a shipment.
    pub async fn get_delivery_options(
        &self,
        request: &DeliveryOptionsRequest,
    ) -> Result<DeliveryOptions, ApiError> {
        let options: DeliveryOptions =
            self.post(DELIVERY_OPTIONS_ENDPOINT, request).await?;
        for (kind, quote) in [("robot", &options.robot), ("drone", &options.drone)] {
            let Some(quote) = quote else { continue };
            let Some(encoded) = &quote.encoded_polyline else {
                continue;
            };
            match polyline::decode(encoded) {
                Ok(points) => log::info!(
                    "{} quote: {:.1} km over {} points",
                    kind,
                    geo::route_length_km(&points),
                    points.len()
                ),
                Err(why) => {
                    log::warn!("{} quote carried an undecodable preview: {}", kind, why)
                }
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_request_serializes_the_dashboard_contract() {
        let request = DeliveryOptionsRequest::new(
            "123 Library St",
            "Dormitory Building A",
            LatLng::new(37.7749, -122.4194),
            LatLng::new(37.7849, -122.4094),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["fromAddress"], "123 Library St");
        assert_eq!(json["fromLat"], 37.7749);
        assert_eq!(json["toLng"], -122.4094);
    }
}
