use std::time::Duration;

use model::order::AgentKind;
use model::tracking::TrackingSnapshot;
use tracking::mock::MockSource;
use tracking::render::{MapCanvas, PolylineStyle};
use tracking::session::{self, SessionConfig};
use utility::geo::{LatLng, LatLngBounds};

/// Prints every map mutation instead of drawing it.
struct ConsoleCanvas;

impl MapCanvas for ConsoleCanvas {
    type Polyline = Vec<LatLng>;
    type Marker = LatLng;

    fn draw_polyline(&self, path: &[LatLng], style: &PolylineStyle) -> Vec<LatLng> {
        println!(
            "draw polyline with {} points ({} / {})",
            path.len(),
            style.stroke_color,
            style.stroke_weight
        );
        path.to_vec()
    }

    fn remove_polyline(&self, polyline: Vec<LatLng>) {
        println!("remove polyline with {} points", polyline.len());
    }

    fn create_marker(&self, position: LatLng, agent: Option<AgentKind>) -> LatLng {
        println!("create {:?} marker at {:?}", agent, position);
        position
    }

    fn move_marker(&self, marker: &mut LatLng, position: LatLng) {
        println!("move marker {:?} -> {:?}", marker, position);
        *marker = position;
    }

    fn fit_viewport(&self, bounds: LatLngBounds) {
        println!("fit viewport to {:?}", bounds);
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let route = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";
    let source = MockSource::new(
        vec![
            TrackingSnapshot {
                order_id: "ORD-1001".to_owned(),
                encoded_route: Some(route.to_owned()),
                position: Some(LatLng::new(38.5, -120.2)),
            },
            TrackingSnapshot {
                order_id: "ORD-1001".to_owned(),
                encoded_route: Some(route.to_owned()),
                position: Some(LatLng::new(40.7, -120.95)),
            },
            TrackingSnapshot {
                order_id: "ORD-1001".to_owned(),
                encoded_route: Some(route.to_owned()),
                position: Some(LatLng::new(43.252, -126.453)),
            },
        ],
        Duration::from_millis(800),
    );

    let handle = session::start(
        "ORD-1001",
        SessionConfig {
            poll_interval: Duration::from_secs(2),
            agent: Some(AgentKind::Robot),
            ..SessionConfig::default()
        },
        source,
        ConsoleCanvas,
    );

    tokio::time::sleep(Duration::from_secs(7)).await;
    handle.stopped().await;
}
