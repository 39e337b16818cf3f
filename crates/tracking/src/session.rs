//! One tracking session per open tracking view: a single task that
//! owns the poll schedule, the in-flight request and the drawn
//! overlay for one order. Stopping the session tears all of it down;
//! nothing outlives the view.

use std::time::Duration;

use model::order::AgentKind;
use model::tracking::TrackingSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use utility::geo::LatLng;
use utility::polyline;

use crate::render::{MapCanvas, Overlay, PolylineStyle};
use crate::source::TrackingSource;
use crate::FetchError;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Fixed time between polls, for failures as well as successes.
    pub poll_interval: Duration,
    pub style: PolylineStyle,
    /// Which vehicle icon the marker gets, when the caller knows it.
    pub agent: Option<AgentKind>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            style: PolylineStyle::default(),
            agent: None,
        }
    }
}

/// Soft indicator for the surrounding UI. The render layer never sees
/// errors; this channel is the only place failures surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Connecting,
    Live,
    Degraded { consecutive_failures: u32 },
    Stopped,
}

/// Handle owned by the view. Dropping it does not stop the session;
/// call [`SessionHandle::stop`] on unmount.
pub struct SessionHandle {
    cancel: CancellationToken,
    status: watch::Receiver<SessionStatus>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Stops the session: cancels the pending timer, aborts the
    /// in-flight fetch and removes the overlay. Safe to call from any
    /// state, any number of times.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<SessionStatus> {
        self.status.clone()
    }

    /// Waits until the session task has fully wound down.
    pub async fn stopped(self) {
        self.stop();
        let _ = self.task.await;
    }
}

/// Spawns the poll loop for one order. The first fetch goes out
/// immediately; afterwards the session polls on the fixed interval
/// until stopped, treating every failure as transient.
pub fn start<S, C>(
    order_id: impl Into<String>,
    config: SessionConfig,
    source: S,
    canvas: C,
) -> SessionHandle
where
    S: TrackingSource,
    C: MapCanvas,
{
    let cancel = CancellationToken::new();
    let (status_tx, status_rx) = watch::channel(SessionStatus::Connecting);
    let overlay = Overlay::new(canvas, config.style.clone(), config.agent);
    let mut session = TrackingSession {
        order_id: order_id.into(),
        config,
        source,
        overlay,
        cancel: cancel.clone(),
        status: status_tx,
        decoded_route: None,
        consecutive_failures: 0,
    };
    let task = tokio::spawn(async move { session.run().await });
    SessionHandle {
        cancel,
        status: status_rx,
        task,
    }
}

struct TrackingSession<S, C>
where
    S: TrackingSource,
    C: MapCanvas,
{
    order_id: String,
    config: SessionConfig,
    source: S,
    overlay: Overlay<C>,
    cancel: CancellationToken,
    status: watch::Sender<SessionStatus>,
    /// Cache of the last decoded route, keyed by its encoded form.
    /// A byte-identical route string is not decoded again.
    decoded_route: Option<(String, Vec<LatLng>)>,
    consecutive_failures: u32,
}

impl<S, C> TrackingSession<S, C>
where
    S: TrackingSource,
    C: MapCanvas,
{
    async fn run(&mut self) {
        log::info!("tracking session for order {} started", self.order_id);
        loop {
            let result = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.source.fetch_snapshot(&self.order_id, &self.cancel) => {
                    result
                }
            };
            // A fetch that raced the stop signal must not touch the map.
            if self.cancel.is_cancelled() {
                break;
            }
            match result {
                Ok(snapshot) => self.on_snapshot(snapshot),
                Err(FetchError::Cancelled) => break,
                Err(why) => self.on_failure(why),
            }
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
        self.overlay.clear();
        let _ = self.status.send(SessionStatus::Stopped);
        log::info!("tracking session for order {} stopped", self.order_id);
    }

    fn on_snapshot(&mut self, snapshot: TrackingSnapshot) {
        if snapshot.is_empty() {
            // Neither route nor position: nothing to draw, keep the
            // previous overlay and count it against the status.
            self.consecutive_failures += 1;
            log::warn!(
                "order {}: snapshot had neither route nor position",
                self.order_id
            );
            let _ = self.status.send(SessionStatus::Degraded {
                consecutive_failures: self.consecutive_failures,
            });
            return;
        }
        if let Some(encoded) = snapshot.encoded_route {
            let cached = self
                .decoded_route
                .as_ref()
                .is_some_and(|(previous, _)| *previous == encoded);
            if !cached {
                match polyline::decode(&encoded) {
                    Ok(points) => self.decoded_route = Some((encoded, points)),
                    Err(why) => {
                        // Undecodable route: drop it, keep whatever
                        // route is already drawn.
                        log::warn!(
                            "order {}: dropping undecodable route: {}",
                            self.order_id,
                            why
                        );
                    }
                }
            }
        }
        let route = self
            .decoded_route
            .as_ref()
            .map(|(encoded, points)| (encoded.as_str(), points.as_slice()));
        self.overlay.apply(route, snapshot.position);
        self.consecutive_failures = 0;
        let _ = self.status.send(SessionStatus::Live);
    }

    fn on_failure(&mut self, why: FetchError) {
        self.consecutive_failures += 1;
        log::warn!(
            "order {}: poll failed ({}), retrying in {:?}",
            self.order_id,
            why,
            self.config.poll_interval
        );
        let _ = self.status.send(SessionStatus::Degraded {
            consecutive_failures: self.consecutive_failures,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::render::recording::{CanvasEvent, RecordingCanvas};

    const R1: &str = "_p~iF~ps|U_ulLnnqC";

    fn snapshot(route: Option<&str>, position: Option<LatLng>) -> TrackingSnapshot {
        TrackingSnapshot {
            order_id: "ORD-1001".to_owned(),
            encoded_route: route.map(str::to_owned),
            position,
        }
    }

    /// Plays back scripted poll results; once the script runs out it
    /// blocks until the session is stopped.
    struct ScriptedSource {
        polls: Mutex<VecDeque<Result<TrackingSnapshot, FetchError>>>,
    }

    impl ScriptedSource {
        fn new(polls: Vec<Result<TrackingSnapshot, FetchError>>) -> Self {
            Self {
                polls: Mutex::new(polls.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl TrackingSource for ScriptedSource {
        async fn fetch_snapshot(
            &self,
            _order_id: &str,
            cancel: &CancellationToken,
        ) -> Result<TrackingSnapshot, FetchError> {
            let next = self.polls.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => {
                    cancel.cancelled().await;
                    Err(FetchError::Cancelled)
                }
            }
        }
    }

    /// Ignores cancellation and resolves successfully only after the
    /// session has already been stopped.
    struct ResolvesAfterStop;

    #[async_trait]
    impl TrackingSource for ResolvesAfterStop {
        async fn fetch_snapshot(
            &self,
            order_id: &str,
            cancel: &CancellationToken,
        ) -> Result<TrackingSnapshot, FetchError> {
            cancel.cancelled().await;
            let mut late = snapshot(Some(R1), Some(LatLng::new(40.7128, -74.006)));
            late.order_id = order_id.to_owned();
            Ok(late)
        }
    }

    async fn next_status(rx: &mut watch::Receiver<SessionStatus>) -> SessionStatus {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    fn count(events: &Arc<Mutex<Vec<CanvasEvent>>>, kind: fn(&CanvasEvent) -> bool) -> usize {
        events.lock().unwrap().iter().filter(|e| kind(e)).count()
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_route_draws_once_and_moves_the_marker() {
        let p1 = LatLng::new(40.7128, -74.006);
        let p2 = LatLng::new(40.7130, -74.005);
        let source = ScriptedSource::new(vec![
            Ok(snapshot(Some(R1), Some(p1))),
            Ok(snapshot(Some(R1), Some(p2))),
        ]);
        let (canvas, events) = RecordingCanvas::new();
        let handle = start("ORD-1001", SessionConfig::default(), source, canvas);
        let mut status = handle.watch_status();

        assert_eq!(next_status(&mut status).await, SessionStatus::Live);
        assert_eq!(next_status(&mut status).await, SessionStatus::Live);

        assert_eq!(
            count(&events, |e| matches!(e, CanvasEvent::DrawPolyline { .. })),
            1
        );
        assert_eq!(
            count(&events, |e| matches!(e, CanvasEvent::CreateMarker { .. })),
            1
        );
        assert_eq!(
            count(&events, |e| matches!(e, CanvasEvent::MoveMarker { .. })),
            1
        );
        {
            let events = events.lock().unwrap();
            assert!(events.iter().any(|e| matches!(
                e,
                CanvasEvent::CreateMarker { position, .. } if *position == p1
            )));
            assert!(events.iter().any(|e| matches!(
                e,
                CanvasEvent::MoveMarker { position, .. } if *position == p2
            )));
        }

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_overlay_and_keeps_polling() {
        let p1 = LatLng::new(40.7128, -74.006);
        let p2 = LatLng::new(40.7130, -74.005);
        let source = ScriptedSource::new(vec![
            Ok(snapshot(Some(R1), Some(p1))),
            Err(FetchError::Network("connection reset".to_owned())),
            Ok(snapshot(Some(R1), Some(p2))),
        ]);
        let (canvas, events) = RecordingCanvas::new();
        let started_at = tokio::time::Instant::now();
        let handle = start("ORD-1001", SessionConfig::default(), source, canvas);
        let mut status = handle.watch_status();

        assert_eq!(next_status(&mut status).await, SessionStatus::Live);
        let after_success = events.lock().unwrap().len();
        assert_eq!(
            next_status(&mut status).await,
            SessionStatus::Degraded {
                consecutive_failures: 1
            }
        );
        // The failure must not have touched the map.
        assert_eq!(events.lock().unwrap().len(), after_success);
        // Polling continued on the same interval and recovered: first
        // poll at t0, failed poll at t0+i, recovery at t0+2i.
        assert_eq!(next_status(&mut status).await, SessionStatus::Live);
        assert_eq!(
            started_at.elapsed(),
            2 * DEFAULT_POLL_INTERVAL,
            "retry must reuse the fixed interval"
        );
        assert_eq!(
            count(&events, |e| matches!(e, CanvasEvent::MoveMarker { .. })),
            1
        );
        assert_eq!(
            count(&events, |e| matches!(e, CanvasEvent::RemovePolyline { .. })),
            0
        );

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_snapshot_degrades_without_clearing() {
        let p1 = LatLng::new(40.7128, -74.006);
        let source = ScriptedSource::new(vec![
            Ok(snapshot(Some(R1), Some(p1))),
            Ok(snapshot(None, None)),
        ]);
        let (canvas, events) = RecordingCanvas::new();
        let handle = start("ORD-1001", SessionConfig::default(), source, canvas);
        let mut status = handle.watch_status();

        assert_eq!(next_status(&mut status).await, SessionStatus::Live);
        assert_eq!(
            next_status(&mut status).await,
            SessionStatus::Degraded {
                consecutive_failures: 1
            }
        );
        assert_eq!(
            count(&events, |e| matches!(e, CanvasEvent::RemovePolyline { .. })),
            0
        );

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_route_still_renders_the_position() {
        let p1 = LatLng::new(40.7128, -74.006);
        // Continuation bit never clears.
        let source = ScriptedSource::new(vec![Ok(snapshot(Some("_p~iF~ps|"), Some(p1)))]);
        let (canvas, events) = RecordingCanvas::new();
        let handle = start("ORD-1001", SessionConfig::default(), source, canvas);
        let mut status = handle.watch_status();

        assert_eq!(next_status(&mut status).await, SessionStatus::Live);
        assert_eq!(
            count(&events, |e| matches!(e, CanvasEvent::DrawPolyline { .. })),
            0
        );
        assert_eq!(
            count(&events, |e| matches!(e, CanvasEvent::CreateMarker { .. })),
            1
        );

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn tracking_snapshot_for_known_order_renders_route_and_position() {
        let position = LatLng::new(40.7128, -74.006);
        let source = ScriptedSource::new(vec![Ok(snapshot(Some("_p~iF~ps|U"), Some(position)))]);
        let (canvas, events) = RecordingCanvas::new();
        let handle = start("ORD-1001", SessionConfig::default(), source, canvas);
        let mut status = handle.watch_status();

        assert_eq!(next_status(&mut status).await, SessionStatus::Live);
        let events = events.lock().unwrap();
        assert!(events.iter().any(|e| matches!(
            e,
            CanvasEvent::DrawPolyline { points, .. } if !points.is_empty()
        )));
        assert!(events.iter().any(|e| matches!(
            e,
            CanvasEvent::CreateMarker { position: p, .. } if *p == position
        )));
        drop(events);

        handle.stopped().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_inflight_fetch_leaves_the_map_untouched() {
        let (canvas, events) = RecordingCanvas::new();
        let handle = start(
            "ORD-1001",
            SessionConfig::default(),
            ResolvesAfterStop,
            canvas,
        );
        // Let the session enter its first fetch.
        tokio::task::yield_now().await;
        handle.stop();
        handle.stopped().await;
        // The late Ok result must not have been applied.
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_removes_the_overlay() {
        let p1 = LatLng::new(40.7128, -74.006);
        let source = ScriptedSource::new(vec![Ok(snapshot(Some(R1), Some(p1)))]);
        let (canvas, events) = RecordingCanvas::new();
        let handle = start("ORD-1001", SessionConfig::default(), source, canvas);
        let mut status = handle.watch_status();

        assert_eq!(next_status(&mut status).await, SessionStatus::Live);
        handle.stop();
        handle.stop();
        handle.stopped().await;

        assert_eq!(*status.borrow_and_update(), SessionStatus::Stopped);
        let events = events.lock().unwrap();
        // Teardown removed the polyline, and nothing was drawn after.
        assert!(matches!(
            events.last(),
            Some(CanvasEvent::RemovePolyline { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn two_sessions_do_not_share_overlays() {
        let p1 = LatLng::new(40.7128, -74.006);
        let source_a = ScriptedSource::new(vec![Ok(snapshot(Some(R1), Some(p1)))]);
        let source_b = ScriptedSource::new(vec![Ok(snapshot(Some(R1), Some(p1)))]);
        let (canvas_a, events_a) = RecordingCanvas::new();
        let (canvas_b, events_b) = RecordingCanvas::new();
        let handle_a = start("ORD-1", SessionConfig::default(), source_a, canvas_a);
        let handle_b = start("ORD-2", SessionConfig::default(), source_b, canvas_b);
        let mut status_a = handle_a.watch_status();
        let mut status_b = handle_b.watch_status();

        assert_eq!(next_status(&mut status_a).await, SessionStatus::Live);
        assert_eq!(next_status(&mut status_b).await, SessionStatus::Live);
        handle_a.stopped().await;
        // Stopping one session leaves the other's overlay in place.
        assert_eq!(
            count(&events_b, |e| matches!(
                e,
                CanvasEvent::RemovePolyline { .. }
            )),
            0
        );
        handle_b.stopped().await;
        assert_eq!(
            count(&events_a, |e| matches!(e, CanvasEvent::DrawPolyline { .. })),
            1
        );
    }
}
