//! Location tracking state machine
//!
//! Platform callbacks (new fixes, authorization changes, provider errors)
//! are funnelled into one ordered stream of [`TrackerEvent`]s that the rest
//! of the client consumes.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::mapper::LocationFix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::AuthorizedAlways | AuthorizationStatus::AuthorizedWhenInUse
        )
    }

    pub fn is_refused(&self) -> bool {
        matches!(
            self,
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Location access has not been authorized")]
    AuthorizationDenied,

    #[error("Location could not be determined")]
    LocationUnknown,

    #[error("Network was unavailable")]
    Network,

    #[error("Location provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    LocationUpdated(LocationFix),
    AuthorizationChanged(AuthorizationStatus),
    Failed(TrackerError),
}

pub struct LocationTracker {
    events: mpsc::UnboundedSender<TrackerEvent>,
    tracking: bool,
    authorization: Option<AuthorizationStatus>,
}

impl LocationTracker {
    /// A tracker and the receiving end of its event stream
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TrackerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let tracker = Self {
            events,
            tracking: false,
            authorization: None,
        };
        (tracker, receiver)
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking
    }

    pub fn authorization(&self) -> Option<AuthorizationStatus> {
        self.authorization
    }

    pub fn start_tracking(&mut self) {
        info!("Location tracking started");
        self.tracking = true;
    }

    pub fn stop_tracking(&mut self) {
        info!("Location tracking stopped");
        self.tracking = false;
    }

    /// Provider delivered one or more fixes, oldest first. Only the newest
    /// is forwarded.
    pub fn locations_delivered(&mut self, fixes: &[LocationFix]) {
        if !self.tracking {
            debug!("Dropping {} fixes delivered while stopped", fixes.len());
            return;
        }
        if let Some(latest) = fixes.last() {
            self.emit(TrackerEvent::LocationUpdated(latest.clone()));
        }
    }

    pub fn authorization_changed(&mut self, status: AuthorizationStatus) {
        if self.authorization == Some(status) {
            return;
        }
        self.authorization = Some(status);
        self.emit(TrackerEvent::AuthorizationChanged(status));

        if status.is_refused() {
            warn!("Location authorization refused: {:?}", status);
            self.emit(TrackerEvent::Failed(TrackerError::AuthorizationDenied));
        }
    }

    pub fn provider_failed(&mut self, error: TrackerError) {
        warn!("Location provider failed: {}", error);
        self.emit(TrackerEvent::Failed(error));
    }

    fn emit(&self, event: TrackerEvent) {
        if self.events.send(event).is_err() {
            debug!("Tracker event dropped, no consumer attached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(latitude: f64) -> LocationFix {
        LocationFix::new(
            latitude,
            139.7671,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        )
    }

    fn drain(receiver: &mut mpsc::UnboundedReceiver<TrackerEvent>) -> Vec<TrackerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_forwards_only_latest_fix() {
        let (mut tracker, mut events) = LocationTracker::channel();
        tracker.start_tracking();
        tracker.locations_delivered(&[fix(1.0), fix(2.0), fix(3.0)]);
        tracker.locations_delivered(&[]);

        assert_eq!(drain(&mut events), vec![TrackerEvent::LocationUpdated(fix(3.0))]);
    }

    #[test]
    fn test_drops_fixes_while_stopped() {
        let (mut tracker, mut events) = LocationTracker::channel();
        tracker.locations_delivered(&[fix(1.0)]);

        tracker.start_tracking();
        tracker.stop_tracking();
        tracker.locations_delivered(&[fix(2.0)]);

        assert!(drain(&mut events).is_empty());
    }

    #[test]
    fn test_repeated_authorization_suppressed() {
        let (mut tracker, mut events) = LocationTracker::channel();
        tracker.authorization_changed(AuthorizationStatus::NotDetermined);
        tracker.authorization_changed(AuthorizationStatus::AuthorizedWhenInUse);
        tracker.authorization_changed(AuthorizationStatus::AuthorizedWhenInUse);

        assert_eq!(
            drain(&mut events),
            vec![
                TrackerEvent::AuthorizationChanged(AuthorizationStatus::NotDetermined),
                TrackerEvent::AuthorizationChanged(AuthorizationStatus::AuthorizedWhenInUse),
            ]
        );
        assert_eq!(
            tracker.authorization(),
            Some(AuthorizationStatus::AuthorizedWhenInUse)
        );
    }

    #[test]
    fn test_denied_reports_failure_once() {
        let (mut tracker, mut events) = LocationTracker::channel();
        tracker.authorization_changed(AuthorizationStatus::Denied);
        tracker.authorization_changed(AuthorizationStatus::Denied);

        assert_eq!(
            drain(&mut events),
            vec![
                TrackerEvent::AuthorizationChanged(AuthorizationStatus::Denied),
                TrackerEvent::Failed(TrackerError::AuthorizationDenied),
            ]
        );
    }

    #[test]
    fn test_events_keep_callback_order() {
        let (mut tracker, mut events) = LocationTracker::channel();
        tracker.start_tracking();
        tracker.locations_delivered(&[fix(1.0)]);
        tracker.provider_failed(TrackerError::Network);
        tracker.locations_delivered(&[fix(2.0)]);

        assert_eq!(
            drain(&mut events),
            vec![
                TrackerEvent::LocationUpdated(fix(1.0)),
                TrackerEvent::Failed(TrackerError::Network),
                TrackerEvent::LocationUpdated(fix(2.0)),
            ]
        );
    }

    #[test]
    fn test_emitting_without_consumer_is_harmless() {
        let (mut tracker, events) = LocationTracker::channel();
        drop(events);
        tracker.start_tracking();
        tracker.locations_delivered(&[fix(1.0)]);
        assert!(tracker.is_tracking());
    }
}
