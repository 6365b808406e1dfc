//! Ordered fan-out of mission telemetry to any number of observers.
//!
//! Records are immutable once published. Each subscriber gets its own
//! unbounded channel, so a slow or dead observer never blocks `publish` or
//! starves the others; a disconnected receiver is pruned on the next send.

use std::sync::{Arc, Mutex};

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use tracing::debug;

use crate::pathfinder::Route;
use crate::risk::RiskAssessment;
use crate::threat::Threat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordKind {
    MissionStarted,
    LegComplete,
    Reroute,
    MissionAborted,
    MissionComplete,
    Advisory,
}

/// One timestamped entry of the mission log. Append-only; consumers receive
/// a shared read-only view.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryRecord {
    pub tick: u64,
    pub sim_minutes: f64,
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Route>,
    pub risk: RiskAssessment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat: Option<Threat>,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

pub struct TelemetrySubscription {
    id: SubscriberId,
    receiver: Receiver<Arc<TelemetryRecord>>,
}

impl TelemetrySubscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn receiver(&self) -> &Receiver<Arc<TelemetryRecord>> {
        &self.receiver
    }

    /// Everything published since the last drain, in publish order.
    pub fn drain(&self) -> Vec<Arc<TelemetryRecord>> {
        self.receiver.try_iter().collect()
    }
}

#[derive(Default)]
struct StreamInner {
    next_id: u64,
    subscribers: Vec<(SubscriberId, Sender<Arc<TelemetryRecord>>)>,
    history: Vec<Arc<TelemetryRecord>>,
}

#[derive(Default)]
pub struct TelemetryStream {
    inner: Mutex<StreamInner>,
}

impl TelemetryStream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn subscribe(&self) -> TelemetrySubscription {
        let (tx, rx) = unbounded();
        let mut inner = self.inner.lock().expect("telemetry mutex poisoned");
        let id = SubscriberId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, tx));
        TelemetrySubscription { id, receiver: rx }
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut inner = self.inner.lock().expect("telemetry mutex poisoned");
        inner.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    pub fn publish(&self, record: TelemetryRecord) {
        let record = Arc::new(record);
        let mut inner = self.inner.lock().expect("telemetry mutex poisoned");
        inner.history.push(Arc::clone(&record));
        inner.subscribers.retain(|(id, tx)| {
            if tx.send(Arc::clone(&record)).is_ok() {
                true
            } else {
                debug!(subscriber = id.0, "telemetry.subscriber_dropped");
                false
            }
        });
    }

    /// Full mission log since stream creation.
    pub fn history(&self) -> Vec<Arc<TelemetryRecord>> {
        self.inner
            .lock()
            .expect("telemetry mutex poisoned")
            .history
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .expect("telemetry mutex poisoned")
            .history
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskAssessment;

    fn record(kind: RecordKind, tick: u64) -> TelemetryRecord {
        TelemetryRecord {
            tick,
            sim_minutes: tick as f64 * 15.0,
            kind,
            route: None,
            risk: RiskAssessment::default(),
            threat: None,
            note: String::new(),
        }
    }

    #[test]
    fn subscribers_see_records_in_publish_order() {
        let stream = TelemetryStream::new();
        let sub = stream.subscribe();
        stream.publish(record(RecordKind::MissionStarted, 0));
        stream.publish(record(RecordKind::LegComplete, 3));
        stream.publish(record(RecordKind::MissionComplete, 5));

        let ticks: Vec<u64> = sub.drain().iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![0, 3, 5]);
    }

    #[test]
    fn dropped_subscriber_does_not_affect_others() {
        let stream = TelemetryStream::new();
        let dead = stream.subscribe();
        let live = stream.subscribe();
        drop(dead);

        stream.publish(record(RecordKind::MissionStarted, 0));
        stream.publish(record(RecordKind::MissionComplete, 4));
        assert_eq!(live.drain().len(), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let stream = TelemetryStream::new();
        let sub = stream.subscribe();
        stream.publish(record(RecordKind::MissionStarted, 0));
        stream.unsubscribe(sub.id());
        stream.publish(record(RecordKind::MissionComplete, 4));
        assert_eq!(sub.drain().len(), 1);
    }

    #[test]
    fn history_is_append_only() {
        let stream = TelemetryStream::new();
        stream.publish(record(RecordKind::MissionStarted, 0));
        stream.publish(record(RecordKind::MissionAborted, 2));
        let history = stream.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].kind, RecordKind::MissionStarted);
        assert_eq!(history[1].kind, RecordKind::MissionAborted);
    }
}
