//! # Monitoring Feed
//!
//! Point-in-time snapshots of both services for an observability
//! collaborator, pulled with [`Monitor::snapshot`] or pushed to channel
//! subscribers with [`Monitor::publish`].
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │  Documents   │   │   Planning   │
//! └──────┬───────┘   └──────┬───────┘
//!        └───────┬──────────┘
//!                v
//!           ┌─────────┐  try_send   ┌──────────────┐
//!           │ Monitor │────────────>│ subscriber N │
//!           └─────────┘             └──────────────┘
//! ```
//!
//! Publishing never blocks: a full subscriber misses that snapshot, a
//! disconnected one is dropped.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use docpool_core::clock::{Clock, MonotonicClock};
use docpool_core::stats::{AllocatorStats, ArenaSummary};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ServiceResult;
use crate::service::{DocumentService, PlanningService};

/// State of both components at one instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Reading of the document service clock.
    pub at_ms: u64,
    /// Pool utilisation and counters.
    pub allocator: AllocatorStats,
    /// Arena occupancy.
    pub arena: ArenaSummary,
}

impl Snapshot {
    /// Renders the snapshot as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Serialize` if a value has no TOML representation.
    pub fn to_toml(&self) -> ServiceResult<String> {
        Ok(toml::to_string(self)?)
    }
}

/// Builds and distributes snapshots.
#[derive(Debug)]
pub struct Monitor<C: Clock = MonotonicClock> {
    documents: Arc<DocumentService<C>>,
    planning: Arc<PlanningService>,
    subscribers: Mutex<Vec<Sender<Snapshot>>>,
}

impl<C: Clock> Monitor<C> {
    /// Creates a monitor over two shared services.
    #[must_use]
    pub fn new(documents: Arc<DocumentService<C>>, planning: Arc<PlanningService>) -> Self {
        Self {
            documents,
            planning,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Takes a snapshot now.
    ///
    /// The two services are locked one after the other, never together.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            at_ms: self.documents.now_ms(),
            allocator: self.documents.stats(),
            arena: self.planning.summarize(),
        }
    }

    /// Registers a subscriber that buffers up to `capacity` snapshots.
    #[must_use]
    pub fn subscribe(&self, capacity: usize) -> Receiver<Snapshot> {
        let (sender, receiver) = bounded(capacity.max(1));
        let mut subscribers = self.subscribers.lock();
        subscribers.push(sender);
        info!("Monitor subscriber added ({} total)", subscribers.len());
        receiver
    }

    /// Number of connected subscribers (as of the last publish).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Takes a snapshot and offers it to every subscriber.
    ///
    /// Returns the number of subscribers that accepted it.
    pub fn publish(&self) -> usize {
        let snapshot = self.snapshot();
        let mut delivered = 0;
        let mut subscribers = self.subscribers.lock();

        subscribers.retain(|sender| match sender.try_send(snapshot.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!("Monitor subscriber lagging, snapshot skipped");
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                info!("Monitor subscriber disconnected");
                false
            }
        });

        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpool_core::clock::ManualClock;
    use docpool_core::config::{AllocatorConfig, ArenaConfig, PoolConfig};
    use docpool_core::priority::{Category, Urgency};

    fn monitor() -> (Monitor<ManualClock>, Arc<DocumentService<ManualClock>>, ManualClock) {
        let clock = ManualClock::new();
        let config = AllocatorConfig::new(
            vec![
                PoolConfig::new("working", 1000, true),
                PoolConfig::new("overflow", 1000, false),
            ],
            "overflow",
        );
        let documents = Arc::new(DocumentService::with_clock(config, clock.clone()).unwrap());
        let planning = Arc::new(PlanningService::new(ArenaConfig::new(16)).unwrap());
        (Monitor::new(Arc::clone(&documents), planning), documents, clock)
    }

    #[test]
    fn test_snapshot_reflects_services() {
        let (monitor, documents, clock) = monitor();
        documents
            .submit("a", Category::Evidence, Urgency::High, 0.5, 300)
            .unwrap();
        clock.advance(42);

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.at_ms, 42);
        assert_eq!(snapshot.allocator.pool("working").unwrap().used_bytes, 300);
        assert_eq!(snapshot.arena.capacity, 16);
        assert_eq!(snapshot.arena.free, 16);
    }

    #[test]
    fn test_publish_prunes_disconnected() {
        let (monitor, _, _) = monitor();
        let live = monitor.subscribe(4);
        let dropped = monitor.subscribe(4);
        drop(dropped);

        assert_eq!(monitor.publish(), 1);
        assert_eq!(monitor.subscriber_count(), 1);
        assert!(live.try_recv().is_ok());
    }

    #[test]
    fn test_full_subscriber_is_kept() {
        let (monitor, _, _) = monitor();
        let slow = monitor.subscribe(1);
        assert_eq!(monitor.publish(), 1);
        assert_eq!(monitor.publish(), 0);
        assert_eq!(monitor.subscriber_count(), 1);
        assert_eq!(slow.len(), 1);
    }

    #[test]
    fn test_snapshot_toml() {
        let (monitor, documents, _) = monitor();
        documents
            .submit("a", Category::Brief, Urgency::Low, 0.0, 10)
            .unwrap();
        let text = monitor.snapshot().to_toml().unwrap();
        assert!(text.contains("at_ms"));
        assert!(text.contains("working"));

        let parsed: Snapshot = toml::from_str(&text).unwrap();
        assert_eq!(parsed, monitor.snapshot());
    }
}
