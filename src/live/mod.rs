//! Live occupancy feed.
//!
//! A single listener task per process keeps the Socket.IO connection to the
//! detection service and publishes every `update_slots` event into a
//! [`LiveFeed`]. Live screens subscribe to the feed for as long as their event
//! stream is open.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::domain::occupancy::{OccupancySnapshot, SlotUpdate};

pub mod listener;
pub mod protocol;

#[derive(Clone)]
pub struct LiveFeed {
    sender: Arc<watch::Sender<OccupancySnapshot>>,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveFeed {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(OccupancySnapshot::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Current state, cloned out of the channel.
    pub fn snapshot(&self) -> OccupancySnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<OccupancySnapshot> {
        self.sender.subscribe()
    }

    pub fn apply(&self, update: SlotUpdate, received_at: DateTime<Utc>) {
        self.sender
            .send_modify(|snapshot| snapshot.apply(update, received_at));
    }

    pub fn set_connected(&self, connected: bool) {
        self.sender.send_if_modified(|snapshot| {
            let changed = snapshot.connected != connected;
            snapshot.connected = connected;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_see_latest_update() {
        let feed = LiveFeed::new();
        let mut receiver = feed.subscribe();

        feed.apply(
            SlotUpdate {
                free_slots: vec![2, 3],
                ..SlotUpdate::default()
            },
            Utc::now(),
        );
        feed.apply(
            SlotUpdate {
                free_slots: vec![9],
                ..SlotUpdate::default()
            },
            Utc::now(),
        );

        assert!(receiver.has_changed().unwrap());
        let seen = receiver.borrow_and_update().clone();
        assert_eq!(seen.free_slots, vec![9]);
        assert_eq!(seen.updates_received, 2);
    }

    #[test]
    fn connection_flag_only_notifies_on_change() {
        let feed = LiveFeed::new();
        let receiver = feed.subscribe();

        feed.set_connected(false);
        assert!(!receiver.has_changed().unwrap());
        feed.set_connected(true);
        assert!(receiver.has_changed().unwrap());
        assert!(feed.snapshot().connected);
    }
}
