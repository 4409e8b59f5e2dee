use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload of the `update_slots` push event.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlotUpdate {
    #[serde(default)]
    pub free_slots: Vec<u32>,
    /// Annotated camera frame, base64 encoded.
    #[serde(default)]
    pub frame: Option<String>,
    /// Raw camera frame, base64 encoded.
    #[serde(default)]
    pub frame_original: Option<String>,
}

/// What the live screens currently show.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct OccupancySnapshot {
    pub free_slots: Vec<u32>,
    pub frame: Option<String>,
    pub frame_original: Option<String>,
    pub updates_received: u64,
    pub last_update_at: Option<DateTime<Utc>>,
    pub connected: bool,
}

impl OccupancySnapshot {
    /// Applies an event. The latest event always wins.
    pub fn apply(&mut self, update: SlotUpdate, received_at: DateTime<Utc>) {
        self.free_slots = update.free_slots;
        if let Some(frame) = update.frame {
            self.frame = Some(frame);
        }
        if let Some(frame) = update.frame_original {
            self.frame_original = Some(frame);
        }
        self.updates_received += 1;
        self.last_update_at = Some(received_at);
    }

    pub fn free_count(&self) -> usize {
        self.free_slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_replaces_free_slots_and_present_frames() {
        let now = Utc::now();
        let mut snapshot = OccupancySnapshot {
            free_slots: vec![1, 2, 3, 4],
            frame: Some("old".into()),
            frame_original: Some("old-raw".into()),
            ..OccupancySnapshot::default()
        };

        snapshot.apply(
            SlotUpdate {
                free_slots: vec![7],
                frame: Some("new".into()),
                frame_original: None,
            },
            now,
        );
        assert_eq!(snapshot.free_slots, vec![7]);
        assert_eq!(snapshot.free_count(), 1);
        assert_eq!(snapshot.frame.as_deref(), Some("new"));
        assert_eq!(snapshot.frame_original.as_deref(), Some("old-raw"));
        assert_eq!(snapshot.updates_received, 1);

        snapshot.apply(SlotUpdate::default(), now);
        assert!(snapshot.free_slots.is_empty());
        assert_eq!(snapshot.frame.as_deref(), Some("new"));
        assert_eq!(snapshot.updates_received, 2);
        assert_eq!(snapshot.last_update_at, Some(now));
    }

    #[test]
    fn payload_without_frames_parses() {
        let update: SlotUpdate = serde_json::from_str(r#"{"free_slots":[1,5]}"#).unwrap();
        assert_eq!(update.free_slots, vec![1, 5]);
        assert_eq!(update.frame, None);
    }
}
