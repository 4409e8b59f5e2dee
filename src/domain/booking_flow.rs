//! Booking dialog state machine.
//!
//! `Selecting -> Confirming -> Submitting -> Success | Failure`. A failure
//! returns to `Confirming` on retry, and dismissing a success starts over with
//! nothing selected. The whole value lives in the user's session between
//! requests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::slot::ParkingSlot;
use crate::domain::types::{AreaId, BookingId, SlotId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("Please select a parking slot")]
    NoSlotSelected,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: &'static str,
        action: &'static str,
    },
}

/// The slot the user picked on the grid.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedSlot {
    pub slot_id: SlotId,
    pub area_id: AreaId,
    pub slot_number: String,
}

impl From<&ParkingSlot> for SelectedSlot {
    fn from(slot: &ParkingSlot) -> Self {
        Self {
            slot_id: slot.id,
            area_id: slot.area_id,
            slot_number: slot.slot_number.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BookingFlow {
    Selecting { selected: Option<SelectedSlot> },
    Confirming { slot: SelectedSlot },
    Submitting { slot: SelectedSlot },
    Success { reference: BookingId },
    Failure { slot: SelectedSlot, message: String },
}

impl Default for BookingFlow {
    fn default() -> Self {
        BookingFlow::Selecting { selected: None }
    }
}

impl BookingFlow {
    pub fn state_name(&self) -> &'static str {
        match self {
            BookingFlow::Selecting { .. } => "selecting",
            BookingFlow::Confirming { .. } => "confirming",
            BookingFlow::Submitting { .. } => "submitting",
            BookingFlow::Success { .. } => "success",
            BookingFlow::Failure { .. } => "failure",
        }
    }

    fn invalid(&self, action: &'static str) -> FlowError {
        FlowError::InvalidTransition {
            state: self.state_name(),
            action,
        }
    }

    /// Slot currently picked, in any state that carries one.
    pub fn selected(&self) -> Option<&SelectedSlot> {
        match self {
            BookingFlow::Selecting { selected } => selected.as_ref(),
            BookingFlow::Confirming { slot }
            | BookingFlow::Submitting { slot }
            | BookingFlow::Failure { slot, .. } => Some(slot),
            BookingFlow::Success { .. } => None,
        }
    }

    pub fn is_dialog_open(&self) -> bool {
        matches!(
            self,
            BookingFlow::Confirming { .. }
                | BookingFlow::Submitting { .. }
                | BookingFlow::Failure { .. }
        )
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            BookingFlow::Failure { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<BookingId> {
        match self {
            BookingFlow::Success { reference } => Some(*reference),
            _ => None,
        }
    }

    /// Picks `slot`. Returns `Ok(false)` without touching the state when the
    /// slot is not available.
    pub fn select_slot(&mut self, slot: &ParkingSlot) -> Result<bool, FlowError> {
        let BookingFlow::Selecting { selected } = self else {
            return Err(self.invalid("select a slot"));
        };
        if !slot.is_selectable() {
            return Ok(false);
        }
        *selected = Some(SelectedSlot::from(slot));
        Ok(true)
    }

    pub fn open_confirmation(&mut self) -> Result<(), FlowError> {
        match self {
            BookingFlow::Selecting { selected: None } => Err(FlowError::NoSlotSelected),
            BookingFlow::Selecting {
                selected: Some(slot),
            } => {
                *self = BookingFlow::Confirming { slot: slot.clone() };
                Ok(())
            }
            _ => Err(self.invalid("open the booking dialog")),
        }
    }

    /// Closes the dialog and clears the selection.
    pub fn close_dialog(&mut self) -> Result<(), FlowError> {
        match self {
            BookingFlow::Selecting { .. }
            | BookingFlow::Confirming { .. }
            | BookingFlow::Failure { .. } => {
                *self = BookingFlow::default();
                Ok(())
            }
            _ => Err(self.invalid("close the booking dialog")),
        }
    }

    /// Moves to `Submitting` and returns the slot being booked.
    pub fn begin_submit(&mut self) -> Result<SelectedSlot, FlowError> {
        match self {
            BookingFlow::Confirming { slot } => {
                let slot = slot.clone();
                *self = BookingFlow::Submitting { slot: slot.clone() };
                Ok(slot)
            }
            _ => Err(self.invalid("submit a booking")),
        }
    }

    pub fn succeed(&mut self, reference: BookingId) -> Result<(), FlowError> {
        match self {
            BookingFlow::Submitting { .. } => {
                *self = BookingFlow::Success { reference };
                Ok(())
            }
            _ => Err(self.invalid("complete a booking")),
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), FlowError> {
        match self {
            BookingFlow::Submitting { slot } => {
                *self = BookingFlow::Failure {
                    slot: slot.clone(),
                    message: message.into(),
                };
                Ok(())
            }
            _ => Err(self.invalid("fail a booking")),
        }
    }

    pub fn retry(&mut self) -> Result<(), FlowError> {
        match self {
            BookingFlow::Failure { slot, .. } => {
                *self = BookingFlow::Confirming { slot: slot.clone() };
                Ok(())
            }
            _ => Err(self.invalid("retry a booking")),
        }
    }

    pub fn dismiss_success(&mut self) -> Result<(), FlowError> {
        match self {
            BookingFlow::Success { .. } => {
                *self = BookingFlow::default();
                Ok(())
            }
            _ => Err(self.invalid("dismiss the confirmation")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::slot::SlotStatus;

    fn slot(id: i32, status: SlotStatus) -> ParkingSlot {
        ParkingSlot {
            id: SlotId::new(id).unwrap(),
            slot_number: format!("A{id}"),
            area_id: AreaId::new(1).unwrap(),
            status,
        }
    }

    #[test]
    fn selecting_unavailable_slot_is_noop() {
        let mut flow = BookingFlow::default();
        for status in [
            SlotStatus::Booked,
            SlotStatus::Reserved,
            SlotStatus::Broken,
            SlotStatus::Occupied,
            SlotStatus::Other("x".into()),
        ] {
            assert_eq!(flow.select_slot(&slot(2, status)), Ok(false));
            assert_eq!(flow, BookingFlow::default());
        }

        flow.select_slot(&slot(1, SlotStatus::Available)).unwrap();
        let before = flow.clone();
        assert_eq!(flow.select_slot(&slot(2, SlotStatus::Booked)), Ok(false));
        assert_eq!(flow, before);
    }

    #[test]
    fn confirmation_requires_selection() {
        let mut flow = BookingFlow::default();
        assert_eq!(flow.open_confirmation(), Err(FlowError::NoSlotSelected));
        assert_eq!(
            FlowError::NoSlotSelected.to_string(),
            "Please select a parking slot"
        );
    }

    #[test]
    fn full_cycle_with_failure_and_retry() {
        let mut flow = BookingFlow::default();
        flow.select_slot(&slot(1, SlotStatus::Available)).unwrap();
        flow.open_confirmation().unwrap();
        assert!(flow.is_dialog_open());

        let picked = flow.begin_submit().unwrap();
        assert_eq!(picked.slot_id.get(), 1);
        flow.fail("Slot already taken").unwrap();
        assert_eq!(flow.error_message(), Some("Slot already taken"));
        assert_eq!(flow.selected().map(|s| s.slot_id.get()), Some(1));

        flow.retry().unwrap();
        assert_eq!(flow.state_name(), "confirming");
        flow.begin_submit().unwrap();
        flow.succeed(BookingId::new(42).unwrap()).unwrap();
        assert_eq!(flow.reference().map(BookingId::get), Some(42));

        flow.dismiss_success().unwrap();
        assert_eq!(flow, BookingFlow::default());
    }

    #[test]
    fn invalid_transitions_leave_state_unchanged() {
        let mut flow = BookingFlow::default();
        flow.select_slot(&slot(1, SlotStatus::Available)).unwrap();
        flow.open_confirmation().unwrap();
        flow.begin_submit().unwrap();
        let before = flow.clone();

        assert!(flow.close_dialog().is_err());
        assert!(flow.retry().is_err());
        assert!(flow.dismiss_success().is_err());
        assert!(flow.select_slot(&slot(3, SlotStatus::Available)).is_err());
        assert_eq!(flow, before);
    }

    #[test]
    fn closing_dialog_clears_selection() {
        let mut flow = BookingFlow::default();
        flow.select_slot(&slot(1, SlotStatus::Available)).unwrap();
        flow.open_confirmation().unwrap();
        flow.close_dialog().unwrap();
        assert_eq!(flow.selected(), None);
    }

    #[test]
    fn flow_survives_session_round_trip() {
        let mut flow = BookingFlow::default();
        flow.select_slot(&slot(1, SlotStatus::Available)).unwrap();
        let json = serde_json::to_string(&flow).unwrap();
        assert!(json.contains(r#""state":"selecting""#));
        let restored: BookingFlow = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, flow);
    }
}
