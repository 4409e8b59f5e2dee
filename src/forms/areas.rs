use std::collections::HashSet;

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::area::{AreaDraft, AreaStatus};
use crate::domain::slot::SlotPosition;
use crate::domain::types::{AreaName, Description};
use crate::forms::{FormError, field_error};

#[derive(Deserialize, Validate)]
/// Form data for creating or editing a parking area.
pub struct AreaForm {
    #[serde(default)]
    #[validate(
        custom(function = "crate::forms::required"),
        length(max = 100, message = "Area name is too long")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: String,
    #[validate(range(min = 1, max = 1000, message = "Total slots must be between 1 and 1000"))]
    pub total_slots: u32,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::areas::known_status"))]
    pub status: String,
}

fn parse_status(raw: &str) -> AreaStatus {
    match raw.trim() {
        "" => AreaStatus::Active,
        raw => AreaStatus::from(raw),
    }
}

pub fn known_status(value: &str) -> Result<(), ValidationError> {
    if let AreaStatus::Other(raw) = parse_status(value) {
        return Err(ValidationError::new("status").with_message(format!("Unknown status {raw}").into()));
    }
    Ok(())
}

impl TryFrom<AreaForm> for AreaDraft {
    type Error = FormError;

    fn try_from(form: AreaForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(AreaDraft {
            name: AreaName::new(form.name).map_err(|err| field_error("name", err))?,
            description: Description::new(form.description),
            total_slots: form.total_slots,
            status: parse_status(&form.status),
        })
    }
}

/// JSON body posted by the slot annotator.
#[derive(Debug, Deserialize, Validate)]
pub struct SavePositionsRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::areas::distinct_rectangles"))]
    pub positions: Vec<SlotPosition>,
}

/// Positions must have a positive size and distinct, non-negative slot
/// indexes.
pub fn distinct_rectangles(positions: &[SlotPosition]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for position in positions {
        if position.width == 0 || position.height == 0 {
            return Err(ValidationError::new("positions").with_message(
                format!("Slot {} has an empty rectangle", position.index).into(),
            ));
        }
        if position.index < 0 || !seen.insert(position.index) {
            return Err(ValidationError::new("positions").with_message(
                format!("Slot index {} is invalid or repeated", position.index).into(),
            ));
        }
    }
    Ok(())
}

impl SavePositionsRequest {
    pub fn into_positions(self) -> Result<Vec<SlotPosition>, FormError> {
        self.validate()?;
        Ok(self.positions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_form_defaults_to_active() {
        let draft = AreaDraft::try_from(AreaForm {
            name: " North Lot ".into(),
            description: "<b>Open</b> 24h".into(),
            total_slots: 12,
            status: String::new(),
        })
        .expect("valid area");
        assert_eq!(draft.name.as_str(), "North Lot");
        assert_eq!(draft.status, AreaStatus::Active);
        assert_eq!(draft.description.as_str(), "<b>Open</b> 24h");
    }

    #[test]
    fn area_form_rejects_zero_slots_and_unknown_status() {
        let err = AreaDraft::try_from(AreaForm {
            name: "North Lot".into(),
            description: String::new(),
            total_slots: 0,
            status: "active".into(),
        })
        .expect_err("zero slots");
        assert_eq!(err.to_string(), "Total slots must be between 1 and 1000");

        let err = AreaDraft::try_from(AreaForm {
            name: "North Lot".into(),
            description: String::new(),
            total_slots: 5,
            status: "closed".into(),
        })
        .expect_err("unknown status");
        assert_eq!(err.to_string(), "Unknown status closed");
    }

    #[test]
    fn positions_reject_duplicates() {
        let request: SavePositionsRequest =
            serde_json::from_str(r#"{"positions":[[0,0,1,10,10],[20,0,1,10,10]]}"#).unwrap();
        assert!(request.into_positions().is_err());

        let request: SavePositionsRequest =
            serde_json::from_str(r#"{"positions":[[0,0,1,10,10],[20,0,2,10,10]]}"#).unwrap();
        assert_eq!(request.into_positions().unwrap().len(), 2);

        let request: SavePositionsRequest =
            serde_json::from_str(r#"{"positions":[[0,0,1,0,10]]}"#).unwrap();
        assert_eq!(
            request.into_positions().unwrap_err().to_string(),
            "Slot 1 has an empty rectangle"
        );
    }

    #[test]
    fn blank_area_name_is_required() {
        let err = AreaDraft::try_from(AreaForm {
            name: "  ".into(),
            description: String::new(),
            total_slots: 4,
            status: String::new(),
        })
        .expect_err("blank name");
        assert_eq!(err.to_string(), "Please fill in all required fields");
    }
}
