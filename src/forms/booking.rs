use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::booking::{BookingExtension, BookingKind, NewBooking};
use crate::domain::booking_flow::SelectedSlot;
use crate::domain::pricing::{duration_for_hours, fee_for_hours, parse_duration_hours};
use crate::domain::slot::BookingWindow;
use crate::domain::types::{AreaId, DriverName, SlotId, TypeConstraintError, VehicleNumber};
use crate::forms::{FieldErrors, FormError, INVALID_HOURS, field_error, validate_all};

pub const SEARCH_INCOMPLETE: &str = "Please select parking area, date, and time.";
pub const DURATION_REQUIRED: &str = "Please enter how many hours you want to park.";

/// Home screen search: where, when and for how long to park.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Validate)]
pub struct SlotSearchForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub area_id: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub date: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub time: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::optional_duration_hours"))]
    pub hours: String,
}

/// Validated search: the slot grid is loaded for this area and window, and a
/// booking made from the grid covers exactly this window.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotSearch {
    pub area_id: AreaId,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub hours: Option<f64>,
    pub window: BookingWindow,
}

impl SlotSearch {
    pub fn fee(&self) -> u32 {
        self.hours.map_or(0, fee_for_hours)
    }

    /// Fails unless a duration with a non-zero fee has been chosen.
    pub fn require_duration(&self) -> Result<f64, FormError> {
        match self.hours {
            Some(hours) if self.fee() > 0 => Ok(hours),
            _ => {
                let mut fields = FieldErrors::new();
                fields.add("hours", DURATION_REQUIRED);
                Err(FormError::Invalid {
                    message: DURATION_REQUIRED.to_string(),
                    fields,
                })
            }
        }
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn search_incomplete(fields: FieldErrors) -> FormError {
    FormError::Invalid {
        message: SEARCH_INCOMPLETE.to_string(),
        fields,
    }
}

impl TryFrom<SlotSearchForm> for SlotSearch {
    type Error = FormError;

    fn try_from(form: SlotSearchForm) -> Result<Self, Self::Error> {
        if let Err(errors) = form.validate() {
            let fields = FieldErrors::from(&errors);
            let incomplete = ["area_id", "date", "time"]
                .iter()
                .any(|field| fields.get(field).is_some());
            return Err(if incomplete {
                search_incomplete(fields)
            } else {
                FormError::from(errors)
            });
        }

        let area_id = form
            .area_id
            .trim()
            .parse::<i32>()
            .ok()
            .and_then(|id| AreaId::new(id).ok());
        let date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d").ok();
        let time = parse_time(&form.time);

        let (Some(area_id), Some(date), Some(time)) = (area_id, date, time) else {
            return Err(search_incomplete(FieldErrors::new()));
        };
        let hours = parse_duration_hours(&form.hours);
        let window = BookingWindow::from_local(date, time, hours)
            .ok_or_else(|| search_incomplete(FieldErrors::new()))?;

        Ok(SlotSearch {
            area_id,
            date,
            time,
            hours,
            window,
        })
    }
}

#[derive(Deserialize)]
pub struct SelectSlotForm {
    pub slot_id: i32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    Card,
}

/// Booking dialog fields. Kept in the session as a draft so a failed attempt
/// can be retried with everything still filled in. The parking duration is
/// the one of the search the grid was loaded for.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Validate)]
pub struct BookingForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub vehicle_number: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub name: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub card_type: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_date: String,
    #[serde(default)]
    pub cvv: String,
    #[serde(default)]
    pub cardholder_name: String,
}

impl BookingForm {
    /// Draft stored in the session, without card secrets.
    pub fn draft(&self) -> BookingForm {
        BookingForm {
            card_number: String::new(),
            cvv: String::new(),
            ..self.clone()
        }
    }

    fn card_entry(&self) -> CardEntry {
        CardEntry {
            card_type: self.card_type.clone(),
            card_number: self.card_number.clone(),
            expiry_date: self.expiry_date.clone(),
            cvv: self.cvv.clone(),
            cardholder_name: self.cardholder_name.clone(),
        }
    }
}

/// Card fields of the dialog, all required when paying by card.
#[derive(Validate)]
struct CardEntry {
    #[validate(custom(function = "crate::forms::required"))]
    card_type: String,
    #[validate(custom(function = "crate::forms::required"))]
    card_number: String,
    #[validate(custom(function = "crate::forms::required"))]
    expiry_date: String,
    #[validate(custom(function = "crate::forms::required"))]
    cvv: String,
    #[validate(custom(function = "crate::forms::required"))]
    cardholder_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardDetails {
    pub card_type: String,
    pub card_number: String,
    pub expiry_date: String,
    pub cardholder_name: String,
}

impl CardEntry {
    /// Card details without the CVV, card number stripped of spaces.
    fn into_details(self) -> CardDetails {
        CardDetails {
            card_type: self.card_type.trim().to_string(),
            card_number: self
                .card_number
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
            expiry_date: self.expiry_date.trim().to_string(),
            cardholder_name: self.cardholder_name.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookingPayload {
    pub vehicle_number: VehicleNumber,
    pub driver_name: DriverName,
    pub payment_method: PaymentMethod,
    pub card: Option<CardDetails>,
}

impl TryFrom<BookingForm> for BookingPayload {
    type Error = FormError;

    fn try_from(form: BookingForm) -> Result<Self, Self::Error> {
        let card = (form.payment_method == PaymentMethod::Card).then(|| form.card_entry());
        match &card {
            Some(card) => validate_all(&[&form, card])?,
            None => validate_all(&[&form])?,
        }

        Ok(BookingPayload {
            vehicle_number: VehicleNumber::new(form.vehicle_number)
                .map_err(|err| field_error("vehicle_number", err))?,
            driver_name: DriverName::new(form.name).map_err(|err| field_error("name", err))?,
            payment_method: form.payment_method,
            card: card.map(CardEntry::into_details),
        })
    }
}

impl BookingPayload {
    /// Pre-booking of `slot` for the searched window, charged the fee the
    /// grid showed for it.
    pub fn into_domain(self, slot: &SelectedSlot, search: &SlotSearch) -> NewBooking {
        NewBooking {
            slot_id: slot.slot_id,
            area_id: slot.area_id,
            amount: search.fee(),
            vehicle_number: self.vehicle_number,
            start_time: search.window.start,
            end_time: search.window.end,
            kind: BookingKind::Pre,
        }
    }
}

/// Staff form registering a vehicle that is already parked.
#[derive(Deserialize, Validate)]
pub struct WalkInForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub area_id: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub slot_id: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::required"))]
    pub vehicle_number: String,
    #[serde(default)]
    #[validate(custom(function = "crate::forms::duration_hours"))]
    pub hours: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WalkInPayload {
    pub area_id: AreaId,
    pub slot_id: SlotId,
    pub vehicle_number: VehicleNumber,
    pub hours: f64,
}

fn parse_id<T>(
    field: &str,
    raw: &str,
    new: impl FnOnce(i32) -> Result<T, TypeConstraintError>,
) -> Result<T, FormError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| TypeConstraintError::InvalidValue(field.to_string()))
        .and_then(new)
        .map_err(|err| field_error(field, err))
}

fn hours_error(field: &str) -> FormError {
    let mut fields = FieldErrors::new();
    fields.add(field, INVALID_HOURS);
    FormError::from_fields(fields)
}

impl TryFrom<WalkInForm> for WalkInPayload {
    type Error = FormError;

    fn try_from(form: WalkInForm) -> Result<Self, Self::Error> {
        form.validate()?;
        Ok(WalkInPayload {
            area_id: parse_id("area_id", &form.area_id, AreaId::new)?,
            slot_id: parse_id("slot_id", &form.slot_id, SlotId::new)?,
            vehicle_number: VehicleNumber::new(form.vehicle_number)
                .map_err(|err| field_error("vehicle_number", err))?,
            hours: parse_duration_hours(&form.hours).ok_or_else(|| hours_error("hours"))?,
        })
    }
}

impl WalkInPayload {
    /// Walk-ins start at `now`.
    pub fn into_domain(self, now: DateTime<Utc>) -> Result<NewBooking, TypeConstraintError> {
        let window = BookingWindow::starting_at(now, Some(self.hours))?;
        Ok(NewBooking {
            slot_id: self.slot_id,
            area_id: self.area_id,
            amount: fee_for_hours(self.hours),
            vehicle_number: self.vehicle_number,
            start_time: window.start,
            end_time: window.end,
            kind: BookingKind::WalkIn,
        })
    }
}

#[derive(Deserialize, Validate)]
pub struct ExtendBookingForm {
    #[serde(default)]
    #[validate(custom(function = "crate::forms::duration_hours"))]
    pub additional_hours: String,
}

impl ExtendBookingForm {
    /// New end time after adding the requested hours to `current_end`.
    pub fn extension(&self, current_end: DateTime<Utc>) -> Result<BookingExtension, FormError> {
        self.validate()?;
        let new_end_time = parse_duration_hours(&self.additional_hours)
            .and_then(duration_for_hours)
            .and_then(|extra| current_end.checked_add_signed(extra))
            .ok_or_else(|| hours_error("additional_hours"))?;
        Ok(BookingExtension { new_end_time })
    }
}
