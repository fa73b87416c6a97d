use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The slots the dialog front-end collects for a dining request, in the
/// order the validator checks them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotField {
    Cuisine,
    Location,
    PartySize,
    DiningDate,
    DiningTime,
    ContactHandle,
}

impl SlotField {
    pub const ALL: [SlotField; 6] = [
        Self::Cuisine,
        Self::Location,
        Self::PartySize,
        Self::DiningDate,
        Self::DiningTime,
        Self::ContactHandle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cuisine => "cuisine",
            Self::Location => "location",
            Self::PartySize => "party_size",
            Self::DiningDate => "dining_date",
            Self::DiningTime => "dining_time",
            Self::ContactHandle => "contact_handle",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cuisine" => Some(Self::Cuisine),
            "location" => Some(Self::Location),
            "party_size" => Some(Self::PartySize),
            "dining_date" => Some(Self::DiningDate),
            "dining_time" => Some(Self::DiningTime),
            "contact_handle" => Some(Self::ContactHandle),
            _ => None,
        }
    }
}

impl std::fmt::Display for SlotField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw slot values as collected so far in a dialog session. Every field is
/// optional until the turn that validates and enqueues the request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotValues {
    pub cuisine: Option<String>,
    pub location: Option<String>,
    pub party_size: Option<String>,
    pub dining_date: Option<String>,
    pub dining_time: Option<String>,
    pub contact_handle: Option<String>,
}

impl SlotValues {
    pub fn get(&self, field: SlotField) -> Option<&str> {
        match field {
            SlotField::Cuisine => self.cuisine.as_deref(),
            SlotField::Location => self.location.as_deref(),
            SlotField::PartySize => self.party_size.as_deref(),
            SlotField::DiningDate => self.dining_date.as_deref(),
            SlotField::DiningTime => self.dining_time.as_deref(),
            SlotField::ContactHandle => self.contact_handle.as_deref(),
        }
    }

    pub fn set(&mut self, field: SlotField, value: Option<String>) {
        let slot = match field {
            SlotField::Cuisine => &mut self.cuisine,
            SlotField::Location => &mut self.location,
            SlotField::PartySize => &mut self.party_size,
            SlotField::DiningDate => &mut self.dining_date,
            SlotField::DiningTime => &mut self.dining_time,
            SlotField::ContactHandle => &mut self.contact_handle,
        };
        *slot = value;
    }

    /// Drops the value of one slot so the platform re-asks for it.
    pub fn clear(&mut self, field: SlotField) {
        self.set(field, None);
    }

    pub fn from_wire(slots: &BTreeMap<String, Option<String>>) -> Self {
        let mut values = Self::default();
        for (name, value) in slots {
            if let Some(field) = SlotField::parse(name) {
                values.set(field, value.clone());
            }
        }
        values
    }

    pub fn to_wire(&self) -> BTreeMap<String, Option<String>> {
        SlotField::ALL
            .iter()
            .map(|field| (field.as_str().to_string(), self.get(*field).map(str::to_string)))
            .collect()
    }

    /// Promotes the collected slots into an immutable [`DiningRequest`].
    /// Only called on the post-confirmation turn, after validation passed.
    pub fn complete(&self) -> Result<DiningRequest, RequestError> {
        let required = |field: SlotField| {
            self.get(field)
                .map(str::to_string)
                .ok_or(RequestError::MissingSlot { field })
        };

        let party_size_raw = required(SlotField::PartySize)?;
        let party_size = party_size_raw
            .trim()
            .parse::<u32>()
            .map_err(|_| RequestError::InvalidPartySize { value: party_size_raw.clone() })?;

        let dining_date_raw = required(SlotField::DiningDate)?;
        let dining_date = NaiveDate::parse_from_str(&dining_date_raw, "%Y-%m-%d")
            .map_err(|_| RequestError::InvalidDate { value: dining_date_raw.clone() })?;

        Ok(DiningRequest {
            cuisine: required(SlotField::Cuisine)?,
            location: required(SlotField::Location)?,
            party_size,
            dining_date,
            dining_time: required(SlotField::DiningTime)?,
            contact_handle: required(SlotField::ContactHandle)?,
        })
    }
}

/// A fully collected dining request. Immutable once enqueued; consumed
/// exactly once by the recommendation worker and deleted on acknowledge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningRequest {
    pub cuisine: String,
    pub location: String,
    pub party_size: u32,
    pub dining_date: NaiveDate,
    /// Already validated as `HH:MM` within business hours.
    pub dining_time: String,
    pub contact_handle: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("slot `{field}` was never collected")]
    MissingSlot { field: SlotField },
    #[error("party size `{value}` is not a positive integer")]
    InvalidPartySize { value: String },
    #[error("dining date `{value}` is not a calendar date")]
    InvalidDate { value: String },
}
