use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

pub type GuardianId = String;
pub type PlayerId = Uuid;

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_MEDICAL_LEN: usize = 500;

/// Sentinel stored when no national insurance number was supplied
pub const NI_NUMBER_UNSET: &str = "0000";
/// Default medical note applied once at construction
pub const MEDICAL_NONE: &str = "no known medical conditions";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A child attendee's stored profile. Addressed by ordinal position within
/// the owning guardian's list; the uuid is the stable surrogate id that
/// survives renumbering after deletions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub national_insurance_number: String,
    pub medical_conditions: String,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ineligible: bool,
}

impl PlayerRecord {
    /// "first last" concatenation used for order-line name correlation
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
