use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::models::{Gender, PlayerId, PlayerRecord};
use crate::eligibility::{classify, AgeBrackets, AgeGroup};

/// Guardian-facing submission payload for creating a player record
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSubmission {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub national_insurance_number: Option<String>,
    pub medical_conditions: Option<String>,
    pub region: Option<String>,
}

/// Partial update; absent fields keep their stored values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub national_insurance_number: Option<String>,
    pub medical_conditions: Option<String>,
    pub region: Option<String>,
}

/// Response shape for a stored player record, including its ordinal index
/// and derived eligibility fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerResponse {
    pub index: usize,
    pub id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub national_insurance_number: String,
    pub medical_conditions: String,
    pub region: Option<String>,
    pub age: u32,
    pub age_group: AgeGroup,
    pub ineligible: bool,
}

impl PlayerResponse {
    pub fn from_record(index: usize, record: &PlayerRecord, brackets: &AgeBrackets) -> Self {
        let classification = classify(record.date_of_birth, Utc::now().date_naive(), brackets);
        Self {
            index,
            id: record.id,
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            date_of_birth: record.date_of_birth,
            gender: record.gender,
            national_insurance_number: record.national_insurance_number.clone(),
            medical_conditions: record.medical_conditions.clone(),
            region: record.region.clone(),
            age: classification.age,
            age_group: classification.age_group,
            ineligible: record.ineligible || classification.ineligible,
        }
    }
}

/// Result of an edit, distinguishing a real change from a no-op so callers
/// can skip redundant cache invalidation
#[derive(Debug, Clone, Serialize)]
pub struct EditedPlayer {
    pub changed: bool,
    pub player: PlayerResponse,
}
