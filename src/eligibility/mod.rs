use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Age-group bracket boundaries. These changed between seasons in the past,
/// so they are configuration rather than constants.
#[derive(Debug, Clone)]
pub struct AgeBrackets {
    /// First age that is old enough to take part
    pub youth_min: u32,
    /// First age of the older youth bracket
    pub bracket_two_min: u32,
    /// First age that is no longer eligible
    pub cutoff: u32,
}

impl Default for AgeBrackets {
    fn default() -> Self {
        Self {
            youth_min: 3,
            bracket_two_min: 6,
            cutoff: 14,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    /// Too young to take part
    Toddler,
    /// Younger youth bracket (3-5 with default brackets)
    Junior,
    /// Older youth bracket (6-13 with default brackets)
    Senior,
    /// Past the cutoff age
    Overage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub age: u32,
    pub age_group: AgeGroup,
    pub ineligible: bool,
}

/// Full elapsed years between two dates, accounting for a birthday that has
/// not yet been reached in the reference year.
pub fn age_in_years(date_of_birth: NaiveDate, reference: NaiveDate) -> u32 {
    let mut age = reference.year() - date_of_birth.year();
    if (reference.month(), reference.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

/// Classifies a date of birth against a reference date and bracket config.
pub fn classify(
    date_of_birth: NaiveDate,
    reference: NaiveDate,
    brackets: &AgeBrackets,
) -> Classification {
    let age = age_in_years(date_of_birth, reference);

    let age_group = if age < brackets.youth_min {
        AgeGroup::Toddler
    } else if age < brackets.bracket_two_min {
        AgeGroup::Junior
    } else if age < brackets.cutoff {
        AgeGroup::Senior
    } else {
        AgeGroup::Overage
    };

    Classification {
        age,
        age_group,
        ineligible: age >= brackets.cutoff,
    }
}
