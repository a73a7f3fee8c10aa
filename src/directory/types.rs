use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::eligibility::AgeGroup;
use crate::player::models::{Gender, PlayerId};

/// Filter set for the cross-account directory. All filters are optional
/// and combine with AND semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilters {
    /// Case-insensitive substring over first name, last name and national
    /// insurance number
    pub search: Option<String>,
    pub region: Option<String>,
    pub gender: Option<Gender>,
    pub age_group: Option<AgeGroup>,
}

impl DirectoryFilters {
    /// Deterministic cache-key fragment for this filter set. Search and
    /// region fold to lowercase so case variants share a cache entry,
    /// matching how both are matched.
    pub fn cache_key(&self) -> String {
        format!(
            "s={}|r={}|g={}|a={}",
            self.search.as_deref().unwrap_or("").to_lowercase(),
            self.region.as_deref().unwrap_or("").to_lowercase(),
            self.gender.map(|g| g.to_string()).unwrap_or_default(),
            self.age_group.map(|a| a.to_string()).unwrap_or_default(),
        )
    }
}

/// One flattened roster entry with its owning guardian's display fields
/// and derived stats attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub guardian_id: String,
    pub guardian_name: String,
    pub index: usize,
    pub player_id: PlayerId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub national_insurance_number: String,
    pub region: Option<String>,
    pub age: u32,
    pub age_group: AgeGroup,
    pub ineligible: bool,
    pub events_attended: u32,
}

/// One stable slice of the filtered, flattened directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryPage {
    pub page_number: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    /// True when the scan stopped at its resource budget; totals and
    /// entries then cover only the scanned prefix of accounts
    pub truncated: bool,
    pub entries: Vec<DirectoryEntry>,
}

/// Caps on a full-directory scan. The batch size is deliberately small
/// relative to a page to bound peak memory while aggregating.
#[derive(Debug, Clone, Copy)]
pub struct ScanBudget {
    /// Guardian accounts loaded per batch
    pub batch_size: usize,
    /// Hard stop after this many batches
    pub max_batches: usize,
}

impl Default for ScanBudget {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_batches: 200,
        }
    }
}
