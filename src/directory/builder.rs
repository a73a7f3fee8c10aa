use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::cache::PageCache;
use super::types::{DirectoryEntry, DirectoryFilters, DirectoryPage, ScanBudget};
use crate::eligibility::{classify, AgeBrackets};
use crate::guardian::GuardianProvider;
use crate::participation::ParticipationService;
use crate::player::models::PlayerRecord;
use crate::player::repository::PlayerRepository;
use crate::shared::AppError;

/// Read-only aggregator over every guardian's roster: flattens, filters,
/// paginates and caches. Reads are lock-free and eventually consistent; a
/// record appearing or vanishing between two pages of one logical scan is
/// accepted.
pub struct DirectoryService {
    players: Arc<dyn PlayerRepository + Send + Sync>,
    guardians: Arc<dyn GuardianProvider + Send + Sync>,
    participation: Arc<ParticipationService>,
    cache: Arc<PageCache>,
    budget: ScanBudget,
    brackets: AgeBrackets,
}

impl DirectoryService {
    pub fn new(
        players: Arc<dyn PlayerRepository + Send + Sync>,
        guardians: Arc<dyn GuardianProvider + Send + Sync>,
        participation: Arc<ParticipationService>,
        cache: Arc<PageCache>,
        budget: ScanBudget,
        brackets: AgeBrackets,
    ) -> Self {
        Self {
            players,
            guardians,
            participation,
            cache,
            budget,
            brackets,
        }
    }

    /// Builds one page of the cross-account directory. Pages are 1-based;
    /// an out-of-range page returns empty entries with correct totals.
    /// `force_refresh` is the escape hatch that bypasses the cache.
    #[instrument(skip(self))]
    pub async fn build_page(
        &self,
        filters: DirectoryFilters,
        page_number: usize,
        page_size: usize,
        force_refresh: bool,
    ) -> Result<DirectoryPage, AppError> {
        if page_number == 0 {
            return Err(AppError::validation("page", "page numbers are 1-based"));
        }
        if page_size == 0 {
            return Err(AppError::validation("per_page", "page size must be positive"));
        }

        let key = format!(
            "{}|p={}|n={}",
            filters.cache_key(),
            page_number,
            page_size
        );

        if force_refresh {
            debug!(key, "Forced directory recomputation");
            let page = self.compute_page(&filters, page_number, page_size).await?;
            self.cache.insert(&key, page.clone()).await;
            return Ok(page);
        }

        self.cache
            .get_or_compute(&key, || {
                self.compute_page(&filters, page_number, page_size)
            })
            .await
    }

    async fn compute_page(
        &self,
        filters: &DirectoryFilters,
        page_number: usize,
        page_size: usize,
    ) -> Result<DirectoryPage, AppError> {
        // Stable account order so records do not drift across pages
        let guardian_ids = self.players.list_guardians().await?;

        // The scan stops once the account budget is exhausted. Hitting the
        // cap flags the page as truncated even when the account list ends
        // exactly at the boundary, since the budget, not the data, ended
        // the scan.
        let account_cap = self.budget.batch_size * self.budget.max_batches;
        let truncated = account_cap > 0 && guardian_ids.len() >= account_cap;
        let scan_ids = &guardian_ids[..guardian_ids.len().min(account_cap)];

        if truncated {
            warn!(
                accounts = guardian_ids.len(),
                account_cap,
                "Directory scan hit its resource budget; returning partial data"
            );
        }

        let today = Utc::now().date_naive();
        let mut filtered: Vec<DirectoryEntry> = Vec::new();

        // Batches stay much smaller than a page on purpose: they bound peak
        // memory while the full filtered count is accumulated.
        for chunk in scan_ids.chunks(self.budget.batch_size.max(1)) {
            let batch = self.players.load_batch(chunk).await?;
            for (guardian_id, roster) in batch {
                let profile = self.guardians.get_profile(&guardian_id).await?;
                let guardian_name = profile
                    .as_ref()
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| guardian_id.clone());
                let guardian_region = profile.as_ref().and_then(|p| p.region.clone());

                for (index, record) in roster.iter().enumerate() {
                    let region = record.region.clone().or_else(|| guardian_region.clone());
                    if !matches_filters(filters, record, region.as_deref(), today, &self.brackets)
                    {
                        continue;
                    }

                    let classification = classify(record.date_of_birth, today, &self.brackets);
                    filtered.push(DirectoryEntry {
                        guardian_id: guardian_id.clone(),
                        guardian_name: guardian_name.clone(),
                        index,
                        player_id: record.id,
                        first_name: record.first_name.clone(),
                        last_name: record.last_name.clone(),
                        date_of_birth: record.date_of_birth,
                        gender: record.gender,
                        national_insurance_number: record.national_insurance_number.clone(),
                        region,
                        age: classification.age,
                        age_group: classification.age_group,
                        ineligible: record.ineligible || classification.ineligible,
                        events_attended: 0,
                    });
                }
            }
        }

        let total_items = filtered.len();
        let total_pages = total_items.div_ceil(page_size);

        let start = (page_number - 1).saturating_mul(page_size);
        let mut entries: Vec<DirectoryEntry> = if start < total_items {
            filtered[start..(start + page_size).min(total_items)].to_vec()
        } else {
            Vec::new()
        };

        self.attach_event_counts(&mut entries).await?;

        info!(
            page_number,
            total_items,
            truncated,
            entry_count = entries.len(),
            "Directory page built"
        );

        Ok(DirectoryPage {
            page_number,
            page_size,
            total_items,
            total_pages,
            truncated,
            entries,
        })
    }

    /// Event counts are expensive (an order scan per guardian), so they are
    /// computed only for the entries on the requested page
    async fn attach_event_counts(&self, entries: &mut [DirectoryEntry]) -> Result<(), AppError> {
        let mut counts_by_guardian: HashMap<String, Vec<u32>> = HashMap::new();

        for entry in entries.iter_mut() {
            if !counts_by_guardian.contains_key(&entry.guardian_id) {
                let roster: Vec<PlayerRecord> = self.players.list(&entry.guardian_id).await?;
                let counts = self
                    .participation
                    .count_for_roster(&entry.guardian_id, &roster)
                    .await?;
                counts_by_guardian.insert(entry.guardian_id.clone(), counts);
            }

            entry.events_attended = counts_by_guardian
                .get(&entry.guardian_id)
                .and_then(|counts| counts.get(entry.index))
                .copied()
                .unwrap_or(0);
        }

        Ok(())
    }
}

fn matches_filters(
    filters: &DirectoryFilters,
    record: &PlayerRecord,
    region: Option<&str>,
    today: chrono::NaiveDate,
    brackets: &AgeBrackets,
) -> bool {
    if let Some(search) = filters.search.as_deref() {
        let needle = search.to_lowercase();
        let haystack_hit = record.first_name.to_lowercase().contains(&needle)
            || record.last_name.to_lowercase().contains(&needle)
            || record
                .national_insurance_number
                .to_lowercase()
                .contains(&needle);
        if !haystack_hit {
            return false;
        }
    }

    if let Some(wanted_region) = filters.region.as_deref() {
        match region {
            Some(region) if region.to_lowercase() == wanted_region.to_lowercase() => {}
            _ => return false,
        }
    }

    if let Some(gender) = filters.gender {
        if record.gender != gender {
            return false;
        }
    }

    if let Some(age_group) = filters.age_group {
        if classify(record.date_of_birth, today, brackets).age_group != age_group {
            return false;
        }
    }

    true
}
