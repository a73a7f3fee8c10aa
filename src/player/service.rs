use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::{
        PlayerRecord, MAX_MEDICAL_LEN, MAX_NAME_LEN, MEDICAL_NONE, NI_NUMBER_UNSET,
    },
    repository::{AddOutcome, DeleteOutcome, EditOutcome, PlayerRepository},
    types::{EditedPlayer, PlayerPatch, PlayerResponse, PlayerSubmission},
};
use crate::directory::cache::PageCache;
use crate::eligibility::AgeBrackets;
use crate::shared::AppError;

/// Service for the guardian-facing roster lifecycle: validation, duplicate
/// rejection, per-guardian write serialization and cache invalidation.
pub struct PlayerService {
    repository: Arc<dyn PlayerRepository + Send + Sync>,
    page_cache: Arc<PageCache>,
    brackets: AgeBrackets,
    /// Positional addressing is unsafe under concurrent structural
    /// mutation, so writes take a per-guardian lock
    guardian_locks: Arc<RwLock<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl PlayerService {
    pub fn new(
        repository: Arc<dyn PlayerRepository + Send + Sync>,
        page_cache: Arc<PageCache>,
        brackets: AgeBrackets,
    ) -> Self {
        Self {
            repository,
            page_cache,
            brackets,
            guardian_locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn repository(&self) -> Arc<dyn PlayerRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    /// Validates and persists a new player record for a guardian
    #[instrument(skip(self, submission))]
    pub async fn submit(
        &self,
        guardian_id: &str,
        submission: PlayerSubmission,
    ) -> Result<PlayerResponse, AppError> {
        let record = build_record(submission)?;
        let full_name = record.full_name();

        let lock = self.guardian_lock(guardian_id).await;
        let _guard = lock.lock().await;

        match self.repository.add(guardian_id, record.clone()).await? {
            AddOutcome::Added(index) => {
                info!(guardian_id = %guardian_id, index, "Player record created");
                self.page_cache.invalidate_all().await;
                Ok(PlayerResponse::from_record(index, &record, &self.brackets))
            }
            AddOutcome::Duplicate => Err(AppError::Duplicate(format!(
                "a player named {} with that date of birth already exists on this account",
                full_name
            ))),
        }
    }

    /// Applies a partial update in place. A patch that changes nothing
    /// reports `changed: false` and triggers no cache invalidation.
    #[instrument(skip(self, patch))]
    pub async fn edit(
        &self,
        guardian_id: &str,
        index: usize,
        patch: PlayerPatch,
    ) -> Result<EditedPlayer, AppError> {
        let lock = self.guardian_lock(guardian_id).await;
        let _guard = lock.lock().await;

        let current = self
            .repository
            .get(guardian_id, index)
            .await?
            .ok_or_else(|| AppError::NotFound(player_not_found(guardian_id, index)))?;

        let merged = merge_patch(&current, patch)?;

        match self.repository.edit(guardian_id, index, merged).await? {
            EditOutcome::Changed(record) => {
                info!(guardian_id = %guardian_id, index, "Player record updated");
                self.page_cache.invalidate_all().await;
                Ok(EditedPlayer {
                    changed: true,
                    player: PlayerResponse::from_record(index, &record, &self.brackets),
                })
            }
            EditOutcome::Unchanged => {
                debug!(guardian_id = %guardian_id, index, "Edit changed nothing");
                Ok(EditedPlayer {
                    changed: false,
                    player: PlayerResponse::from_record(index, &current, &self.brackets),
                })
            }
            EditOutcome::Duplicate => Err(AppError::Duplicate(
                "the edited name and date of birth match another player on this account"
                    .to_string(),
            )),
            EditOutcome::NotFound => {
                Err(AppError::NotFound(player_not_found(guardian_id, index)))
            }
        }
    }

    /// Removes one record. Later ordinals shift down; see the repository
    /// contract for how stable ids bridge that renumbering.
    #[instrument(skip(self))]
    pub async fn remove(&self, guardian_id: &str, index: usize) -> Result<(), AppError> {
        let lock = self.guardian_lock(guardian_id).await;
        let _guard = lock.lock().await;

        match self.repository.delete(guardian_id, index).await? {
            DeleteOutcome::Deleted => {
                info!(guardian_id = %guardian_id, index, "Player record deleted");
                self.page_cache.invalidate_all().await;
                Ok(())
            }
            DeleteOutcome::NotFound => {
                Err(AppError::NotFound(player_not_found(guardian_id, index)))
            }
        }
    }

    /// Account-deletion flow: drops the guardian's entire roster at once
    #[instrument(skip(self))]
    pub async fn remove_all(&self, guardian_id: &str) -> Result<usize, AppError> {
        let lock = self.guardian_lock(guardian_id).await;
        let _guard = lock.lock().await;

        let dropped = self.repository.delete_all(guardian_id).await?;
        if dropped > 0 {
            info!(guardian_id = %guardian_id, dropped, "Guardian roster erased");
            self.page_cache.invalidate_all().await;
        }
        Ok(dropped)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, guardian_id: &str, index: usize) -> Result<PlayerResponse, AppError> {
        let record = self
            .repository
            .get(guardian_id, index)
            .await?
            .ok_or_else(|| AppError::NotFound(player_not_found(guardian_id, index)))?;
        Ok(PlayerResponse::from_record(index, &record, &self.brackets))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, guardian_id: &str) -> Result<Vec<PlayerResponse>, AppError> {
        let roster = self.repository.list(guardian_id).await?;
        Ok(roster
            .iter()
            .enumerate()
            .map(|(index, record)| PlayerResponse::from_record(index, record, &self.brackets))
            .collect())
    }

    /// Entries are never evicted: a waiter may still hold the Arc, and a
    /// fresh mutex for the same guardian would let two writers interleave.
    /// The map stays bounded by the number of guardians ever seen.
    async fn guardian_lock(&self, guardian_id: &str) -> Arc<AsyncMutex<()>> {
        {
            let guard = self.guardian_locks.read().await;
            if let Some(lock) = guard.get(guardian_id) {
                return lock.clone();
            }
        }

        let mut guard = self.guardian_locks.write().await;
        guard
            .entry(guardian_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

fn player_not_found(guardian_id: &str, index: usize) -> String {
    format!("no player record at index {} for guardian {}", index, guardian_id)
}

/// Validates a submission and applies defaults once, at construction
fn build_record(submission: PlayerSubmission) -> Result<PlayerRecord, AppError> {
    let first_name = required_name("first_name", &submission.first_name)?;
    let last_name = required_name("last_name", &submission.last_name)?;

    if submission.date_of_birth > Utc::now().date_naive() {
        return Err(AppError::validation(
            "date_of_birth",
            "date of birth must not be in the future",
        ));
    }

    let medical_conditions = match submission.medical_conditions.as_deref().map(str::trim) {
        Some(notes) if !notes.is_empty() => {
            if notes.chars().count() > MAX_MEDICAL_LEN {
                return Err(AppError::validation(
                    "medical_conditions",
                    format!("must be at most {} characters", MAX_MEDICAL_LEN),
                ));
            }
            notes.to_string()
        }
        _ => MEDICAL_NONE.to_string(),
    };

    let national_insurance_number = match submission
        .national_insurance_number
        .as_deref()
        .map(str::trim)
    {
        Some(number) if !number.is_empty() => number.to_string(),
        _ => NI_NUMBER_UNSET.to_string(),
    };

    let region = submission
        .region
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string);

    Ok(PlayerRecord {
        id: Uuid::new_v4(),
        first_name,
        last_name,
        date_of_birth: submission.date_of_birth,
        gender: submission.gender,
        national_insurance_number,
        medical_conditions,
        region,
        created_at: Utc::now(),
        ineligible: false,
    })
}

/// Merges a patch onto the stored record and re-validates the result with
/// the same rules as a fresh submission. The id and creation timestamp are
/// immutable.
fn merge_patch(current: &PlayerRecord, patch: PlayerPatch) -> Result<PlayerRecord, AppError> {
    let submission = PlayerSubmission {
        first_name: patch.first_name.unwrap_or_else(|| current.first_name.clone()),
        last_name: patch.last_name.unwrap_or_else(|| current.last_name.clone()),
        date_of_birth: patch.date_of_birth.unwrap_or(current.date_of_birth),
        gender: patch.gender.unwrap_or(current.gender),
        national_insurance_number: Some(
            patch
                .national_insurance_number
                .unwrap_or_else(|| current.national_insurance_number.clone()),
        ),
        medical_conditions: Some(
            patch
                .medical_conditions
                .unwrap_or_else(|| current.medical_conditions.clone()),
        ),
        region: patch.region.or_else(|| current.region.clone()),
    };

    let mut merged = build_record(submission)?;
    merged.id = current.id;
    merged.created_at = current.created_at;
    merged.ineligible = current.ineligible;
    Ok(merged)
}

fn required_name(field: &'static str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, "is required"));
    }
    // Character count, not bytes; accented names must not shrink the limit
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation(
            field,
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    Ok(trimmed.to_string())
}
