use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::models::{GuardianId, PlayerId, PlayerRecord};
use crate::identity::find_duplicate;
use crate::shared::AppError;

/// Result of attempting to add a player record
#[derive(Debug, Clone)]
pub enum AddOutcome {
    /// Appended; returns the new ordinal index
    Added(usize),
    /// A record with the same (first, last, dob) already exists; the list
    /// is left unchanged
    Duplicate,
}

/// Result of attempting an in-place edit
#[derive(Debug, Clone)]
pub enum EditOutcome {
    /// Stored; returns the updated record
    Changed(PlayerRecord),
    /// The merged record equals the stored one; nothing written
    Unchanged,
    /// The merged record collides with a sibling record
    Duplicate,
    /// Guardian or index does not exist
    NotFound,
}

/// Result of attempting a delete
#[derive(Debug, Clone)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

/// Trait for player-roster storage. One insertion-ordered list of records
/// per guardian, mirroring the host's per-account metadata blob.
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Appends a record after checking the uniqueness invariant atomically
    async fn add(&self, guardian_id: &str, record: PlayerRecord) -> Result<AddOutcome, AppError>;

    /// Replaces the record at `index` in place. Uniqueness is checked
    /// against every record except the slot being edited. Ordinals of all
    /// other records are untouched.
    async fn edit(
        &self,
        guardian_id: &str,
        index: usize,
        merged: PlayerRecord,
    ) -> Result<EditOutcome, AppError>;

    /// Removes the record at `index`. Later records shift down one slot;
    /// stable player ids are the durable reference across that renumbering.
    async fn delete(&self, guardian_id: &str, index: usize) -> Result<DeleteOutcome, AppError>;

    async fn get(&self, guardian_id: &str, index: usize)
        -> Result<Option<PlayerRecord>, AppError>;

    async fn get_by_id(
        &self,
        guardian_id: &str,
        player_id: PlayerId,
    ) -> Result<Option<(usize, PlayerRecord)>, AppError>;

    /// Insertion-ordered list of a guardian's records
    async fn list(&self, guardian_id: &str) -> Result<Vec<PlayerRecord>, AppError>;

    /// Removes the guardian's entire list at once (account-deletion flow);
    /// returns how many records were dropped
    async fn delete_all(&self, guardian_id: &str) -> Result<usize, AppError>;

    /// All guardian ids with at least one record, in sorted-id order so
    /// directory pages do not drift between requests
    async fn list_guardians(&self) -> Result<Vec<GuardianId>, AppError>;

    /// Batch-load rosters for a chunk of guardians
    async fn load_batch(
        &self,
        guardian_ids: &[GuardianId],
    ) -> Result<Vec<(GuardianId, Vec<PlayerRecord>)>, AppError>;
}

/// In-memory implementation of PlayerRepository for development and testing
#[derive(Debug, Default)]
pub struct InMemoryPlayerRepository {
    rosters: Arc<RwLock<HashMap<GuardianId, Vec<PlayerRecord>>>>,
}

impl InMemoryPlayerRepository {
    pub fn new() -> Self {
        Self {
            rosters: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl PlayerRepository for InMemoryPlayerRepository {
    #[instrument(skip(self, record))]
    async fn add(&self, guardian_id: &str, record: PlayerRecord) -> Result<AddOutcome, AppError> {
        let mut rosters = self.rosters.write().await;
        let roster = rosters.entry(guardian_id.to_string()).or_default();

        if find_duplicate(
            &record.first_name,
            &record.last_name,
            record.date_of_birth,
            roster,
            None,
        )
        .is_some()
        {
            warn!(
                guardian_id = %guardian_id,
                full_name = %record.full_name(),
                "Rejected duplicate player submission"
            );
            return Ok(AddOutcome::Duplicate);
        }

        roster.push(record);
        let index = roster.len() - 1;
        debug!(guardian_id = %guardian_id, index, "Player record added");
        Ok(AddOutcome::Added(index))
    }

    #[instrument(skip(self, merged))]
    async fn edit(
        &self,
        guardian_id: &str,
        index: usize,
        merged: PlayerRecord,
    ) -> Result<EditOutcome, AppError> {
        let mut rosters = self.rosters.write().await;
        let roster = match rosters.get_mut(guardian_id) {
            Some(roster) if index < roster.len() => roster,
            _ => return Ok(EditOutcome::NotFound),
        };

        if roster[index] == merged {
            debug!(guardian_id = %guardian_id, index, "Edit is a no-op");
            return Ok(EditOutcome::Unchanged);
        }

        if find_duplicate(
            &merged.first_name,
            &merged.last_name,
            merged.date_of_birth,
            roster,
            Some(index),
        )
        .is_some()
        {
            warn!(guardian_id = %guardian_id, index, "Edit would collide with a sibling record");
            return Ok(EditOutcome::Duplicate);
        }

        roster[index] = merged.clone();
        debug!(guardian_id = %guardian_id, index, "Player record edited in place");
        Ok(EditOutcome::Changed(merged))
    }

    #[instrument(skip(self))]
    async fn delete(&self, guardian_id: &str, index: usize) -> Result<DeleteOutcome, AppError> {
        let mut rosters = self.rosters.write().await;
        let roster = match rosters.get_mut(guardian_id) {
            Some(roster) if index < roster.len() => roster,
            _ => return Ok(DeleteOutcome::NotFound),
        };

        roster.remove(index);
        if roster.is_empty() {
            rosters.remove(guardian_id);
        }
        debug!(guardian_id = %guardian_id, index, "Player record deleted");
        Ok(DeleteOutcome::Deleted)
    }

    #[instrument(skip(self))]
    async fn get(
        &self,
        guardian_id: &str,
        index: usize,
    ) -> Result<Option<PlayerRecord>, AppError> {
        let rosters = self.rosters.read().await;
        Ok(rosters
            .get(guardian_id)
            .and_then(|roster| roster.get(index))
            .cloned())
    }

    #[instrument(skip(self))]
    async fn get_by_id(
        &self,
        guardian_id: &str,
        player_id: PlayerId,
    ) -> Result<Option<(usize, PlayerRecord)>, AppError> {
        let rosters = self.rosters.read().await;
        Ok(rosters.get(guardian_id).and_then(|roster| {
            roster
                .iter()
                .position(|r| r.id == player_id)
                .map(|i| (i, roster[i].clone()))
        }))
    }

    #[instrument(skip(self))]
    async fn list(&self, guardian_id: &str) -> Result<Vec<PlayerRecord>, AppError> {
        let rosters = self.rosters.read().await;
        Ok(rosters.get(guardian_id).cloned().unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, guardian_id: &str) -> Result<usize, AppError> {
        let mut rosters = self.rosters.write().await;
        let dropped = rosters.remove(guardian_id).map(|r| r.len()).unwrap_or(0);
        debug!(guardian_id = %guardian_id, dropped, "Guardian roster removed");
        Ok(dropped)
    }

    #[instrument(skip(self))]
    async fn list_guardians(&self) -> Result<Vec<GuardianId>, AppError> {
        let rosters = self.rosters.read().await;
        let mut guardians: Vec<GuardianId> = rosters.keys().cloned().collect();
        guardians.sort();
        Ok(guardians)
    }

    #[instrument(skip(self, guardian_ids))]
    async fn load_batch(
        &self,
        guardian_ids: &[GuardianId],
    ) -> Result<Vec<(GuardianId, Vec<PlayerRecord>)>, AppError> {
        let rosters = self.rosters.read().await;
        Ok(guardian_ids
            .iter()
            .map(|id| (id.clone(), rosters.get(id).cloned().unwrap_or_default()))
            .collect())
    }
}
