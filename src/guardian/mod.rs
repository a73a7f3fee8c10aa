use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::shared::AppError;

/// Display-level profile of a guardian account. The account itself is owned
/// by the host's user system; this crate only reads derived fields for the
/// directory and resolves guardians by email during CSV import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianProfile {
    pub guardian_id: String,
    pub email: String,
    pub display_name: String,
    pub region: Option<String>,
}

/// Read-only seam to the host's account system
#[async_trait]
pub trait GuardianProvider: Send + Sync {
    async fn get_profile(&self, guardian_id: &str) -> Result<Option<GuardianProfile>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<GuardianProfile>, AppError>;
}

/// In-memory implementation of GuardianProvider for development and testing
#[derive(Default)]
pub struct InMemoryGuardianProvider {
    profiles: Arc<RwLock<HashMap<String, GuardianProfile>>>,
}

impl InMemoryGuardianProvider {
    pub fn new() -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, profile: GuardianProfile) {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.guardian_id.clone(), profile);
    }
}

#[async_trait]
impl GuardianProvider for InMemoryGuardianProvider {
    async fn get_profile(&self, guardian_id: &str) -> Result<Option<GuardianProfile>, AppError> {
        let profiles = self.profiles.read().await;
        let profile = profiles.get(guardian_id).cloned();
        debug!(guardian_id = %guardian_id, found = profile.is_some(), "Guardian profile lookup");
        Ok(profile)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<GuardianProfile>, AppError> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}
