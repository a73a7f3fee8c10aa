// Library crate for the player roster service
// This file exposes the public API for integration tests

pub mod directory;
pub mod eligibility;
pub mod guardian;
pub mod identity;
pub mod import;
pub mod orders;
pub mod participation;
pub mod player;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use directory::{DirectoryFilters, DirectoryPage, DirectoryService, PageCache, ScanBudget};
pub use eligibility::{classify, AgeBrackets, AgeGroup};
pub use guardian::{GuardianProfile, GuardianProvider, InMemoryGuardianProvider};
pub use import::{ImportReport, ImportService};
pub use orders::{InMemoryOrderProvider, Order, OrderProvider, OrderStatus};
pub use participation::{ParticipationPolicy, ParticipationService};
pub use player::{Gender, PlayerRecord, PlayerRepository, PlayerService};
pub use shared::AppError;
