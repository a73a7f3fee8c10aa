pub mod builder;
pub mod cache;
pub mod handlers;
pub mod types;

pub use builder::DirectoryService;
pub use cache::{start_cache_sweep_task, PageCache};
pub use types::{DirectoryEntry, DirectoryFilters, DirectoryPage, ScanBudget};
