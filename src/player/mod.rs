pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;
pub mod types;

pub use models::{Gender, GuardianId, PlayerId, PlayerRecord};
pub use repository::PlayerRepository;
pub use service::PlayerService;
