pub mod handlers;
pub mod service;

pub use service::{AttendedEvent, ParticipationPolicy, ParticipationService, EVENT_DATE_FORMAT};
