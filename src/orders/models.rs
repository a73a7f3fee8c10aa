use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::player::models::PlayerId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Completed,
    Processing,
    OnHold,
    Pending,
    Cancelled,
    Refunded,
}

/// Correlation fields a line item carries for the player it was bought for.
/// All three are snapshots taken at purchase time and may be stale after
/// later edits or deletions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemPlayerRef {
    /// Stable surrogate id; present on line items created after the id
    /// migration, absent on historical ones
    pub player_id: Option<PlayerId>,
    /// Legacy positional reference into the guardian's list
    pub record_index: Option<usize>,
    /// Free-text "first last" snapshot
    pub assigned_attendee_name: Option<String>,
}

/// One purchased event slot within an order. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub event_name: String,
    pub venue: Option<String>,
    /// Event end date as supplied by the purchase subsystem, DD/MM/YYYY
    pub event_end_date: Option<String>,
    pub player_ref: LineItemPlayerRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: OrderStatus,
    pub line_items: Vec<OrderLineItem>,
}
