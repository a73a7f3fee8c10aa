use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::identity::resolve_line_item;
use crate::orders::models::{Order, OrderStatus};
use crate::orders::provider::OrderProvider;
use crate::player::models::PlayerRecord;
use crate::player::repository::PlayerRepository;
use crate::shared::AppError;

/// Date format the purchase subsystem uses for event end dates
pub const EVENT_DATE_FORMAT: &str = "%d/%m/%Y";

/// Which order statuses count towards "events attended". One shared policy
/// value, so call sites cannot drift apart on the status list.
#[derive(Debug, Clone)]
pub struct ParticipationPolicy {
    pub counted_statuses: Vec<OrderStatus>,
}

impl Default for ParticipationPolicy {
    fn default() -> Self {
        Self {
            counted_statuses: vec![OrderStatus::Completed, OrderStatus::Processing],
        }
    }
}

/// One purchased event slot matched to a player, for administrative display
#[derive(Debug, Clone, Serialize)]
pub struct AttendedEvent {
    pub event_name: String,
    pub venue: Option<String>,
    pub end_date: Option<NaiveDate>,
    /// True only when the end date parsed and lies before the reference
    /// date; an unparsable or missing end date is never classified as past
    pub past: bool,
}

/// Scans a guardian's purchase history and counts line items per player.
/// No persisted aggregate: every call is an O(orders x line items) scan,
/// so bulk callers batch through `count_for_roster`.
pub struct ParticipationService {
    players: Arc<dyn PlayerRepository + Send + Sync>,
    orders: Arc<dyn OrderProvider + Send + Sync>,
    policy: ParticipationPolicy,
}

impl ParticipationService {
    pub fn new(
        players: Arc<dyn PlayerRepository + Send + Sync>,
        orders: Arc<dyn OrderProvider + Send + Sync>,
        policy: ParticipationPolicy,
    ) -> Self {
        Self {
            players,
            orders,
            policy,
        }
    }

    /// Number of counted line items referencing the player at `player_index`
    #[instrument(skip(self))]
    pub async fn count_events(
        &self,
        guardian_id: &str,
        player_index: usize,
    ) -> Result<u32, AppError> {
        let roster = self.players.list(guardian_id).await?;
        if player_index >= roster.len() {
            return Err(AppError::NotFound(format!(
                "no player record at index {} for guardian {}",
                player_index, guardian_id
            )));
        }

        let counts = self.count_for_roster(guardian_id, &roster).await?;
        Ok(counts[player_index])
    }

    /// Per-record counts for a whole roster in a single order scan
    #[instrument(skip(self, roster))]
    pub async fn count_for_roster(
        &self,
        guardian_id: &str,
        roster: &[PlayerRecord],
    ) -> Result<Vec<u32>, AppError> {
        let mut counts = vec![0u32; roster.len()];
        if roster.is_empty() {
            return Ok(counts);
        }

        let orders = self
            .orders
            .orders_with_status(guardian_id, &self.policy.counted_statuses)
            .await?;

        for order in &orders {
            for line_item in valid_line_items(order) {
                if let Some(index) = resolve_line_item(&line_item.player_ref, roster)
                    .resolved_index()
                {
                    counts[index] += 1;
                }
            }
        }

        debug!(
            guardian_id = %guardian_id,
            orders = orders.len(),
            "Counted events for roster"
        );
        Ok(counts)
    }

    /// Matched line items for one player, with past/upcoming classification
    #[instrument(skip(self))]
    pub async fn event_history(
        &self,
        guardian_id: &str,
        player_index: usize,
    ) -> Result<Vec<AttendedEvent>, AppError> {
        let roster = self.players.list(guardian_id).await?;
        if player_index >= roster.len() {
            return Err(AppError::NotFound(format!(
                "no player record at index {} for guardian {}",
                player_index, guardian_id
            )));
        }

        let orders = self
            .orders
            .orders_with_status(guardian_id, &self.policy.counted_statuses)
            .await?;
        let today = Utc::now().date_naive();

        let mut events = Vec::new();
        for order in &orders {
            for line_item in valid_line_items(order) {
                let resolved = resolve_line_item(&line_item.player_ref, &roster);
                if resolved.resolved_index() != Some(player_index) {
                    continue;
                }

                let end_date = line_item
                    .event_end_date
                    .as_deref()
                    .and_then(|raw| parse_event_date(raw, &order.id));

                events.push(AttendedEvent {
                    event_name: line_item.event_name.clone(),
                    venue: line_item.venue.clone(),
                    end_date,
                    past: end_date.map(|d| d < today).unwrap_or(false),
                });
            }
        }

        Ok(events)
    }

    /// The "past events" view: matched line items whose event already ended
    pub async fn past_events(
        &self,
        guardian_id: &str,
        player_index: usize,
    ) -> Result<Vec<AttendedEvent>, AppError> {
        let events = self.event_history(guardian_id, player_index).await?;
        Ok(events.into_iter().filter(|e| e.past).collect())
    }
}

/// Line items with the fields a count depends on; malformed ones are
/// logged and skipped, never fatal to the scan
fn valid_line_items(order: &Order) -> impl Iterator<Item = &crate::orders::models::OrderLineItem> {
    let order_id = order.id.clone();
    order.line_items.iter().filter(move |item| {
        if item.event_name.trim().is_empty() {
            warn!(order_id = %order_id, "Skipping line item with no event name");
            return false;
        }
        true
    })
}

fn parse_event_date(raw: &str, order_id: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), EVENT_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(order_id = %order_id, raw, "Unparsable event end date; treating as not past");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::models::{LineItemPlayerRef, OrderLineItem};
    use crate::orders::provider::InMemoryOrderProvider;
    use crate::player::models::{Gender, MEDICAL_NONE, NI_NUMBER_UNSET};
    use crate::player::repository::InMemoryPlayerRepository;
    use uuid::Uuid;

    fn record(first: &str, last: &str, dob: &str) -> PlayerRecord {
        PlayerRecord {
            id: Uuid::new_v4(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: NaiveDate::parse_from_str(dob, "%Y-%m-%d").unwrap(),
            gender: Gender::Other,
            national_insurance_number: NI_NUMBER_UNSET.to_string(),
            medical_conditions: MEDICAL_NONE.to_string(),
            region: None,
            created_at: Utc::now(),
            ineligible: false,
        }
    }

    fn line_item(name: &str, end_date: Option<&str>, player_ref: LineItemPlayerRef) -> OrderLineItem {
        OrderLineItem {
            event_name: name.to_string(),
            venue: Some("Sports Hall".to_string()),
            event_end_date: end_date.map(str::to_string),
            player_ref,
        }
    }

    fn by_index(index: usize) -> LineItemPlayerRef {
        LineItemPlayerRef {
            player_id: None,
            record_index: Some(index),
            assigned_attendee_name: None,
        }
    }

    fn by_name(name: &str) -> LineItemPlayerRef {
        LineItemPlayerRef {
            player_id: None,
            record_index: None,
            assigned_attendee_name: Some(name.to_string()),
        }
    }

    async fn setup(
        orders: Vec<Order>,
    ) -> (ParticipationService, Arc<InMemoryPlayerRepository>) {
        let players = Arc::new(InMemoryPlayerRepository::new());
        players
            .add("g-1", record("Mia", "Keller", "2017-03-02"))
            .await
            .unwrap();
        players
            .add("g-1", record("Noah", "Keller", "2015-08-20"))
            .await
            .unwrap();

        let provider = InMemoryOrderProvider::new();
        for order in orders {
            provider.record_order("g-1", order).await;
        }

        let service = ParticipationService::new(
            Arc::clone(&players) as Arc<dyn PlayerRepository + Send + Sync>,
            Arc::new(provider),
            ParticipationPolicy::default(),
        );
        (service, players)
    }

    fn order(id: &str, status: OrderStatus, items: Vec<OrderLineItem>) -> Order {
        Order {
            id: id.to_string(),
            status,
            line_items: items,
        }
    }

    #[tokio::test]
    async fn counts_only_policy_statuses() {
        let (service, _) = setup(vec![
            order(
                "o-1",
                OrderStatus::Completed,
                vec![line_item("Spring Camp", None, by_index(0))],
            ),
            order(
                "o-2",
                OrderStatus::Processing,
                vec![line_item("Summer Camp", None, by_index(0))],
            ),
            order(
                "o-3",
                OrderStatus::Cancelled,
                vec![line_item("Autumn Camp", None, by_index(0))],
            ),
        ])
        .await;

        assert_eq!(service.count_events("g-1", 0).await.unwrap(), 2);
        assert_eq!(service.count_events("g-1", 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn name_reference_counts_toward_the_right_player() {
        let (service, _) = setup(vec![order(
            "o-1",
            OrderStatus::Completed,
            vec![
                line_item("Spring Camp", None, by_name("noah keller")),
                line_item("Summer Camp", None, by_name("Mia Keller")),
                line_item("Winter Camp", None, by_name("Unknown Child")),
            ],
        )])
        .await;

        assert_eq!(service.count_events("g-1", 0).await.unwrap(), 1);
        assert_eq!(service.count_events("g-1", 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn stale_index_is_overridden_by_name() {
        let (service, _) = setup(vec![order(
            "o-1",
            OrderStatus::Completed,
            vec![line_item(
                "Spring Camp",
                None,
                LineItemPlayerRef {
                    player_id: None,
                    record_index: Some(0),
                    assigned_attendee_name: Some("Noah Keller".to_string()),
                },
            )],
        )])
        .await;

        // The stale index points at Mia but the snapshot name says Noah
        assert_eq!(service.count_events("g-1", 0).await.unwrap(), 0);
        assert_eq!(service.count_events("g-1", 1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn malformed_line_items_are_skipped_not_fatal() {
        let (service, _) = setup(vec![order(
            "o-1",
            OrderStatus::Completed,
            vec![
                line_item("   ", None, by_index(0)),
                line_item("Spring Camp", None, by_index(0)),
            ],
        )])
        .await;

        assert_eq!(service.count_events("g-1", 0).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_player_index_is_not_found() {
        let (service, _) = setup(vec![]).await;
        let result = service.count_events("g-1", 9).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn history_classifies_past_and_upcoming() {
        let (service, _) = setup(vec![order(
            "o-1",
            OrderStatus::Completed,
            vec![
                line_item("Old Camp", Some("02/03/2019"), by_index(0)),
                line_item("Far Future Camp", Some("31/12/2099"), by_index(0)),
                line_item("No Date Camp", None, by_index(0)),
                line_item("Bad Date Camp", Some("2019-03-02"), by_index(0)),
            ],
        )])
        .await;

        let history = service.event_history("g-1", 0).await.unwrap();
        assert_eq!(history.len(), 4);

        let by_name: std::collections::HashMap<&str, &AttendedEvent> = history
            .iter()
            .map(|e| (e.event_name.as_str(), e))
            .collect();

        assert!(by_name["Old Camp"].past);
        assert!(!by_name["Far Future Camp"].past);
        // Missing and unparsable end dates are conservatively upcoming
        assert!(!by_name["No Date Camp"].past);
        assert!(!by_name["Bad Date Camp"].past);
        assert!(by_name["Bad Date Camp"].end_date.is_none());

        let past = service.past_events("g-1", 0).await.unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].event_name, "Old Camp");
    }

    #[tokio::test]
    async fn count_for_roster_matches_individual_counts() {
        let (service, players) = setup(vec![
            order(
                "o-1",
                OrderStatus::Completed,
                vec![
                    line_item("Spring Camp", None, by_index(0)),
                    line_item("Spring Camp", None, by_index(1)),
                ],
            ),
            order(
                "o-2",
                OrderStatus::Processing,
                vec![line_item("Summer Camp", None, by_name("Mia Keller"))],
            ),
        ])
        .await;

        let roster = players.list("g-1").await.unwrap();
        let counts = service.count_for_roster("g-1", &roster).await.unwrap();
        assert_eq!(counts, vec![2, 1]);
    }
}
