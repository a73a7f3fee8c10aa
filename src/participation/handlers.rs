use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tracing::instrument;

use super::service::AttendedEvent;
use crate::shared::{AppError, AppState};

#[derive(Debug, Serialize)]
pub struct EventHistoryResponse {
    pub events_attended: u32,
    pub events: Vec<AttendedEvent>,
}

/// HTTP handler for a player's participation summary
///
/// GET /guardians/{guardian_id}/players/{index}/events
#[instrument(name = "player_events", skip(state))]
pub async fn player_events(
    State(state): State<AppState>,
    Path((guardian_id, index)): Path<(String, usize)>,
) -> Result<Json<EventHistoryResponse>, AppError> {
    let events = state
        .participation_service
        .event_history(&guardian_id, index)
        .await?;

    Ok(Json(EventHistoryResponse {
        events_attended: events.len() as u32,
        events,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::models::{LineItemPlayerRef, Order, OrderLineItem, OrderStatus};
    use crate::orders::provider::InMemoryOrderProvider;
    use crate::player::types::PlayerSubmission;
    use crate::shared::test_utils::AppStateBuilder;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Router,
    };
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tower::ServiceExt; // for `oneshot`

    #[tokio::test]
    async fn returns_history_for_a_known_player() {
        let orders = Arc::new(InMemoryOrderProvider::new());
        orders
            .record_order(
                "g-1",
                Order {
                    id: "o-1".to_string(),
                    status: OrderStatus::Completed,
                    line_items: vec![OrderLineItem {
                        event_name: "Spring Camp".to_string(),
                        venue: Some("Sports Hall".to_string()),
                        event_end_date: Some("02/03/2019".to_string()),
                        player_ref: LineItemPlayerRef {
                            player_id: None,
                            record_index: Some(0),
                            assigned_attendee_name: Some("Mia Keller".to_string()),
                        },
                    }],
                },
            )
            .await;

        let app_state = AppStateBuilder::new()
            .with_order_provider(orders)
            .build();
        app_state
            .player_service
            .submit(
                "g-1",
                PlayerSubmission {
                    first_name: "Mia".to_string(),
                    last_name: "Keller".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(2017, 3, 2).unwrap(),
                    gender: crate::player::models::Gender::Female,
                    national_insurance_number: None,
                    medical_conditions: None,
                    region: None,
                },
            )
            .await
            .unwrap();

        let app = Router::new()
            .route(
                "/guardians/:guardian_id/players/:index/events",
                get(player_events),
            )
            .with_state(app_state);

        let request = Request::builder()
            .method("GET")
            .uri("/guardians/g-1/players/0/events")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let payload: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload["events_attended"], 1);
        assert_eq!(payload["events"][0]["event_name"], "Spring Camp");
        assert_eq!(payload["events"][0]["past"], true);
    }

    #[tokio::test]
    async fn unknown_index_is_not_found() {
        let app_state = AppStateBuilder::new().build();
        let app = Router::new()
            .route(
                "/guardians/:guardian_id/players/:index/events",
                get(player_events),
            )
            .with_state(app_state);

        let request = Request::builder()
            .method("GET")
            .uri("/guardians/g-1/players/4/events")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
