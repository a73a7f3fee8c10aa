use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use super::types::{EditedPlayer, PlayerPatch, PlayerResponse, PlayerSubmission};
use crate::shared::{AppError, AppState};

/// HTTP handler for a guardian submitting a new player record
///
/// POST /guardians/{guardian_id}/players
#[instrument(name = "submit_player", skip(state, submission))]
pub async fn submit_player(
    State(state): State<AppState>,
    Path(guardian_id): Path<String>,
    Json(submission): Json<PlayerSubmission>,
) -> Result<Json<PlayerResponse>, AppError> {
    let player = state.player_service.submit(&guardian_id, submission).await?;
    info!(guardian_id = %guardian_id, index = player.index, "Player submitted");
    Ok(Json(player))
}

/// HTTP handler for listing a guardian's roster in insertion order
///
/// GET /guardians/{guardian_id}/players
#[instrument(name = "list_players", skip(state))]
pub async fn list_players(
    State(state): State<AppState>,
    Path(guardian_id): Path<String>,
) -> Result<Json<Vec<PlayerResponse>>, AppError> {
    let roster = state.player_service.list(&guardian_id).await?;
    Ok(Json(roster))
}

/// GET /guardians/{guardian_id}/players/{index}
#[instrument(name = "get_player", skip(state))]
pub async fn get_player(
    State(state): State<AppState>,
    Path((guardian_id, index)): Path<(String, usize)>,
) -> Result<Json<PlayerResponse>, AppError> {
    let player = state.player_service.get(&guardian_id, index).await?;
    Ok(Json(player))
}

/// PATCH /guardians/{guardian_id}/players/{index}
#[instrument(name = "edit_player", skip(state, patch))]
pub async fn edit_player(
    State(state): State<AppState>,
    Path((guardian_id, index)): Path<(String, usize)>,
    Json(patch): Json<PlayerPatch>,
) -> Result<Json<EditedPlayer>, AppError> {
    let edited = state.player_service.edit(&guardian_id, index, patch).await?;
    Ok(Json(edited))
}

/// DELETE /guardians/{guardian_id}/players/{index}
#[instrument(name = "delete_player", skip(state))]
pub async fn delete_player(
    State(state): State<AppState>,
    Path((guardian_id, index)): Path<(String, usize)>,
) -> Result<Json<Value>, AppError> {
    state.player_service.remove(&guardian_id, index).await?;
    Ok(Json(json!({ "deleted": true })))
}

/// Account-deletion flow: removes the guardian's whole roster at once
///
/// DELETE /guardians/{guardian_id}/players
#[instrument(name = "delete_roster", skip(state))]
pub async fn delete_roster(
    State(state): State<AppState>,
    Path(guardian_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let dropped = state.player_service.remove_all(&guardian_id).await?;
    Ok(Json(json!({ "deleted": dropped })))
}
