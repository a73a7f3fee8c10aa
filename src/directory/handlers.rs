use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::str::FromStr;
use tracing::instrument;

use super::types::{DirectoryFilters, DirectoryPage};
use crate::eligibility::AgeGroup;
use crate::player::models::Gender;
use crate::shared::{AppError, AppState};

const DEFAULT_PAGE_SIZE: usize = 20;

/// Query parameters for the administrative directory view
#[derive(Debug, Default, Deserialize)]
pub struct DirectoryQuery {
    pub search: Option<String>,
    pub region: Option<String>,
    pub gender: Option<String>,
    pub age_group: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    /// Escape hatch: recompute even when a cached page exists
    #[serde(default)]
    pub refresh: bool,
}

/// HTTP handler for the cross-account player directory
///
/// GET /directory
#[instrument(name = "directory_page", skip(state))]
pub async fn directory_page(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<DirectoryPage>, AppError> {
    let gender = query
        .gender
        .as_deref()
        .filter(|g| !g.is_empty())
        .map(|g| {
            Gender::from_str(g)
                .map_err(|_| AppError::validation("gender", format!("unknown gender '{}'", g)))
        })
        .transpose()?;

    let age_group = query
        .age_group
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|a| {
            AgeGroup::from_str(a).map_err(|_| {
                AppError::validation("age_group", format!("unknown age group '{}'", a))
            })
        })
        .transpose()?;

    let filters = DirectoryFilters {
        search: query.search.filter(|s| !s.trim().is_empty()),
        region: query.region.filter(|r| !r.trim().is_empty()),
        gender,
        age_group,
    };

    let page = state
        .directory_service
        .build_page(
            filters,
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(DEFAULT_PAGE_SIZE),
            query.refresh,
        )
        .await?;

    Ok(Json(page))
}
