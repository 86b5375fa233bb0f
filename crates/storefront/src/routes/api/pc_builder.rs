//! PC Builder JSON API.
//!
//! Stateless: callers send the whole selection and get the computed summary
//! back. Nothing is stored.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
};
use rigbay_core::CurrencyCode;
use rigbay_core::build::{
    BuildComponent, BuildSummary, ComponentCategory, ComponentId, RuleProfile,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiError;
use crate::state::AppState;

/// Query for the parts offered in one slot.
#[derive(Debug, Deserialize)]
pub struct ComponentsQuery {
    pub category: Option<String>,
}

/// Parts offered in one slot, cheapest first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentsResponse {
    pub category: ComponentCategory,
    pub label: &'static str,
    pub currency: CurrencyCode,
    pub components: Vec<BuildComponent>,
}

/// A selection to score: `{"selection": {"cpu": "cpu-r5-7600x", ...}}`.
#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub selection: BTreeMap<String, String>,
}

/// The computed summary plus the verdicts templates would otherwise derive.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: BuildSummary,
    pub is_complete: bool,
    pub is_compatible: bool,
    pub rules: RuleProfile,
    pub currency: CurrencyCode,
}

/// List the parts for one slot.
#[instrument(skip(state))]
pub async fn components(
    State(state): State<AppState>,
    Query(query): Query<ComponentsQuery>,
) -> Result<Json<ComponentsResponse>, ApiError> {
    let category: ComponentCategory = query
        .category
        .as_deref()
        .ok_or_else(|| ApiError::new("category is required"))?
        .parse()?;
    let builder = state.builder();

    Ok(Json(ComponentsResponse {
        category,
        label: category.label(),
        currency: builder.catalog().currency,
        components: builder.options(category).into_iter().cloned().collect(),
    }))
}

/// Score a selection.
///
/// Every id must exist and sit in its own slot; unlike the page, nothing is
/// silently dropped.
#[instrument(skip(state, request), fields(parts = request.selection.len()))]
pub async fn summary(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let ids = request
        .selection
        .iter()
        .map(|(slot, id)| Ok((slot.parse::<ComponentCategory>()?, ComponentId::new(id.trim()))))
        .collect::<Result<BTreeMap<_, _>, ApiError>>()?;

    let builder = state.builder();
    let selection = builder.resolve(&ids)?;
    let summary = builder.summarize(&selection);

    Ok(Json(SummaryResponse {
        is_complete: summary.is_complete(),
        is_compatible: summary.is_compatible(),
        rules: builder.rules().profile,
        currency: builder.catalog().currency,
        summary,
    }))
}
