//! PC Builder route handlers.
//!
//! The visitor's picks live in the session as `category -> component id` and
//! are resolved against the catalog on every request. HTMX requests get the
//! builder panel back; plain form posts redirect to the page.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use rigbay_core::CurrencyCode;
use rigbay_core::build::{
    BuildComponent, BuildError, BuildSummary, ComponentCategory, ComponentId, Selection, Severity,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{Layout, is_htmx, money, set_flash};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::services::PcBuilder;
use crate::state::AppState;

/// Stored picks, as kept in the session.
pub type BuildIds = BTreeMap<ComponentCategory, ComponentId>;

// =============================================================================
// Views
// =============================================================================

/// One candidate part for a slot.
#[derive(Clone)]
pub struct PartView {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub price: String,
    pub power_draw: u32,
    pub score: f64,
    pub specs: String,
    pub selected: bool,
}

impl PartView {
    fn new(component: &BuildComponent, currency: CurrencyCode, selected: bool) -> Self {
        Self {
            id: component.id.to_string(),
            name: component.name.clone(),
            brand: component.brand.clone(),
            price: money(component.price, currency),
            power_draw: component.power_draw,
            score: component.performance_score,
            specs: component.spec_text(),
            selected,
        }
    }
}

/// A build slot with its current pick and the parts on offer.
#[derive(Clone)]
pub struct SlotView {
    pub category: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub selected: Option<PartView>,
    pub options: Vec<PartView>,
}

/// A compatibility warning for templates.
#[derive(Clone)]
pub struct WarningView {
    pub code: &'static str,
    pub is_error: bool,
    pub message: String,
}

/// The running totals sidebar.
#[derive(Clone)]
pub struct SummaryView {
    pub total_price: String,
    pub power_draw: u32,
    pub recommended_psu_watts: u32,
    pub progress: u8,
    pub performance_score: f64,
    pub warnings: Vec<WarningView>,
    pub missing: Vec<&'static str>,
    pub complete: bool,
    pub compatible: bool,
}

impl SummaryView {
    fn new(summary: &BuildSummary, currency: CurrencyCode) -> Self {
        Self {
            total_price: money(summary.total_price, currency),
            power_draw: summary.power_draw,
            recommended_psu_watts: summary.recommended_psu_watts,
            progress: summary.progress_rounded(),
            performance_score: summary.performance_score,
            warnings: summary
                .warnings
                .iter()
                .map(|w| WarningView {
                    code: w.code(),
                    is_error: w.severity() == Severity::Error,
                    message: w.message(),
                })
                .collect(),
            missing: summary
                .missing_required
                .iter()
                .map(ComponentCategory::label)
                .collect(),
            complete: summary.is_complete(),
            compatible: summary.is_compatible(),
        }
    }
}

/// Everything the builder panel renders.
#[derive(Clone)]
pub struct BuilderPanel {
    pub slots: Vec<SlotView>,
    pub summary: SummaryView,
    pub rules: &'static str,
    pub error: Option<String>,
}

impl BuilderPanel {
    #[must_use]
    pub fn new(builder: &PcBuilder, selection: &Selection) -> Self {
        let currency = builder.catalog().currency;
        let slots = ComponentCategory::ALL
            .into_iter()
            .map(|category| {
                let current = selection.get(category);
                SlotView {
                    category: category.as_str(),
                    label: category.label(),
                    required: category.is_required(),
                    selected: current.map(|c| PartView::new(c, currency, true)),
                    options: builder
                        .options(category)
                        .into_iter()
                        .map(|c| {
                            let picked = current.is_some_and(|cur| cur.id == c.id);
                            PartView::new(c, currency, picked)
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            slots,
            summary: SummaryView::new(&builder.summarize(selection), currency),
            rules: builder.rules().profile.as_str(),
            error: None,
        }
    }

    fn with_error(mut self, message: String) -> Self {
        self.error = Some(message);
        self
    }
}

// =============================================================================
// Templates
// =============================================================================

/// PC Builder page template.
#[derive(Template, WebTemplate)]
#[template(path = "pc_builder/show.html")]
pub struct PcBuilderTemplate {
    pub layout: Layout,
    pub panel: BuilderPanel,
}

/// Builder panel fragment for HTMX swaps.
#[derive(Template, WebTemplate)]
#[template(path = "partials/build_summary.html")]
pub struct BuilderPanelTemplate {
    pub panel: BuilderPanel,
}

// =============================================================================
// Forms
// =============================================================================

/// Pick a part for a slot.
#[derive(Debug, Deserialize)]
pub struct SelectForm {
    pub category: String,
    pub component_id: String,
}

/// Empty a slot.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub category: String,
}

// =============================================================================
// Session
// =============================================================================

async fn load_ids(session: &Session) -> BuildIds {
    session
        .get::<BuildIds>(session_keys::PC_BUILD)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn save(session: &Session, selection: &Selection) -> Result<()> {
    session
        .insert(session_keys::PC_BUILD, selection.ids())
        .await?;
    Ok(())
}

/// Apply a change to the stored selection.
async fn update(
    builder: &PcBuilder,
    session: &Session,
    change: impl FnOnce(&mut Selection) -> std::result::Result<(), BuildError>,
) -> Result<(Selection, Option<BuildError>)> {
    let mut selection = builder.selection(&load_ids(session).await);
    match change(&mut selection) {
        Ok(()) => {
            save(session, &selection).await?;
            Ok((selection, None))
        }
        Err(e) => Ok((selection, Some(e))),
    }
}

/// Reply to a builder change: the panel for HTMX, else back to the page.
async fn respond(
    builder: &PcBuilder,
    session: &Session,
    headers: &HeaderMap,
    selection: &Selection,
    error: Option<BuildError>,
) -> Response {
    if is_htmx(headers) {
        let mut panel = BuilderPanel::new(builder, selection);
        if let Some(e) = error {
            panel = panel.with_error(e.to_string());
        }
        return BuilderPanelTemplate { panel }.into_response();
    }
    if let Some(e) = error {
        set_flash(session, e.to_string()).await;
    }
    Redirect::to("/pc-builder").into_response()
}

// =============================================================================
// Routes
// =============================================================================

/// Display the builder.
#[instrument(skip(state, session, customer))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(customer): OptionalAuth,
) -> impl IntoResponse {
    let builder = state.builder();
    let selection = builder.selection(&load_ids(&session).await);
    PcBuilderTemplate {
        layout: Layout::load(&session, customer.as_ref()).await,
        panel: BuilderPanel::new(builder, &selection),
    }
}

/// Put a part in its slot, replacing whatever was there.
#[instrument(skip(state, session, headers))]
pub async fn select(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<SelectForm>,
) -> Result<Response> {
    let builder = state.builder();
    let (selection, error) = update(builder, &session, |selection| {
        let slot: ComponentCategory = form.category.parse()?;
        let id = ComponentId::new(form.component_id.trim());
        let component = builder
            .catalog()
            .get(&id)
            .cloned()
            .ok_or(BuildError::UnknownComponent(id))?;
        selection.place(slot, component)?;
        Ok(())
    })
    .await?;

    if let Some(e) = &error {
        tracing::debug!(error = %e, "Rejected PC Builder pick");
    }
    Ok(respond(builder, &session, &headers, &selection, error).await)
}

/// Empty one slot.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveForm>,
) -> Result<Response> {
    let builder = state.builder();
    let (selection, error) = update(builder, &session, |selection| {
        let slot: ComponentCategory = form.category.parse()?;
        selection.remove(slot);
        Ok(())
    })
    .await?;
    Ok(respond(builder, &session, &headers, &selection, error).await)
}

/// Start over.
#[instrument(skip(state, session, headers))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let builder = state.builder();
    let (selection, error) = update(builder, &session, |selection| {
        selection.clear();
        Ok(())
    })
    .await?;
    Ok(respond(builder, &session, &headers, &selection, error).await)
}
