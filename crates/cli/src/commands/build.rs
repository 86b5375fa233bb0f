//! PC Builder commands.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate a build file against the extended rules
//! rigbay build evaluate my-build.yaml
//!
//! # Standard rules only, failing on blocking issues
//! rigbay build evaluate my-build.yaml --rules standard --strict
//!
//! # Show the rule table
//! rigbay build rules --rules standard
//! ```
//!
//! A build file is a list of components, or a catalog-shaped document with a
//! `components` key:
//!
//! ```yaml
//! - id: cpu-7800x3d
//!   category: cpu
//!   name: Ryzen 7 7800X3D
//!   price: 142000
//!   powerDraw: 120
//!   performanceScore: 92
//!   specs: { socket: AM5 }
//! ```

use std::path::Path;

use rigbay_core::build::{
    BuildComponent, BuildSummary, ComponentCategory, RuleProfile, RuleSet, Selection, Severity,
};
use rigbay_core::{CurrencyCode, Price};
use serde::Deserialize;
use tracing::{info, warn};

use super::read_document;
use crate::error::CliError;

#[derive(Deserialize)]
#[serde(untagged)]
enum BuildFile {
    List(Vec<BuildComponent>),
    Document {
        #[serde(default)]
        currency: Option<CurrencyCode>,
        components: Vec<BuildComponent>,
    },
}

impl BuildFile {
    fn into_parts(self) -> (Option<CurrencyCode>, Vec<BuildComponent>) {
        match self {
            Self::List(components) => (None, components),
            Self::Document {
                currency,
                components,
            } => (currency, components),
        }
    }
}

/// Evaluate a build file and log the summary.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, if it names two
/// parts for one slot, or if `strict` is set and the build is incompatible.
pub async fn evaluate(
    path: &Path,
    profile: RuleProfile,
    currency: Option<CurrencyCode>,
    strict: bool,
) -> Result<(), CliError> {
    let file: BuildFile = read_document(path).await?;
    let (file_currency, components) = file.into_parts();
    let currency = currency.or(file_currency).unwrap_or_default();

    let selection = selection_from(components)?;
    let summary = BuildSummary::compute(&selection, &RuleSet::new(profile));

    info!(path = %path.display(), rules = profile.as_str(), "Evaluated build");
    for line in report(&selection, &summary, currency) {
        info!("{line}");
    }

    let blocking = summary
        .warnings
        .iter()
        .filter(|w| w.severity() == Severity::Error)
        .count();
    if strict && blocking > 0 {
        return Err(CliError::Incompatible(blocking));
    }
    if blocking > 0 {
        warn!("Build has {blocking} blocking issue(s); pass --strict to fail on them");
    }
    Ok(())
}

/// Log the rule table for a profile.
pub fn rules(profile: RuleProfile) {
    for line in rule_table(profile) {
        info!("{line}");
    }
}

/// Place every component in its slot, refusing two parts for one slot.
fn selection_from(components: Vec<BuildComponent>) -> Result<Selection, CliError> {
    let mut selection = Selection::new();
    for component in components {
        let category = component.category;
        if selection.select(component).is_some() {
            return Err(CliError::DuplicateSlot(category));
        }
    }
    Ok(selection)
}

fn report(selection: &Selection, summary: &BuildSummary, currency: CurrencyCode) -> Vec<String> {
    let mut lines = Vec::new();

    for slot in ComponentCategory::ALL {
        match selection.get(slot) {
            Some(part) => lines.push(format!(
                "{:<12} {} ({})",
                slot.label(),
                part.name,
                Price::new(part.price, currency).display()
            )),
            None if slot.is_required() => lines.push(format!("{:<12} (empty)", slot.label())),
            None => {}
        }
    }

    lines.push(format!(
        "Total: {}",
        Price::new(summary.total_price, currency).display()
    ));
    lines.push(format!(
        "Power draw: {}W (recommended PSU {}W)",
        summary.power_draw, summary.recommended_psu_watts
    ));
    lines.push(format!("Performance: {:.0}/100", summary.performance_score));
    lines.push(format!("Progress: {}%", summary.progress_rounded()));

    if !summary.missing_required.is_empty() {
        let missing: Vec<&str> = summary
            .missing_required
            .iter()
            .map(ComponentCategory::label)
            .collect();
        lines.push(format!("Missing: {}", missing.join(", ")));
    }

    if summary.warnings.is_empty() {
        lines.push("No compatibility issues".to_string());
    }
    for warning in &summary.warnings {
        let level = match warning.severity() {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN",
        };
        lines.push(format!("[{level}] {}: {}", warning.code(), warning.message()));
    }

    lines
}

fn rule_table(profile: RuleProfile) -> Vec<String> {
    let mut lines = vec![format!("Rule profile: {}", profile.as_str())];
    for rule in profile.rules() {
        let slots: Vec<&str> = rule.slots().iter().map(ComponentCategory::as_str).collect();
        lines.push(format!(
            "  {:<28} [{}] {}",
            serde_json::to_value(rule)
                .ok()
                .and_then(|v| v.as_str().map(String::from))
                .unwrap_or_default(),
            slots.join(", "),
            rule.describe()
        ));
    }
    lines
}
