//! PC Builder: component slots, compatibility rules and build scoring.
//!
//! Everything here is pure. A [`Selection`] plus a [`RuleSet`] yields a
//! [`BuildSummary`]; the storefront only renders it.

mod catalog;
mod component;
mod rules;
mod selection;
mod summary;

pub use catalog::ComponentCatalog;
pub use component::{BuildComponent, ComponentCategory, ComponentId};
pub use rules::{
    recommended_psu_watts, CompatibilityWarning, Rule, RuleProfile, RuleSet, Severity,
    DEFAULT_LARGE_GPU_PRICE, ROOMY_CASE_TAGS,
};
pub use selection::Selection;
pub use summary::BuildSummary;

/// Errors from building or resolving a selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("unknown component category: {0}")]
    UnknownCategory(String),

    #[error("component {component} is a {category} part and cannot go in the {slot} slot")]
    WrongSlot {
        slot: ComponentCategory,
        component: ComponentId,
        category: ComponentCategory,
    },

    #[error("unknown component: {0}")]
    UnknownComponent(ComponentId),

    #[error("duplicate component id in catalog: {0}")]
    DuplicateComponent(ComponentId),

    #[error("invalid component catalog: {0}")]
    InvalidCatalog(String),
}
