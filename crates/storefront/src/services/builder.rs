//! PC Builder service: the component catalog plus the active rule set.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use rigbay_core::build::{
    BuildComponent, BuildError, BuildSummary, ComponentCatalog, ComponentCategory, ComponentId,
    RuleSet, Selection,
};
use tracing::{info, warn};

use crate::config::BuilderConfig;

/// Catalog shipped with the binary.
const BUNDLED_CATALOG: &str = include_str!("../../data/pc_components.json");

/// Errors loading the builder catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Catalog and rules shared by every builder request.
#[derive(Clone)]
pub struct PcBuilder {
    catalog: Arc<ComponentCatalog>,
    rules: RuleSet,
}

impl PcBuilder {
    #[must_use]
    pub fn new(catalog: ComponentCatalog, rules: RuleSet) -> Self {
        Self {
            catalog: Arc::new(catalog),
            rules,
        }
    }

    /// Load the catalog from `PC_BUILDER_CATALOG_PATH` or the bundled file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't a valid catalog.
    pub fn load(config: &BuilderConfig) -> Result<Self, CatalogLoadError> {
        let catalog = match &config.catalog_path {
            Some(path) => Self::read_catalog(path)?,
            None => ComponentCatalog::from_json(BUNDLED_CATALOG)?,
        };
        info!(
            components = catalog.len(),
            rules = config.rules.as_str(),
            "PC Builder catalog loaded"
        );
        Ok(Self::new(catalog, RuleSet::new(config.rules)))
    }

    fn read_catalog(path: &Path) -> Result<ComponentCatalog, CatalogLoadError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(ComponentCatalog::from_json(&json)?)
    }

    #[must_use]
    pub fn catalog(&self) -> &ComponentCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Parts offered for one slot, cheapest first.
    #[must_use]
    pub fn options(&self, category: ComponentCategory) -> Vec<&BuildComponent> {
        let mut parts: Vec<_> = self.catalog.by_category(category).collect();
        parts.sort_by(|a, b| a.price.cmp(&b.price).then_with(|| a.name.cmp(&b.name)));
        parts
    }

    /// Resolve stored ids into a selection.
    ///
    /// Ids that no longer resolve (catalog changed since the session was
    /// written) are dropped with a warning rather than failing the page.
    #[must_use]
    pub fn selection(&self, ids: &BTreeMap<ComponentCategory, ComponentId>) -> Selection {
        let selection = self.catalog.resolve_lossy(ids);
        if selection.len() < ids.len() {
            warn!(
                stored = ids.len(),
                resolved = selection.len(),
                "Dropped unknown PC Builder components"
            );
        }
        selection
    }

    /// Resolve ids strictly, for API callers that sent them explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] for unknown ids or a part in the wrong slot.
    pub fn resolve(
        &self,
        ids: &BTreeMap<ComponentCategory, ComponentId>,
    ) -> Result<Selection, BuildError> {
        self.catalog.resolve(ids)
    }

    #[must_use]
    pub fn summarize(&self, selection: &Selection) -> BuildSummary {
        BuildSummary::compute(selection, &self.rules)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rigbay_core::build::RuleProfile;
    use rigbay_core::CurrencyCode;

    use super::*;

    fn bundled() -> PcBuilder {
        PcBuilder::load(&BuilderConfig::default()).unwrap()
    }

    #[test]
    fn test_bundled_catalog_covers_every_slot() {
        let builder = bundled();
        assert_eq!(builder.catalog().currency, CurrencyCode::USD);
        for category in ComponentCategory::ALL {
            assert!(
                !builder.options(category).is_empty(),
                "no parts for {category}"
            );
        }
    }

    #[test]
    fn test_options_sorted_by_price() {
        let builder = bundled();
        let gpus = builder.options(ComponentCategory::Gpu);
        assert!(gpus.windows(2).all(|w| w[0].price <= w[1].price));
    }

    #[test]
    fn test_selection_drops_unknown_ids() {
        let builder = bundled();
        let ids = BTreeMap::from([
            (ComponentCategory::Cpu, ComponentId::new("cpu-r5-7600x")),
            (ComponentCategory::Gpu, ComponentId::new("gpu-discontinued")),
        ]);
        let selection = builder.selection(&ids);
        assert_eq!(selection.len(), 1);
        assert!(builder.resolve(&ids).is_err());
    }

    #[test]
    fn test_bundled_mismatched_build_warns() {
        let builder = bundled();
        let ids = BTreeMap::from([
            (ComponentCategory::Cpu, ComponentId::new("cpu-i7-14700k")),
            (ComponentCategory::Motherboard, ComponentId::new("mb-b650-tomahawk")),
        ]);
        let summary = builder.summarize(&builder.resolve(&ids).unwrap());
        assert!(!summary.is_compatible());
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = BuilderConfig {
            rules: RuleProfile::Standard,
            catalog_path: Some("/nonexistent/pc_components.json".into()),
        };
        let err = PcBuilder::load(&config).err().unwrap();
        assert!(matches!(err, CatalogLoadError::Io { .. }));
    }
}
