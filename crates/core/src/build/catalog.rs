//! The list of parts the PC Builder offers.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{BuildComponent, BuildError, ComponentCategory, ComponentId, Selection};
use crate::types::CurrencyCode;

/// Builder parts, loaded once from JSON.
///
/// ```json
/// {"currency": "USD", "components": [{"id": "cpu-1", "category": "cpu", ...}]}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentCatalog {
    /// Currency all component prices are quoted in.
    #[serde(default)]
    pub currency: CurrencyCode,
    components: Vec<BuildComponent>,
    #[serde(skip)]
    index: HashMap<ComponentId, usize>,
}

impl ComponentCatalog {
    /// Build a catalog from already-parsed components.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DuplicateComponent`] if two parts share an id.
    pub fn new(
        currency: CurrencyCode,
        components: Vec<BuildComponent>,
    ) -> Result<Self, BuildError> {
        let mut index = HashMap::with_capacity(components.len());
        for (position, component) in components.iter().enumerate() {
            if component.id.as_str().trim().is_empty() {
                return Err(BuildError::InvalidCatalog(format!(
                    "component at position {position} has an empty id"
                )));
            }
            if index.insert(component.id.clone(), position).is_some() {
                return Err(BuildError::DuplicateComponent(component.id.clone()));
            }
        }
        Ok(Self {
            currency,
            components,
            index,
        })
    }

    /// Parse and validate a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::InvalidCatalog`] for malformed JSON and
    /// [`BuildError::DuplicateComponent`] for repeated ids.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        let raw: Self =
            serde_json::from_str(json).map_err(|e| BuildError::InvalidCatalog(e.to_string()))?;
        Self::new(raw.currency, raw.components)
    }

    #[must_use]
    pub fn get(&self, id: &ComponentId) -> Option<&BuildComponent> {
        self.index
            .get(id)
            .and_then(|&position| self.components.get(position))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> impl Iterator<Item = &BuildComponent> {
        self.components.iter()
    }

    /// Parts for one slot, in catalog order.
    pub fn by_category(
        &self,
        category: ComponentCategory,
    ) -> impl Iterator<Item = &BuildComponent> {
        self.components
            .iter()
            .filter(move |c| c.category == category)
    }

    /// Turn stored slot-to-id pairs back into a selection.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownComponent`] when an id is not in the
    /// catalog and [`BuildError::WrongSlot`] when it is filed under the wrong
    /// slot.
    pub fn resolve(
        &self,
        ids: &BTreeMap<ComponentCategory, ComponentId>,
    ) -> Result<Selection, BuildError> {
        let mut selection = Selection::new();
        for (slot, id) in ids {
            let component = self
                .get(id)
                .ok_or_else(|| BuildError::UnknownComponent(id.clone()))?;
            selection.place(*slot, component.clone())?;
        }
        Ok(selection)
    }

    /// Like [`resolve`](Self::resolve) but drops entries that no longer
    /// resolve, e.g. after a catalog update removed a part.
    #[must_use]
    pub fn resolve_lossy(&self, ids: &BTreeMap<ComponentCategory, ComponentId>) -> Selection {
        ids.iter()
            .filter_map(|(slot, id)| self.get(id).filter(|c| c.category == *slot).cloned())
            .collect()
    }
}
