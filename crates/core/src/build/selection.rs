//! The set of parts a visitor has picked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{BuildComponent, BuildError, ComponentCategory, ComponentId};

/// One component per slot, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<ComponentCategory, BuildComponent>);

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a component into its own slot, returning whatever it replaced.
    pub fn select(&mut self, component: BuildComponent) -> Option<BuildComponent> {
        self.0.insert(component.category, component)
    }

    /// Put a component into `slot`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::WrongSlot`] if the component belongs to another
    /// category.
    pub fn place(
        &mut self,
        slot: ComponentCategory,
        component: BuildComponent,
    ) -> Result<Option<BuildComponent>, BuildError> {
        if component.category != slot {
            return Err(BuildError::WrongSlot {
                slot,
                component: component.id,
                category: component.category,
            });
        }
        Ok(self.select(component))
    }

    pub fn remove(&mut self, slot: ComponentCategory) -> Option<BuildComponent> {
        self.0.remove(&slot)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn get(&self, slot: ComponentCategory) -> Option<&BuildComponent> {
        self.0.get(&slot)
    }

    #[must_use]
    pub fn contains(&self, slot: ComponentCategory) -> bool {
        self.0.contains_key(&slot)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected components in slot order.
    pub fn components(&self) -> impl Iterator<Item = &BuildComponent> {
        self.0.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentCategory, &BuildComponent)> {
        self.0.iter().map(|(slot, component)| (*slot, component))
    }

    /// Slot to component id, the form a selection is stored in between requests.
    #[must_use]
    pub fn ids(&self) -> BTreeMap<ComponentCategory, ComponentId> {
        self.0
            .iter()
            .map(|(slot, component)| (*slot, component.id.clone()))
            .collect()
    }
}

impl FromIterator<BuildComponent> for Selection {
    fn from_iter<I: IntoIterator<Item = BuildComponent>>(iter: I) -> Self {
        let mut selection = Self::new();
        for component in iter {
            selection.select(component);
        }
        selection
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn part(id: &str, category: ComponentCategory) -> BuildComponent {
        BuildComponent {
            id: ComponentId::new(id),
            category,
            name: id.to_owned(),
            brand: String::new(),
            price: Decimal::ONE,
            power_draw: 0,
            performance_score: 0.0,
            specs: BTreeMap::new(),
            compatibility: Vec::new(),
            image: None,
        }
    }

    #[test]
    fn test_select_replaces_same_slot() {
        let mut selection = Selection::new();
        assert!(selection.select(part("gpu-a", ComponentCategory::Gpu)).is_none());
        let replaced = selection.select(part("gpu-b", ComponentCategory::Gpu)).unwrap();
        assert_eq!(replaced.id.as_str(), "gpu-a");
        assert_eq!(selection.len(), 1);
        assert_eq!(
            selection.get(ComponentCategory::Gpu).unwrap().id.as_str(),
            "gpu-b"
        );
    }

    #[test]
    fn test_place_rejects_wrong_slot() {
        let mut selection = Selection::new();
        let err = selection
            .place(ComponentCategory::Cpu, part("ram-a", ComponentCategory::Ram))
            .unwrap_err();
        assert!(matches!(err, BuildError::WrongSlot { slot: ComponentCategory::Cpu, .. }));
        assert!(selection.is_empty());
    }

    #[test]
    fn test_ids_and_serde_shape() {
        let selection: Selection = [
            part("cpu-a", ComponentCategory::Cpu),
            part("case-a", ComponentCategory::Case),
        ]
        .into_iter()
        .collect();

        let ids = selection.ids();
        assert_eq!(ids[&ComponentCategory::Case].as_str(), "case-a");

        let json = serde_json::to_value(&selection).unwrap();
        assert_eq!(json["cpu"]["id"], "cpu-a");
    }
}
