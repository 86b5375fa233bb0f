//! PC Builder component records.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

static DDR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDDR\s?([2-6])").expect("DDR pattern is a valid regex"));

static WATTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{2,5})\s*(?i:w|watts?)?\s*$").expect("wattage pattern is a valid regex")
});

/// Hardware slot in a build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Cpu,
    Motherboard,
    Ram,
    Gpu,
    Storage,
    Psu,
    Case,
    Cooling,
}

impl ComponentCategory {
    /// Every slot in display order.
    pub const ALL: [Self; 8] = [
        Self::Cpu,
        Self::Motherboard,
        Self::Ram,
        Self::Gpu,
        Self::Storage,
        Self::Psu,
        Self::Case,
        Self::Cooling,
    ];

    /// Slots a build needs before it counts as complete.
    pub const REQUIRED: [Self; 7] = [
        Self::Cpu,
        Self::Motherboard,
        Self::Ram,
        Self::Gpu,
        Self::Storage,
        Self::Psu,
        Self::Case,
    ];

    #[must_use]
    pub const fn is_required(&self) -> bool {
        !matches!(self, Self::Cooling)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Motherboard => "motherboard",
            Self::Ram => "ram",
            Self::Gpu => "gpu",
            Self::Storage => "storage",
            Self::Psu => "psu",
            Self::Case => "case",
            Self::Cooling => "cooling",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Cpu => "Processor",
            Self::Motherboard => "Motherboard",
            Self::Ram => "Memory",
            Self::Gpu => "Graphics Card",
            Self::Storage => "Storage",
            Self::Psu => "Power Supply",
            Self::Case => "Case",
            Self::Cooling => "CPU Cooler",
        }
    }
}

impl std::fmt::Display for ComponentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComponentCategory {
    type Err = super::BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| super::BuildError::UnknownCategory(s.to_owned()))
    }
}

/// Catalog identifier of a builder component, e.g. `cpu-ryzen-7600`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A part that can be placed in a build.
///
/// `specs` is free-form (`{"socket": "AM5", "memory": "DDR5", "wattage": 750}`);
/// `compatibility` carries tags such as the socket a CPU fits or a case's
/// form factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildComponent {
    pub id: ComponentId,
    pub category: ComponentCategory,
    pub name: String,
    #[serde(default)]
    pub brand: String,
    pub price: Decimal,
    /// Estimated draw in watts.
    #[serde(default)]
    pub power_draw: u32,
    /// Relative performance on a 0-100 scale.
    #[serde(default)]
    pub performance_score: f64,
    #[serde(default)]
    pub specs: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub compatibility: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl BuildComponent {
    /// A spec value rendered as text; numbers and booleans are stringified.
    #[must_use]
    pub fn spec_str(&self, key: &str) -> Option<String> {
        match self.specs.get(key)? {
            serde_json::Value::String(s) => Some(s.trim().to_owned()).filter(|s| !s.is_empty()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Socket this part declares.
    ///
    /// CPUs use their first compatibility tag, then `specs.socket`. Other
    /// parts only declare a socket through `specs.socket`; their tags are
    /// form factors and the like.
    #[must_use]
    pub fn socket(&self) -> Option<String> {
        let spec = self.spec_str("socket");
        match self.category {
            ComponentCategory::Cpu => self
                .compatibility
                .first()
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .or(spec),
            _ => spec,
        }
    }

    /// Rated output in watts from `specs.wattage` (`750`, `"750W"`, `"750 watts"`).
    #[must_use]
    pub fn wattage(&self) -> Option<u32> {
        match self.specs.get("wattage")? {
            serde_json::Value::Number(n) => n.as_u64().and_then(|w| u32::try_from(w).ok()),
            serde_json::Value::String(s) => WATTS_RE
                .captures(s)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok()),
            _ => None,
        }
    }

    /// Memory generation such as `DDR5`, looked up in `specs.type`, then the
    /// name, then any other spec.
    #[must_use]
    pub fn memory_generation(&self) -> Option<String> {
        let candidates = self
            .spec_str("type")
            .into_iter()
            .chain(std::iter::once(self.name.clone()))
            .chain(std::iter::once(self.spec_text()));
        for text in candidates {
            if let Some(digit) = DDR_RE.captures(&text).and_then(|caps| caps.get(1)) {
                return Some(format!("DDR{}", digit.as_str()));
            }
        }
        None
    }

    /// All spec values and compatibility tags joined into one searchable string.
    #[must_use]
    pub fn spec_text(&self) -> String {
        let specs = self.specs.keys().filter_map(|key| self.spec_str(key));
        specs
            .chain(self.compatibility.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Form factor tags (`Mid Tower`, `ATX`, ...) from compatibility tags,
    /// `specs.formFactor` and `specs.type`.
    #[must_use]
    pub fn form_factor_tags(&self) -> Vec<String> {
        self.compatibility
            .iter()
            .cloned()
            .chain(self.spec_str("formFactor"))
            .chain(self.spec_str("type"))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn component(value: serde_json::Value) -> BuildComponent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_category_required_flags() {
        assert!(ComponentCategory::REQUIRED.iter().all(ComponentCategory::is_required));
        assert!(!ComponentCategory::Cooling.is_required());
        assert_eq!(
            ComponentCategory::ALL.iter().filter(|c| c.is_required()).count(),
            ComponentCategory::REQUIRED.len()
        );
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("GPU".parse::<ComponentCategory>().unwrap(), ComponentCategory::Gpu);
        assert!("monitor".parse::<ComponentCategory>().is_err());
    }

    #[test]
    fn test_cpu_socket_prefers_compatibility_tag() {
        let cpu = component(json!({
            "id": "cpu-1", "category": "cpu", "name": "Core i5", "price": 200,
            "specs": {"socket": "LGA1200"}, "compatibility": ["LGA1700"]
        }));
        assert_eq!(cpu.socket().as_deref(), Some("LGA1700"));

        let board = component(json!({
            "id": "mb-1", "category": "motherboard", "name": "Z790", "price": 200,
            "specs": {"socket": "LGA1700"}, "compatibility": ["ATX"]
        }));
        assert_eq!(board.socket().as_deref(), Some("LGA1700"));
    }

    #[test]
    fn test_board_socket_ignores_form_factor_tag() {
        let board = component(json!({
            "id": "mb-2", "category": "motherboard", "name": "Mystery Board", "price": 150,
            "compatibility": ["ATX"]
        }));
        assert_eq!(board.socket(), None);

        let cpu = component(json!({
            "id": "cpu-2", "category": "cpu", "name": "Core i7", "price": 300,
            "specs": {"socket": "LGA1700"}
        }));
        assert_eq!(cpu.socket().as_deref(), Some("LGA1700"));
    }

    #[test]
    fn test_wattage_parsing() {
        let psu = |w: serde_json::Value| {
            component(json!({
                "id": "psu", "category": "psu", "name": "PSU", "price": 90,
                "specs": {"wattage": w}
            }))
        };
        assert_eq!(psu(json!(750)).wattage(), Some(750));
        assert_eq!(psu(json!("650W")).wattage(), Some(650));
        assert_eq!(psu(json!("850 watts")).wattage(), Some(850));
        assert_eq!(psu(json!("lots")).wattage(), None);
    }

    #[test]
    fn test_memory_generation_sources() {
        let ram = component(json!({
            "id": "ram", "category": "ram", "name": "Vengeance 32GB", "price": 100,
            "specs": {"type": "ddr5-6000"}
        }));
        assert_eq!(ram.memory_generation().as_deref(), Some("DDR5"));

        let ram = component(json!({
            "id": "ram", "category": "ram", "name": "Fury DDR4 16GB", "price": 50
        }));
        assert_eq!(ram.memory_generation().as_deref(), Some("DDR4"));

        let ram = component(json!({
            "id": "ram", "category": "ram", "name": "Mystery Sticks", "price": 50
        }));
        assert_eq!(ram.memory_generation(), None);
    }
}
