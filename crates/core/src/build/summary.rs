//! Derived figures for a selection.

use rust_decimal::Decimal;
use serde::Serialize;

use super::{
    recommended_psu_watts, CompatibilityWarning, ComponentCategory, RuleSet, Selection, Severity,
};

/// Everything the builder page shows next to the selected parts.
///
/// Recomputed from scratch on every change; nothing here is stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSummary {
    pub total_price: Decimal,
    /// Sum of every selected part's estimated draw, in watts.
    pub power_draw: u32,
    /// `power_draw` plus 20% headroom, rounded up.
    pub recommended_psu_watts: u32,
    /// Share of required slots filled, 0-100.
    pub progress_pct: f64,
    /// Mean performance score of the selected parts, 0 when empty.
    pub performance_score: f64,
    pub warnings: Vec<CompatibilityWarning>,
    /// Required slots still empty, in slot order.
    pub missing_required: Vec<ComponentCategory>,
}

impl BuildSummary {
    #[must_use]
    pub fn compute(selection: &Selection, rules: &RuleSet) -> Self {
        let total_price = selection.components().map(|c| c.price).sum();
        let power_draw = selection
            .components()
            .fold(0_u32, |acc, c| acc.saturating_add(c.power_draw));

        let missing_required: Vec<ComponentCategory> = ComponentCategory::REQUIRED
            .into_iter()
            .filter(|slot| !selection.contains(*slot))
            .collect();
        let filled = ComponentCategory::REQUIRED.len() - missing_required.len();
        #[allow(clippy::cast_precision_loss)]
        let progress_pct = filled as f64 / ComponentCategory::REQUIRED.len() as f64 * 100.0;

        let performance_score = if selection.is_empty() {
            0.0
        } else {
            let sum: f64 = selection.components().map(|c| c.performance_score).sum();
            #[allow(clippy::cast_precision_loss)]
            let count = selection.len() as f64;
            sum / count
        };

        Self {
            total_price,
            power_draw,
            recommended_psu_watts: recommended_psu_watts(power_draw),
            progress_pct,
            performance_score,
            warnings: rules.check(selection, power_draw),
            missing_required,
        }
    }

    /// All required slots are filled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_required.is_empty()
    }

    /// No error-severity warnings. Plain warnings do not block a build.
    #[must_use]
    pub fn is_compatible(&self) -> bool {
        !self
            .warnings
            .iter()
            .any(|w| w.severity() == Severity::Error)
    }

    /// Progress rounded for display, e.g. `57`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn progress_rounded(&self) -> u8 {
        self.progress_pct.round().clamp(0.0, 100.0) as u8
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::build::{BuildComponent, RuleProfile};

    fn component(value: serde_json::Value) -> BuildComponent {
        serde_json::from_value(value).unwrap()
    }

    fn cpu(socket: &str) -> BuildComponent {
        component(json!({
            "id": format!("cpu-{socket}"), "category": "cpu", "name": "CPU",
            "price": "300", "powerDraw": 125, "performanceScore": 80.0,
            "compatibility": [socket]
        }))
    }

    fn board(socket: &str, memory: &str) -> BuildComponent {
        component(json!({
            "id": format!("mb-{socket}"), "category": "motherboard", "name": "Board",
            "price": "200", "powerDraw": 50, "performanceScore": 70.0,
            "specs": {"socket": socket, "memory": memory}
        }))
    }

    fn psu(wattage: u32) -> BuildComponent {
        component(json!({
            "id": format!("psu-{wattage}"), "category": "psu", "name": "PSU",
            "price": "90", "performanceScore": 60.0, "specs": {"wattage": wattage}
        }))
    }

    fn gpu(price: &str, draw: u32) -> BuildComponent {
        component(json!({
            "id": format!("gpu-{price}"), "category": "gpu", "name": "GPU",
            "price": price, "powerDraw": draw, "performanceScore": 90.0
        }))
    }

    fn case(form: &str) -> BuildComponent {
        component(json!({
            "id": format!("case-{form}"), "category": "case", "name": "Case",
            "price": "80", "compatibility": [form]
        }))
    }

    fn ram(kind: &str) -> BuildComponent {
        component(json!({
            "id": format!("ram-{kind}"), "category": "ram", "name": "RAM",
            "price": "100", "powerDraw": 10, "performanceScore": 50.0,
            "specs": {"type": kind}
        }))
    }

    #[test]
    fn test_empty_selection() {
        let summary = BuildSummary::compute(&Selection::new(), &RuleSet::default());
        assert_eq!(summary.total_price, Decimal::ZERO);
        assert_eq!(summary.power_draw, 0);
        assert!((summary.performance_score - 0.0).abs() < f64::EPSILON);
        assert!((summary.progress_pct - 0.0).abs() < f64::EPSILON);
        assert_eq!(summary.missing_required.len(), 7);
        assert!(summary.warnings.is_empty());
        assert!(!summary.is_complete());
        assert!(summary.is_compatible());
    }

    #[test]
    fn test_sums_and_mean() {
        let selection: Selection = [cpu("AM5"), board("AM5", "DDR5"), gpu("500", 200)]
            .into_iter()
            .collect();
        let summary = BuildSummary::compute(&selection, &RuleSet::default());
        assert_eq!(summary.total_price, Decimal::from(1000));
        assert_eq!(summary.power_draw, 375);
        assert_eq!(summary.recommended_psu_watts, 450);
        assert!((summary.performance_score - 80.0).abs() < 1e-9);
        assert_eq!(summary.progress_rounded(), 43);
        assert_eq!(
            summary.missing_required,
            vec![
                ComponentCategory::Ram,
                ComponentCategory::Storage,
                ComponentCategory::Psu,
                ComponentCategory::Case,
            ]
        );
    }

    #[test]
    fn test_socket_mismatch_is_error() {
        let selection: Selection = [cpu("LGA1700"), board("AM5", "DDR5")].into_iter().collect();
        let summary = BuildSummary::compute(&selection, &RuleSet::new(RuleProfile::Standard));
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].code(), "socket-mismatch");
        assert!(summary.warnings[0].message().contains("LGA1700"));
        assert!(!summary.is_compatible());
    }

    #[test]
    fn test_socket_mismatch_from_cpu_specs() {
        let cpu = component(json!({
            "id": "cpu-i5", "category": "cpu", "name": "Core i5-14600K",
            "price": "320", "powerDraw": 125, "specs": {"socket": "LGA1700"}
        }));
        let selection: Selection = [cpu, board("AM5", "DDR5")].into_iter().collect();
        let summary = BuildSummary::compute(&selection, &RuleSet::new(RuleProfile::Standard));
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].code(), "socket-mismatch");
        assert_eq!(
            summary.warnings[0].message(),
            "CPU socket LGA1700 does not match motherboard socket AM5"
        );

        let matching = component(json!({
            "id": "cpu-r5", "category": "cpu", "name": "Ryzen 5 7600",
            "price": "210", "specs": {"socket": "AM5"}
        }));
        let selection: Selection = [matching, board("AM5", "DDR5")].into_iter().collect();
        let summary = BuildSummary::compute(&selection, &RuleSet::new(RuleProfile::Standard));
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_board_without_socket_reports_unknown() {
        let board = component(json!({
            "id": "mb-x", "category": "motherboard", "name": "Board",
            "price": "150", "compatibility": ["ATX"]
        }));
        let selection: Selection = [cpu("AM5"), board].into_iter().collect();
        let summary = BuildSummary::compute(&selection, &RuleSet::new(RuleProfile::Standard));
        assert_eq!(
            summary.warnings[0].message(),
            "CPU socket AM5 does not match motherboard socket (unknown)"
        );
    }

    #[test]
    fn test_socket_comparison_ignores_case() {
        let selection: Selection = [cpu("am5"), board("AM5", "DDR5")].into_iter().collect();
        let summary = BuildSummary::compute(&selection, &RuleSet::default());
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_psu_headroom() {
        // 300 + 150 = 450W draw, needs 540W.
        let mut hot_cpu = cpu("AM5");
        hot_cpu.power_draw = 150;
        let weak: Selection = [gpu("400", 300), hot_cpu, psu(500)].into_iter().collect();
        let summary = BuildSummary::compute(&weak, &RuleSet::new(RuleProfile::Standard));
        assert_eq!(summary.power_draw, 450);
        assert_eq!(
            summary.warnings,
            vec![CompatibilityWarning::InsufficientPsu {
                wattage: 500,
                required: 540,
            }]
        );
        assert!(summary.is_compatible());

        let mut strong = weak.clone();
        strong.select(psu(540));
        let summary = BuildSummary::compute(&strong, &RuleSet::new(RuleProfile::Standard));
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn test_gpu_clearance_only_in_extended() {
        let selection: Selection = [gpu("1200", 300), case("Mini ITX")].into_iter().collect();

        let standard = BuildSummary::compute(&selection, &RuleSet::new(RuleProfile::Standard));
        assert!(standard.warnings.is_empty());

        let extended = BuildSummary::compute(&selection, &RuleSet::new(RuleProfile::Extended));
        assert_eq!(extended.warnings.len(), 1);
        assert_eq!(extended.warnings[0].code(), "gpu-clearance");
        assert_eq!(extended.warnings[0].severity(), Severity::Warning);

        let mut roomy = selection;
        roomy.select(case("Mid Tower"));
        let extended = BuildSummary::compute(&roomy, &RuleSet::new(RuleProfile::Extended));
        assert!(extended.warnings.is_empty());
    }

    #[test]
    fn test_gpu_clearance_threshold_is_strict() {
        let selection: Selection = [gpu("800", 200), case("Mini ITX")].into_iter().collect();
        let summary = BuildSummary::compute(&selection, &RuleSet::default());
        assert!(summary.warnings.is_empty());

        let cheaper_threshold = RuleSet::default().with_large_gpu_price(Decimal::from(500));
        let summary = BuildSummary::compute(&selection, &cheaper_threshold);
        assert_eq!(summary.warnings.len(), 1);
    }

    #[test]
    fn test_memory_type_mismatch() {
        let selection: Selection = [board("AM5", "DDR5"), ram("DDR4")].into_iter().collect();
        let summary = BuildSummary::compute(&selection, &RuleSet::default());
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(summary.warnings[0].code(), "memory-type-mismatch");
        assert!(!summary.is_compatible());

        let selection: Selection = [board("AM5", "DDR5"), ram("DDR5")].into_iter().collect();
        assert!(BuildSummary::compute(&selection, &RuleSet::default())
            .warnings
            .is_empty());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let parts = [
            cpu("AM5"),
            board("AM5", "DDR5"),
            ram("DDR5"),
            gpu("500", 200),
            psu(850),
            case("Mid Tower"),
        ];
        let mut selection = Selection::new();
        let mut last = 0.0;
        for part in parts {
            selection.select(part);
            let summary = BuildSummary::compute(&selection, &RuleSet::default());
            assert!(summary.progress_pct > last);
            last = summary.progress_pct;
        }
        assert!(last < 100.0);

        let mut removed = selection.clone();
        removed.remove(ComponentCategory::Gpu);
        let before = BuildSummary::compute(&selection, &RuleSet::default()).progress_pct;
        let after = BuildSummary::compute(&removed, &RuleSet::default()).progress_pct;
        assert!((before - after - 100.0 / 7.0).abs() < 1e-9);

        // Optional slots do not move progress.
        let mut cooled = selection.clone();
        cooled.select(component(json!({
            "id": "cooler", "category": "cooling", "name": "Cooler", "price": "40"
        })));
        let cooled = BuildSummary::compute(&cooled, &RuleSet::default()).progress_pct;
        assert!((cooled - before).abs() < 1e-9);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let selection: Selection = [cpu("LGA1700"), board("AM5", "DDR5"), ram("DDR4"), psu(200)]
            .into_iter()
            .collect();
        let a = BuildSummary::compute(&selection, &RuleSet::default());
        let b = BuildSummary::compute(&selection.clone(), &RuleSet::default());
        assert_eq!(a, b);
        let codes: Vec<_> = a.warnings.iter().map(CompatibilityWarning::code).collect();
        assert_eq!(codes, vec!["socket-mismatch", "insufficient-psu", "memory-type-mismatch"]);
    }
}
