//! Compatibility rule table.
//!
//! Two profiles exist. `Standard` checks the CPU socket and PSU headroom;
//! `Extended` adds GPU/case clearance and memory type. Which one a deployment
//! uses is configuration.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ComponentCategory, Selection};

/// PSU rating must be at least the estimated draw times 6/5.
const PSU_HEADROOM_NUM: u32 = 6;
const PSU_HEADROOM_DEN: u32 = 5;

/// Cases that fit any card.
pub const ROOMY_CASE_TAGS: [&str; 2] = ["Full Tower", "Mid Tower"];

/// GPUs priced above this are treated as full-length cards.
pub const DEFAULT_LARGE_GPU_PRICE: Decimal = Decimal::from_parts(800, 0, 0, false, 0);

/// Recommended PSU rating for an estimated draw: the draw plus 20%, rounded up.
#[must_use]
pub const fn recommended_psu_watts(power_draw: u32) -> u32 {
    (power_draw.saturating_mul(PSU_HEADROOM_NUM)).div_ceil(PSU_HEADROOM_DEN)
}

/// Which rule table to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleProfile {
    /// Socket and PSU checks.
    Standard,
    /// Standard plus GPU/case clearance and memory type.
    #[default]
    Extended,
}

impl RuleProfile {
    #[must_use]
    pub const fn rules(&self) -> &'static [Rule] {
        match self {
            Self::Standard => &[Rule::SocketMatch, Rule::PsuHeadroom],
            Self::Extended => &[
                Rule::SocketMatch,
                Rule::PsuHeadroom,
                Rule::GpuClearance,
                Rule::MemoryType,
            ],
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Extended => "extended",
        }
    }
}

impl std::str::FromStr for RuleProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "extended" => Ok(Self::Extended),
            other => Err(format!("unknown rule profile: {other} (expected standard or extended)")),
        }
    }
}

/// A single compatibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    SocketMatch,
    PsuHeadroom,
    GpuClearance,
    MemoryType,
}

impl Rule {
    /// One-line description for rule listings.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self {
            Self::SocketMatch => "CPU socket must match the motherboard socket",
            Self::PsuHeadroom => "PSU wattage must cover estimated draw plus 20%",
            Self::GpuClearance => "Large GPUs need a Full Tower or Mid Tower case",
            Self::MemoryType => "RAM generation must be supported by the motherboard",
        }
    }

    /// Slots this rule reads.
    #[must_use]
    pub const fn slots(&self) -> &'static [ComponentCategory] {
        match self {
            Self::SocketMatch => &[ComponentCategory::Cpu, ComponentCategory::Motherboard],
            Self::PsuHeadroom => &[ComponentCategory::Psu],
            Self::GpuClearance => &[ComponentCategory::Gpu, ComponentCategory::Case],
            Self::MemoryType => &[ComponentCategory::Ram, ComponentCategory::Motherboard],
        }
    }

    fn evaluate(
        self,
        selection: &Selection,
        power_draw: u32,
        rules: &RuleSet,
    ) -> Option<CompatibilityWarning> {
        match self {
            Self::SocketMatch => {
                let cpu = selection.get(ComponentCategory::Cpu)?;
                let board = selection.get(ComponentCategory::Motherboard)?;
                let cpu_socket = cpu.socket();
                let board_socket = board.socket();
                let same = match (&cpu_socket, &board_socket) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    (None, None) => true,
                    _ => false,
                };
                (!same).then_some(CompatibilityWarning::SocketMismatch {
                    cpu_socket,
                    board_socket,
                })
            }
            Self::PsuHeadroom => {
                let wattage = selection.get(ComponentCategory::Psu)?.wattage()?;
                let required = recommended_psu_watts(power_draw);
                (wattage < required)
                    .then_some(CompatibilityWarning::InsufficientPsu { wattage, required })
            }
            Self::GpuClearance => {
                let gpu = selection.get(ComponentCategory::Gpu)?;
                let case = selection.get(ComponentCategory::Case)?;
                if gpu.price <= rules.large_gpu_price {
                    return None;
                }
                let tags = case.form_factor_tags();
                let roomy = tags.iter().any(|tag| {
                    ROOMY_CASE_TAGS
                        .iter()
                        .any(|roomy| tag.eq_ignore_ascii_case(roomy))
                });
                (!roomy).then(|| CompatibilityWarning::GpuClearance {
                    gpu_price: gpu.price,
                    case_form_factor: tags.into_iter().next(),
                })
            }
            Self::MemoryType => {
                let ram = selection.get(ComponentCategory::Ram)?;
                let board = selection.get(ComponentCategory::Motherboard)?;
                let memory = ram.memory_generation()?;
                let board_text = board.spec_text();
                let supported = board_text
                    .to_ascii_uppercase()
                    .contains(&memory.to_ascii_uppercase());
                (!supported).then(|| CompatibilityWarning::MemoryTypeMismatch {
                    memory,
                    board_supports: board.memory_generation(),
                })
            }
        }
    }
}

/// The active rule table plus its thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub profile: RuleProfile,
    /// GPUs strictly above this price need a roomy case.
    pub large_gpu_price: Decimal,
}

impl RuleSet {
    #[must_use]
    pub const fn new(profile: RuleProfile) -> Self {
        Self {
            profile,
            large_gpu_price: DEFAULT_LARGE_GPU_PRICE,
        }
    }

    #[must_use]
    pub const fn with_large_gpu_price(mut self, price: Decimal) -> Self {
        self.large_gpu_price = price;
        self
    }

    #[must_use]
    pub const fn rules(&self) -> &'static [Rule] {
        self.profile.rules()
    }

    /// Run every rule against a selection. Output order follows the rule table.
    #[must_use]
    pub fn check(&self, selection: &Selection, power_draw: u32) -> Vec<CompatibilityWarning> {
        self.rules()
            .iter()
            .filter_map(|rule| rule.evaluate(selection, power_draw, self))
            .collect()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(RuleProfile::default())
    }
}

/// How bad a warning is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Parts will not work together.
    Error,
    /// Parts work but the build is risky.
    Warning,
}

/// A flagged mismatch between two selected parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "kebab-case")]
pub enum CompatibilityWarning {
    #[serde(rename_all = "camelCase")]
    SocketMismatch {
        cpu_socket: Option<String>,
        board_socket: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    InsufficientPsu { wattage: u32, required: u32 },
    #[serde(rename_all = "camelCase")]
    GpuClearance {
        gpu_price: Decimal,
        case_form_factor: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    MemoryTypeMismatch {
        memory: String,
        board_supports: Option<String>,
    },
}

impl CompatibilityWarning {
    /// Stable identifier, matching the serialized `code`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::SocketMismatch { .. } => "socket-mismatch",
            Self::InsufficientPsu { .. } => "insufficient-psu",
            Self::GpuClearance { .. } => "gpu-clearance",
            Self::MemoryTypeMismatch { .. } => "memory-type-mismatch",
        }
    }

    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::SocketMismatch { .. } | Self::MemoryTypeMismatch { .. } => Severity::Error,
            Self::InsufficientPsu { .. } | Self::GpuClearance { .. } => Severity::Warning,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::SocketMismatch {
                cpu_socket,
                board_socket,
            } => format!(
                "CPU socket {} does not match motherboard socket {}",
                cpu_socket.as_deref().unwrap_or("(unknown)"),
                board_socket.as_deref().unwrap_or("(unknown)")
            ),
            Self::InsufficientPsu { wattage, required } => format!(
                "{wattage}W power supply is below the recommended {required}W for this build"
            ),
            Self::GpuClearance {
                case_form_factor, ..
            } => match case_form_factor {
                Some(form) => format!(
                    "This graphics card may not fit a {form} case; choose a Full Tower or Mid Tower"
                ),
                None => "This graphics card may not fit the selected case; choose a Full Tower or Mid Tower".to_owned(),
            },
            Self::MemoryTypeMismatch {
                memory,
                board_supports,
            } => match board_supports {
                Some(board) => format!("{memory} memory is not supported by this {board} motherboard"),
                None => format!("{memory} memory is not listed as supported by this motherboard"),
            },
        }
    }
}
