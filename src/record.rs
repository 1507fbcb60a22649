//! Canonical domain types: the Transit Record and its derived
//! classification enums.
//!
//! A `TransitRecord` is immutable once the mapper constructs it. Identity
//! fields (`id_import`, `id_export`) are synthesized per load and are not
//! stable across reloads; everything else is either parsed from the source
//! row or synthesized by a documented fallback.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Qualitative risk classification derived from the anomaly count,
/// ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::Minimal,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Machine key used in CLI flags and serialized filter specs.
    pub fn key(self) -> &'static str {
        match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Display label as the source system renders it.
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Minimal => "Минимальный",
            RiskLevel::Low => "Низкий",
            RiskLevel::Medium => "Средний",
            RiskLevel::High => "Высокий",
            RiskLevel::Critical => "Критический",
        }
    }

    pub fn parse(value: &str) -> Option<RiskLevel> {
        let lowered = value.trim().to_ascii_lowercase();
        RiskLevel::ALL.into_iter().find(|level| level.key() == lowered)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Anomaly-likelihood band. Not derived from the anomaly findings; the
/// probability rule supplies it (see `risk::ProbabilityRule`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityBand {
    #[default]
    Low,
    Medium,
    Elevated,
    High,
}

impl ProbabilityBand {
    pub const ALL: [ProbabilityBand; 4] = [
        ProbabilityBand::Low,
        ProbabilityBand::Medium,
        ProbabilityBand::Elevated,
        ProbabilityBand::High,
    ];

    /// Explicit sort rank. Kept separate from the derived enum order so
    /// the view code states the severity ordering it relies on.
    pub fn rank(self) -> u8 {
        match self {
            ProbabilityBand::Low => 1,
            ProbabilityBand::Medium => 2,
            ProbabilityBand::Elevated => 3,
            ProbabilityBand::High => 4,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ProbabilityBand::Low => "low",
            ProbabilityBand::Medium => "medium",
            ProbabilityBand::Elevated => "elevated",
            ProbabilityBand::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProbabilityBand::Low => "Низкая вероятность",
            ProbabilityBand::Medium => "Средняя вероятность",
            ProbabilityBand::Elevated => "Повышенная вероятность",
            ProbabilityBand::High => "Высокая вероятность",
        }
    }

    pub fn parse(value: &str) -> Option<ProbabilityBand> {
        let lowered = value.trim().to_ascii_lowercase();
        ProbabilityBand::ALL.into_iter().find(|band| band.key() == lowered)
    }
}

impl std::fmt::Display for ProbabilityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
}

/// One detected irregularity attached to a record. The `tag` always ends
/// in `_anomaly`; the confidence is a bounded presentation placeholder,
/// never an input to filtering or sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFinding {
    pub tag: String,
    pub severity: AnomalySeverity,
    pub description: String,
    pub explanation: String,
    pub confidence: f64,
}

impl AnomalyFinding {
    /// Tag with the `_anomaly` suffix stripped, used by type filters.
    pub fn base_type(&self) -> &str {
        self.tag.strip_suffix("_anomaly").unwrap_or(&self.tag)
    }
}

/// One canonical, normalized cargo-transit operation entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitRecord {
    pub id_import: u64,
    pub id_export: u64,
    pub wagon_number: String,
    pub origin_country: String,
    pub destination_country: String,
    pub station_origin: String,
    pub station_transfer: String,
    pub station_export_origin: String,
    pub station_destination: String,
    pub arrival_date: String,
    pub departure_date: String,
    pub weight_import: f64,
    pub weight_export: f64,
    pub cargo_name: String,
    pub payer_name: String,
    pub sender_bin: String,
    pub receiver_bin: String,
    pub remark: String,
    pub probability: ProbabilityBand,
    pub risk_level: RiskLevel,
    pub anomalies: Vec<AnomalyFinding>,
    pub recommendations: Vec<String>,
}

impl TransitRecord {
    pub fn arrival(&self) -> Option<NaiveDate> {
        parse_record_date(&self.arrival_date)
    }

    pub fn departure(&self) -> Option<NaiveDate> {
        parse_record_date(&self.departure_date)
    }

    pub fn has_anomalies(&self) -> bool {
        !self.anomalies.is_empty()
    }
}

/// Formats recognized in source date cells. Fallback-synthesized dates are
/// always the first format.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Renders a weight without a trailing zero fraction.
pub fn format_weight(value: f64) -> String {
    if value.fract() == 0.0 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}
