//! Row-to-record mapping with counted fallback synthesis.
//!
//! One `RecordMapper` serves one load: it resolves the header row against
//! the synonym table once, then maps each generic row to a `TransitRecord`.
//! Identity fields derive from the row index; missing or unparsable source
//! cells fall back to defaults or synthesized placeholders, every invented
//! value counted for the load summary. All randomness flows through the
//! `RandomSource` trait so a seeded source reproduces a load exactly.

use chrono::{NaiveDate, Utc};
use log::debug;

use crate::columns::{CanonicalField, HeaderMap, SynonymTable};
use crate::normalize::normalize_identifier_code;
use crate::parse::GenericRow;
use crate::record::{AnomalyFinding, AnomalySeverity, ProbabilityBand, TransitRecord};
use crate::risk::{ADVISORIES, DefaultProbabilityRule, ProbabilityRule, classify_risk};

pub const ID_IMPORT_BASE: u64 = 1_000_000;
pub const ID_EXPORT_BASE: u64 = 2_000_000;

const WEIGHT_FALLBACK_MIN: f64 = 1000.0;
const WEIGHT_FALLBACK_SPAN: f64 = 50_000.0;
const DEFAULT_ORIGIN_COUNTRY: &str = "RU";
const DEFAULT_DESTINATION_COUNTRY: &str = "KZ";
const DEFAULT_CARGO_NAME: &str = "Груз";

/// Source of randomness for fallback synthesis.
pub trait RandomSource {
    /// Uniform float in [0, 1).
    fn unit(&mut self) -> f64;

    /// Uniform integer in [low, high).
    fn range(&mut self, low: u64, high: u64) -> u64;
}

/// fastrand-backed source; seed it for reproducible loads.
#[derive(Debug)]
pub struct FastrandSource {
    rng: fastrand::Rng,
}

impl FastrandSource {
    pub fn new() -> FastrandSource {
        FastrandSource {
            rng: fastrand::Rng::new(),
        }
    }

    pub fn seeded(seed: u64) -> FastrandSource {
        FastrandSource {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for FastrandSource {
    fn default() -> Self {
        FastrandSource::new()
    }
}

impl RandomSource for FastrandSource {
    fn unit(&mut self) -> f64 {
        self.rng.f64()
    }

    fn range(&mut self, low: u64, high: u64) -> u64 {
        self.rng.u64(low..high)
    }
}

/// Per-load tally of fallback synthesis events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FallbackCounters {
    /// Fields that received an invented value.
    pub fields: usize,
    /// Rows where at least one field was invented.
    pub rows: usize,
}

pub struct RecordMapper {
    headers: HeaderMap,
    random: Box<dyn RandomSource>,
    probability: Box<dyn ProbabilityRule>,
    today: NaiveDate,
    counters: FallbackCounters,
}

impl RecordMapper {
    pub fn new(headers: &[String], synonyms: &SynonymTable) -> RecordMapper {
        RecordMapper {
            headers: HeaderMap::resolve(headers, synonyms),
            random: Box::new(FastrandSource::new()),
            probability: Box::new(DefaultProbabilityRule),
            today: Utc::now().date_naive(),
            counters: FallbackCounters::default(),
        }
    }

    pub fn with_random(mut self, random: Box<dyn RandomSource>) -> RecordMapper {
        self.random = random;
        self
    }

    pub fn with_probability_rule(mut self, rule: Box<dyn ProbabilityRule>) -> RecordMapper {
        self.probability = rule;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> RecordMapper {
        self.today = today;
        self
    }

    pub fn counters(&self) -> FallbackCounters {
        self.counters
    }

    /// Maps one generic row. `index` is the zero-based position within the
    /// load and fixes both identity fields.
    pub fn map_row(&mut self, row: &GenericRow, index: usize) -> TransitRecord {
        let mut synthesized = 0usize;

        let wagon_number = match self.non_blank(row, CanonicalField::WagonNumber) {
            Some(value) => value.to_string(),
            None => {
                synthesized += 1;
                self.synthesize_wagon()
            }
        };

        let origin_country = match self.non_blank(row, CanonicalField::OriginCountry) {
            Some(value) => value.to_string(),
            None => {
                synthesized += 1;
                DEFAULT_ORIGIN_COUNTRY.to_string()
            }
        };
        let destination_country = match self.non_blank(row, CanonicalField::DestinationCountry) {
            Some(value) => value.to_string(),
            None => {
                synthesized += 1;
                DEFAULT_DESTINATION_COUNTRY.to_string()
            }
        };

        // Optional free-text fields pass blanks through uncounted.
        let station_origin = self.text_or_empty(row, CanonicalField::StationOrigin);
        let station_transfer = self.text_or_empty(row, CanonicalField::StationTransfer);
        let station_export_origin = self.text_or_empty(row, CanonicalField::StationExportOrigin);
        let station_destination = self.text_or_empty(row, CanonicalField::StationDestination);
        let payer_name = self.text_or_empty(row, CanonicalField::PayerName);
        let remark = self.text_or_empty(row, CanonicalField::Remark);

        let arrival_date = match self.non_blank(row, CanonicalField::ArrivalDate) {
            Some(value) => value.to_string(),
            None => {
                synthesized += 1;
                self.today.format("%Y-%m-%d").to_string()
            }
        };
        let departure_date = match self.non_blank(row, CanonicalField::DepartureDate) {
            Some(value) => value.to_string(),
            None => {
                synthesized += 1;
                self.today.format("%Y-%m-%d").to_string()
            }
        };

        let raw_weight_import = self.non_blank(row, CanonicalField::WeightImport);
        let (weight_import, invented) = self.coerce_weight(raw_weight_import);
        synthesized += usize::from(invented);
        let raw_weight_export = self.non_blank(row, CanonicalField::WeightExport);
        let (weight_export, invented) = self.coerce_weight(raw_weight_export);
        synthesized += usize::from(invented);

        let cargo_name = match self.non_blank(row, CanonicalField::CargoName) {
            Some(value) => value.to_string(),
            None => {
                synthesized += 1;
                DEFAULT_CARGO_NAME.to_string()
            }
        };

        let raw_sender = self.non_blank(row, CanonicalField::SenderBin).unwrap_or("");
        let (sender_bin, invented) = self.coerce_bin(raw_sender);
        synthesized += usize::from(invented);
        let raw_receiver = self.non_blank(row, CanonicalField::ReceiverBin).unwrap_or("");
        let (receiver_bin, invented) = self.coerce_bin(raw_receiver);
        synthesized += usize::from(invented);

        let anomalies = match self.non_blank(row, CanonicalField::AnomalyTags) {
            Some(cell) => self.derive_anomalies(cell),
            None => Vec::new(),
        };
        let risk_level = classify_risk(anomalies.len());
        let recommendations = if anomalies.is_empty() {
            Vec::new()
        } else {
            ADVISORIES.iter().map(|advice| advice.to_string()).collect()
        };

        let mut record = TransitRecord {
            id_import: ID_IMPORT_BASE + index as u64,
            id_export: ID_EXPORT_BASE + index as u64,
            wagon_number,
            origin_country,
            destination_country,
            station_origin,
            station_transfer,
            station_export_origin,
            station_destination,
            arrival_date,
            departure_date,
            weight_import,
            weight_export,
            cargo_name,
            payer_name,
            sender_bin,
            receiver_bin,
            remark,
            probability: ProbabilityBand::Low,
            risk_level,
            anomalies,
            recommendations,
        };
        record.probability = self.probability.classify(&record);

        if synthesized > 0 {
            self.counters.fields += synthesized;
            self.counters.rows += 1;
            debug!("row {index}: {synthesized} synthesized field(s)");
        }
        record
    }

    fn non_blank<'r>(&self, row: &'r GenericRow, field: CanonicalField) -> Option<&'r str> {
        self.headers
            .value(row, field)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn text_or_empty(&self, row: &GenericRow, field: CanonicalField) -> String {
        self.non_blank(row, field).unwrap_or("").to_string()
    }

    /// Two random 4-digit halves, so the result is always 8 digits.
    fn synthesize_wagon(&mut self) -> String {
        format!(
            "{}{}",
            self.random.range(1000, 10_000),
            self.random.range(1000, 10_000)
        )
    }

    /// Parses a weight cell; anything non-finite or negative falls back to
    /// a random value in [1000, 51000). A parsed zero is kept.
    fn coerce_weight(&mut self, raw: Option<&str>) -> (f64, bool) {
        if let Some(value) = raw
            && let Ok(parsed) = value.parse::<f64>()
            && parsed.is_finite()
            && parsed >= 0.0
        {
            return (parsed, false);
        }
        let invented = (self.random.unit() * WEIGHT_FALLBACK_SPAN).floor() + WEIGHT_FALLBACK_MIN;
        (invented, true)
    }

    fn coerce_bin(&mut self, raw: &str) -> (String, bool) {
        let normalized = normalize_identifier_code(raw);
        if normalized.is_empty() {
            (self.synthesize_bin(), true)
        } else {
            (normalized, false)
        }
    }

    fn synthesize_bin(&mut self) -> String {
        let mut code = String::with_capacity(12);
        for _ in 0..12 {
            code.push((b'0' + self.random.range(0, 10) as u8) as char);
        }
        code
    }

    fn derive_anomalies(&mut self, cell: &str) -> Vec<AnomalyFinding> {
        cell.split([';', ','])
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(|tag| self.finding_for(tag))
            .collect()
    }

    fn finding_for(&mut self, raw_tag: &str) -> AnomalyFinding {
        let tag = if raw_tag.ends_with("_anomaly") {
            raw_tag.to_string()
        } else {
            format!("{raw_tag}_anomaly")
        };
        AnomalyFinding {
            tag,
            severity: AnomalySeverity::Medium,
            description: format!("Обнаружена аномалия типа {raw_tag}"),
            explanation: format!("Подробное объяснение аномалии {raw_tag}"),
            confidence: self.random.unit() * 0.4 + 0.6,
        }
    }
}
