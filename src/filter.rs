//! Filter, search, and sort evaluation over the record set.
//!
//! `apply_view` never mutates its input; every stage narrows a derived
//! view and inactive stages are no-ops, so the evaluator is total and
//! idempotent over well-formed records. The date, geography, and cargo
//! groups are carried for front-end round-tripping but take no part in
//! evaluation; the six stages below are the whole contract.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransitError};
use crate::record::{ProbabilityBand, RiskLevel, TransitRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbabilityFilter {
    pub high: bool,
    pub elevated: bool,
    pub medium: bool,
    pub low: bool,
}

impl ProbabilityFilter {
    fn any(&self) -> bool {
        self.high || self.elevated || self.medium || self.low
    }

    fn allows(&self, band: ProbabilityBand) -> bool {
        match band {
            ProbabilityBand::High => self.high,
            ProbabilityBand::Elevated => self.elevated,
            ProbabilityBand::Medium => self.medium,
            ProbabilityBand::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskFilter {
    pub minimal: bool,
    pub low: bool,
    pub medium: bool,
    pub high: bool,
    pub critical: bool,
}

impl RiskFilter {
    fn any(&self) -> bool {
        self.minimal || self.low || self.medium || self.high || self.critical
    }

    fn allows(&self, level: RiskLevel) -> bool {
        match level {
            RiskLevel::Minimal => self.minimal,
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Critical => self.critical,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyFilter {
    pub weight: bool,
    pub time: bool,
    pub route: bool,
    pub duplicate: bool,
    /// Keep only records with no findings at all. Dominates the type flags.
    pub no_anomalies: bool,
}

impl AnomalyFilter {
    fn any_type(&self) -> bool {
        self.weight || self.time || self.route || self.duplicate
    }

    fn allows_type(&self, base: &str) -> bool {
        match base {
            "weight" => self.weight,
            "time" => self.time,
            "route" => self.route,
            "duplicate" => self.duplicate,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePreset {
    #[default]
    All,
    Today,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFilter {
    pub preset: DatePreset,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeographyFilter {
    pub departure_countries: Vec<String>,
    pub destination_countries: Vec<String>,
    pub stations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CargoFilter {
    pub cargo_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuickFilters {
    pub only_anomalies: bool,
    pub critical_only: bool,
    pub high_probability_only: bool,
    pub recent_only: bool,
}

/// Structured filter configuration. Groups compose by AND; flags within a
/// group compose by OR.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub probability: ProbabilityFilter,
    pub risk: RiskFilter,
    pub anomaly: AnomalyFilter,
    pub date: DateFilter,
    pub geography: GeographyFilter,
    pub cargo: CargoFilter,
    pub quick: QuickFilters,
}

impl FilterSpec {
    /// Number of checked flags across the evaluated groups.
    pub fn active_count(&self) -> usize {
        let p = self.probability;
        let r = self.risk;
        let a = self.anomaly;
        let q = self.quick;
        [
            p.high,
            p.elevated,
            p.medium,
            p.low,
            r.minimal,
            r.low,
            r.medium,
            r.high,
            r.critical,
            a.weight,
            a.time,
            a.route,
            a.duplicate,
            a.no_anomalies,
            q.only_anomalies,
            q.critical_only,
            q.high_probability_only,
            q.recent_only,
        ]
        .iter()
        .filter(|flag| **flag)
        .count()
    }

    pub fn enable_probability(&mut self, key: &str) -> bool {
        match key {
            "high" => self.probability.high = true,
            "elevated" => self.probability.elevated = true,
            "medium" => self.probability.medium = true,
            "low" => self.probability.low = true,
            _ => return false,
        }
        true
    }

    pub fn enable_risk(&mut self, key: &str) -> bool {
        match key {
            "minimal" => self.risk.minimal = true,
            "low" => self.risk.low = true,
            "medium" => self.risk.medium = true,
            "high" => self.risk.high = true,
            "critical" => self.risk.critical = true,
            _ => return false,
        }
        true
    }

    /// `none` selects the no-anomalies flag.
    pub fn enable_anomaly(&mut self, key: &str) -> bool {
        match key {
            "weight" => self.anomaly.weight = true,
            "time" => self.anomaly.time = true,
            "route" => self.anomaly.route = true,
            "duplicate" => self.anomaly.duplicate = true,
            "none" => self.anomaly.no_anomalies = true,
            _ => return false,
        }
        true
    }
}

/// Record fields the view can order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    IdImport,
    IdExport,
    WagonNumber,
    OriginCountry,
    DestinationCountry,
    StationOrigin,
    StationTransfer,
    StationDestination,
    ArrivalDate,
    DepartureDate,
    WeightImport,
    WeightExport,
    CargoName,
    Probability,
}

impl SortKey {
    fn parse(name: &str) -> Option<SortKey> {
        Some(match name {
            "id_import" => SortKey::IdImport,
            "id_export" => SortKey::IdExport,
            "wagon_number" => SortKey::WagonNumber,
            "origin_country" => SortKey::OriginCountry,
            "destination_country" => SortKey::DestinationCountry,
            "station_origin" => SortKey::StationOrigin,
            "station_transfer" => SortKey::StationTransfer,
            "station_destination" => SortKey::StationDestination,
            "arrival_date" => SortKey::ArrivalDate,
            "departure_date" => SortKey::DepartureDate,
            "weight_import" => SortKey::WeightImport,
            "weight_export" => SortKey::WeightExport,
            "cargo_name" => SortKey::CargoName,
            "probability" => SortKey::Probability,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub ascending: bool,
}

impl SortOrder {
    /// Parses `key`, `key:asc`, or `key:desc`.
    pub fn parse(raw: &str) -> Result<SortOrder> {
        let (name, direction) = match raw.split_once(':') {
            Some((name, direction)) => (name.trim(), Some(direction.trim())),
            None => (raw.trim(), None),
        };
        let key = SortKey::parse(name)
            .ok_or_else(|| TransitError::FilterSpec(format!("unknown sort key '{name}'")))?;
        let ascending = match direction {
            None | Some("asc") => true,
            Some("desc") => false,
            Some(other) => {
                return Err(TransitError::FilterSpec(format!(
                    "unknown sort direction '{other}' (expected asc or desc)"
                )));
            }
        };
        Ok(SortOrder { key, ascending })
    }
}

/// One view request: filters, free-text search, optional ordering.
#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    pub filters: FilterSpec,
    pub search: String,
    pub sort: Option<SortOrder>,
}

/// Evaluates a view against the current date.
pub fn apply_view(records: &[TransitRecord], query: &ViewQuery) -> Vec<TransitRecord> {
    apply_view_at(records, query, Utc::now().date_naive())
}

/// Evaluates a view with an explicit "today" for the recent-only window.
pub fn apply_view_at(
    records: &[TransitRecord],
    query: &ViewQuery,
    today: NaiveDate,
) -> Vec<TransitRecord> {
    let spec = &query.filters;
    let needle = query.search.trim().to_lowercase();

    let mut kept: Vec<TransitRecord> = records
        .iter()
        .filter(|record| probability_stage(spec, record))
        .filter(|record| risk_stage(spec, record))
        .filter(|record| anomaly_stage(spec, record))
        .filter(|record| quick_stage(spec, record, today))
        .filter(|record| search_stage(&needle, record))
        .cloned()
        .collect();

    if let Some(order) = query.sort {
        sort_records(&mut kept, order);
    }
    kept
}

fn probability_stage(spec: &FilterSpec, record: &TransitRecord) -> bool {
    !spec.probability.any() || spec.probability.allows(record.probability)
}

fn risk_stage(spec: &FilterSpec, record: &TransitRecord) -> bool {
    !spec.risk.any() || spec.risk.allows(record.risk_level)
}

fn anomaly_stage(spec: &FilterSpec, record: &TransitRecord) -> bool {
    if spec.anomaly.no_anomalies {
        return record.anomalies.is_empty();
    }
    if !spec.anomaly.any_type() {
        return true;
    }
    record
        .anomalies
        .iter()
        .any(|finding| spec.anomaly.allows_type(finding.base_type()))
}

fn quick_stage(spec: &FilterSpec, record: &TransitRecord, today: NaiveDate) -> bool {
    let quick = spec.quick;
    if quick.only_anomalies && record.anomalies.is_empty() {
        return false;
    }
    if quick.critical_only && record.risk_level != RiskLevel::Critical {
        return false;
    }
    if quick.high_probability_only && record.probability != ProbabilityBand::High {
        return false;
    }
    if quick.recent_only {
        let cutoff = today - Duration::days(7);
        match record.arrival() {
            Some(date) if date > cutoff => {}
            _ => return false,
        }
    }
    true
}

fn search_stage(needle: &str, record: &TransitRecord) -> bool {
    if needle.is_empty() {
        return true;
    }
    let texts = [
        record.wagon_number.as_str(),
        record.cargo_name.as_str(),
        record.station_origin.as_str(),
        record.station_transfer.as_str(),
        record.station_destination.as_str(),
        record.sender_bin.as_str(),
        record.receiver_bin.as_str(),
    ];
    texts.iter().any(|text| text.to_lowercase().contains(needle))
        || record.id_import.to_string().contains(needle)
        || record.id_export.to_string().contains(needle)
}

fn sort_records(records: &mut [TransitRecord], order: SortOrder) {
    records.sort_by(|a, b| {
        let ord = compare_by_key(a, b, order.key);
        if order.ascending { ord } else { ord.reverse() }
    });
}

fn compare_by_key(a: &TransitRecord, b: &TransitRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::IdImport => a.id_import.cmp(&b.id_import),
        SortKey::IdExport => a.id_export.cmp(&b.id_export),
        SortKey::WagonNumber => collate(&a.wagon_number, &b.wagon_number),
        SortKey::OriginCountry => collate(&a.origin_country, &b.origin_country),
        SortKey::DestinationCountry => collate(&a.destination_country, &b.destination_country),
        SortKey::StationOrigin => collate(&a.station_origin, &b.station_origin),
        SortKey::StationTransfer => collate(&a.station_transfer, &b.station_transfer),
        SortKey::StationDestination => collate(&a.station_destination, &b.station_destination),
        SortKey::ArrivalDate => a.arrival().cmp(&b.arrival()),
        SortKey::DepartureDate => a.departure().cmp(&b.departure()),
        SortKey::WeightImport => a.weight_import.total_cmp(&b.weight_import),
        SortKey::WeightExport => a.weight_export.total_cmp(&b.weight_export),
        SortKey::CargoName => collate(&a.cargo_name, &b.cargo_name),
        SortKey::Probability => a.probability.rank().cmp(&b.probability.rank()),
    }
}

/// Case-insensitive string comparison that keeps Russian alphabet order,
/// in particular ё between е and ж where code-point order misplaces it.
/// Equal-ignoring-case values fall back to byte order for determinism.
pub fn collate(a: &str, b: &str) -> Ordering {
    let ord = collation_weights(a).cmp(collation_weights(b));
    if ord == Ordering::Equal { a.cmp(b) } else { ord }
}

fn collation_weights(value: &str) -> impl Iterator<Item = u32> + '_ {
    value.chars().flat_map(char::to_lowercase).map(|c| match c {
        'ё' => ('е' as u32) * 2 + 1,
        other => (other as u32) * 2,
    })
}
