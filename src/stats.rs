//! Aggregate summaries over a record set for the `stats` command.
//!
//! Each section renders as plain string rows so the table printer and
//! tests consume the same output.

use std::collections::HashMap;

use itertools::Itertools;

use crate::record::{ProbabilityBand, RiskLevel, TransitRecord, format_weight};

#[derive(Debug)]
pub struct StatsReport {
    pub total_records: usize,
    pub records_with_anomalies: usize,
    /// Band label, count, percent. Most severe band first.
    pub probability_rows: Vec<Vec<String>>,
    /// Level label, count, percent. Most severe level first.
    pub risk_rows: Vec<Vec<String>>,
    /// Tag, count, percent. Descending by count, ties by tag name.
    pub anomaly_rows: Vec<Vec<String>>,
    /// Column, min, max, mean for both weight fields.
    pub weight_rows: Vec<Vec<String>>,
}

pub fn compute_stats(records: &[TransitRecord]) -> StatsReport {
    let total = records.len();
    let mut probability_counts: HashMap<ProbabilityBand, usize> = HashMap::new();
    let mut risk_counts: HashMap<RiskLevel, usize> = HashMap::new();
    let mut with_anomalies = 0usize;

    for record in records {
        *probability_counts.entry(record.probability).or_default() += 1;
        *risk_counts.entry(record.risk_level).or_default() += 1;
        if record.has_anomalies() {
            with_anomalies += 1;
        }
    }

    let probability_rows = ProbabilityBand::ALL
        .iter()
        .rev()
        .map(|band| {
            let count = probability_counts.get(band).copied().unwrap_or(0);
            vec![band.label().to_string(), count.to_string(), percent(count, total)]
        })
        .collect();

    let risk_rows = RiskLevel::ALL
        .iter()
        .rev()
        .map(|level| {
            let count = risk_counts.get(level).copied().unwrap_or(0);
            vec![level.label().to_string(), count.to_string(), percent(count, total)]
        })
        .collect();

    let anomaly_rows = records
        .iter()
        .flat_map(|record| &record.anomalies)
        .map(|finding| finding.tag.as_str())
        .counts()
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(tag, count)| vec![tag.to_string(), count.to_string(), percent(count, total)])
        .collect();

    let weight_rows = vec![
        weight_row("weight_import", records.iter().map(|r| r.weight_import)),
        weight_row("weight_export", records.iter().map(|r| r.weight_export)),
    ];

    StatsReport {
        total_records: total,
        records_with_anomalies: with_anomalies,
        probability_rows,
        risk_rows,
        anomaly_rows,
        weight_rows,
    }
}

fn percent(count: usize, total: usize) -> String {
    if total == 0 {
        "0.0".to_string()
    } else {
        format!("{:.1}", count as f64 * 100.0 / total as f64)
    }
}

fn weight_row(name: &str, values: impl Iterator<Item = f64>) -> Vec<String> {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values {
        count += 1;
        sum += value;
        min = min.min(value);
        max = max.max(value);
    }
    if count == 0 {
        return vec![name.to_string(), "-".to_string(), "-".to_string(), "-".to_string()];
    }
    vec![
        name.to_string(),
        format_weight(min),
        format_weight(max),
        format!("{:.2}", sum / count as f64),
    ]
}
