//! Risk classification and the probability rule seam.

use crate::record::{ProbabilityBand, RiskLevel, TransitRecord};

/// Maps an anomaly count to a risk level. Exclusive lower bounds,
/// evaluated most-severe first.
pub fn classify_risk(anomaly_count: usize) -> RiskLevel {
    if anomaly_count > 3 {
        RiskLevel::Critical
    } else if anomaly_count > 2 {
        RiskLevel::High
    } else if anomaly_count > 1 {
        RiskLevel::Medium
    } else if anomaly_count > 0 {
        RiskLevel::Low
    } else {
        RiskLevel::Minimal
    }
}

/// Supplies the probability band for a freshly mapped record.
///
/// The source system carries this field through filters and sorts but never
/// derives it from the findings it computes alongside; the rule stays
/// pluggable so a real model can replace the default without touching the
/// mapper.
pub trait ProbabilityRule {
    fn classify(&self, record: &TransitRecord) -> ProbabilityBand;
}

/// Default rule: every record lands in the lowest band.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultProbabilityRule;

impl ProbabilityRule for DefaultProbabilityRule {
    fn classify(&self, _record: &TransitRecord) -> ProbabilityBand {
        ProbabilityBand::Low
    }
}

/// Advisory strings attached to any record with at least one finding.
pub const ADVISORIES: [&str; 3] = [
    "Требуется дополнительная проверка документов",
    "Рекомендуется физический осмотр груза",
    "Уведомить службу безопасности",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_risk_thresholds() {
        assert_eq!(classify_risk(0), RiskLevel::Minimal);
        assert_eq!(classify_risk(1), RiskLevel::Low);
        assert_eq!(classify_risk(2), RiskLevel::Medium);
        assert_eq!(classify_risk(3), RiskLevel::High);
        assert_eq!(classify_risk(4), RiskLevel::Critical);
        assert_eq!(classify_risk(5), RiskLevel::Critical);
    }

    #[test]
    fn classify_risk_is_monotone() {
        let mut previous = classify_risk(0);
        for count in 1..16 {
            let current = classify_risk(count);
            assert!(current >= previous, "risk dropped at count {count}");
            previous = current;
        }
    }
}
