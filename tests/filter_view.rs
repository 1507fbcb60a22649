use chrono::NaiveDate;
use gray_tranzit::filter::{
    CargoFilter, DateFilter, DatePreset, FilterSpec, GeographyFilter, SortOrder, ViewQuery,
    apply_view, apply_view_at,
};
use gray_tranzit::record::{
    AnomalyFinding, AnomalySeverity, ProbabilityBand, RiskLevel, TransitRecord,
};
use proptest::prelude::*;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn finding(tag: &str) -> AnomalyFinding {
    AnomalyFinding {
        tag: format!("{tag}_anomaly"),
        severity: AnomalySeverity::Medium,
        description: String::new(),
        explanation: String::new(),
        confidence: 0.7,
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    id: u64,
    wagon: &str,
    arrival: &str,
    weight: f64,
    cargo: &str,
    probability: ProbabilityBand,
    risk: RiskLevel,
    tags: &[&str],
) -> TransitRecord {
    TransitRecord {
        id_import: id,
        id_export: id + 1_000_000,
        wagon_number: wagon.to_string(),
        arrival_date: arrival.to_string(),
        weight_import: weight,
        cargo_name: cargo.to_string(),
        probability,
        risk_level: risk,
        anomalies: tags.iter().map(|t| finding(t)).collect(),
        ..TransitRecord::default()
    }
}

/// Four records spanning the filterable attribute space. Evaluation dates
/// in these tests treat 2024-03-10 as today.
fn fleet() -> Vec<TransitRecord> {
    let mut first = record(
        1_000_010,
        "11111111",
        "2024-03-10",
        5000.0,
        "Уголь",
        ProbabilityBand::High,
        RiskLevel::Critical,
        &["weight"],
    );
    first.station_origin = "Москва-Товарная".to_string();
    vec![
        first,
        record(
            1_000_011,
            "22222222",
            "2024-03-01",
            3000.0,
            "Зерно",
            ProbabilityBand::Low,
            RiskLevel::Minimal,
            &[],
        ),
        record(
            1_000_012,
            "33333333",
            "не дата",
            3000.0,
            "Ёлки",
            ProbabilityBand::Medium,
            RiskLevel::Low,
            &["route", "time"],
        ),
        record(
            1_000_013,
            "44444444",
            "2024-03-08",
            7000.0,
            "едкий натр",
            ProbabilityBand::High,
            RiskLevel::Medium,
            &["duplicate"],
        ),
    ]
}

fn wagons(records: &[TransitRecord]) -> Vec<&str> {
    records.iter().map(|r| r.wagon_number.as_str()).collect()
}

#[test]
fn default_query_returns_everything_in_order() {
    let records = fleet();
    let kept = apply_view(&records, &ViewQuery::default());
    assert_eq!(kept, records);
}

#[test]
fn evaluation_is_idempotent() {
    let records = fleet();
    let query = ViewQuery {
        filters: {
            let mut spec = FilterSpec::default();
            spec.enable_risk("minimal");
            spec.enable_risk("critical");
            spec
        },
        search: String::new(),
        sort: Some(SortOrder::parse("weight_import").expect("sort")),
    };
    let once = apply_view_at(&records, &query, date(2024, 3, 10));
    let twice = apply_view_at(&once, &query, date(2024, 3, 10));
    assert_eq!(once, twice);
}

#[test]
fn flags_within_a_group_compose_by_or() {
    let records = fleet();
    let mut query = ViewQuery::default();
    query.filters.enable_probability("high");
    assert_eq!(
        wagons(&apply_view(&records, &query)),
        vec!["11111111", "44444444"]
    );

    query.filters.enable_probability("medium");
    assert_eq!(
        wagons(&apply_view(&records, &query)),
        vec!["11111111", "33333333", "44444444"]
    );
}

#[test]
fn groups_compose_by_and() {
    let records = fleet();
    let mut query = ViewQuery::default();
    query.filters.enable_probability("high");
    query.filters.enable_risk("medium");
    assert_eq!(wagons(&apply_view(&records, &query)), vec!["44444444"]);
}

#[test]
fn no_anomalies_flag_dominates_type_selection() {
    let records = fleet();
    let mut query = ViewQuery::default();
    query.filters.enable_anomaly("weight");
    query.filters.enable_anomaly("none");
    assert_eq!(wagons(&apply_view(&records, &query)), vec!["22222222"]);
}

#[test]
fn anomaly_type_filter_matches_base_type() {
    let records = fleet();
    let mut query = ViewQuery::default();
    query.filters.enable_anomaly("route");
    assert_eq!(wagons(&apply_view(&records, &query)), vec!["33333333"]);
}

#[test]
fn quick_filters_stack() {
    let records = fleet();
    let mut query = ViewQuery::default();
    query.filters.quick.only_anomalies = true;
    query.filters.quick.critical_only = true;
    assert_eq!(wagons(&apply_view(&records, &query)), vec!["11111111"]);

    let mut query = ViewQuery::default();
    query.filters.quick.only_anomalies = true;
    query.filters.quick.high_probability_only = true;
    assert_eq!(
        wagons(&apply_view(&records, &query)),
        vec!["11111111", "44444444"]
    );
}

#[test]
fn recent_window_is_strictly_after_cutoff() {
    let mut records = fleet();
    // Arrival exactly seven days back sits on the cutoff and is excluded.
    records.push(record(
        1_000_014,
        "55555555",
        "2024-03-03",
        100.0,
        "Щебень",
        ProbabilityBand::Low,
        RiskLevel::Minimal,
        &[],
    ));
    let mut query = ViewQuery::default();
    query.filters.quick.recent_only = true;
    let kept = apply_view_at(&records, &query, date(2024, 3, 10));
    assert_eq!(wagons(&kept), vec!["11111111", "44444444"]);
}

#[test]
fn search_covers_text_fields_and_ids() {
    let records = fleet();

    let query = ViewQuery {
        search: "УГОЛЬ".to_string(),
        ..ViewQuery::default()
    };
    assert_eq!(wagons(&apply_view(&records, &query)), vec!["11111111"]);

    let query = ViewQuery {
        search: "москва".to_string(),
        ..ViewQuery::default()
    };
    assert_eq!(wagons(&apply_view(&records, &query)), vec!["11111111"]);

    let query = ViewQuery {
        search: "000011".to_string(),
        ..ViewQuery::default()
    };
    assert_eq!(wagons(&apply_view(&records, &query)), vec!["22222222"]);
}

#[test]
fn sort_is_stable_in_both_directions() {
    let records = fleet();

    let query = ViewQuery {
        sort: Some(SortOrder::parse("weight_import:asc").expect("sort")),
        ..ViewQuery::default()
    };
    assert_eq!(
        wagons(&apply_view(&records, &query)),
        vec!["22222222", "33333333", "11111111", "44444444"]
    );

    let query = ViewQuery {
        sort: Some(SortOrder::parse("weight_import:desc").expect("sort")),
        ..ViewQuery::default()
    };
    // The two 3000 kg records keep their input order under descending too.
    assert_eq!(
        wagons(&apply_view(&records, &query)),
        vec!["44444444", "11111111", "22222222", "33333333"]
    );
}

#[test]
fn unparseable_dates_sort_first_ascending() {
    let records = fleet();
    let query = ViewQuery {
        sort: Some(SortOrder::parse("arrival_date:asc").expect("sort")),
        ..ViewQuery::default()
    };
    assert_eq!(
        wagons(&apply_view(&records, &query)),
        vec!["33333333", "22222222", "44444444", "11111111"]
    );
}

#[test]
fn probability_sorts_by_severity_rank() {
    let records = fleet();
    let query = ViewQuery {
        sort: Some(SortOrder::parse("probability:asc").expect("sort")),
        ..ViewQuery::default()
    };
    assert_eq!(
        wagons(&apply_view(&records, &query)),
        vec!["22222222", "33333333", "11111111", "44444444"]
    );
}

#[test]
fn cargo_sorts_with_yo_between_ye_and_zhe() {
    let records = fleet();
    let query = ViewQuery {
        sort: Some(SortOrder::parse("cargo_name:asc").expect("sort")),
        ..ViewQuery::default()
    };
    let kept = apply_view(&records, &query);
    let cargo: Vec<&str> = kept.iter().map(|r| r.cargo_name.as_str()).collect();
    assert_eq!(cargo, vec!["едкий натр", "Ёлки", "Зерно", "Уголь"]);
}

#[test]
fn carried_filter_groups_round_trip_through_json() {
    let mut spec = FilterSpec::default();
    spec.date = DateFilter {
        preset: DatePreset::Week,
        from: Some(date(2024, 3, 1)),
        to: None,
    };
    spec.geography = GeographyFilter {
        departure_countries: vec!["RU".to_string(), "BY".to_string()],
        destination_countries: vec!["KZ".to_string()],
        stations: vec!["Москва-Товарная".to_string()],
    };
    spec.cargo = CargoFilter {
        cargo_types: vec!["Уголь".to_string()],
    };

    let json = serde_json::to_string(&spec).expect("serialize");
    let parsed: FilterSpec = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, spec);

    // The carried groups do not take part in evaluation.
    let records = fleet();
    let query = ViewQuery {
        filters: parsed,
        ..ViewQuery::default()
    };
    assert_eq!(apply_view(&records, &query), records);
}

proptest! {
    #[test]
    fn evaluation_yields_an_idempotent_subset(
        high in any::<bool>(),
        medium in any::<bool>(),
        low in any::<bool>(),
        critical in any::<bool>(),
        minimal in any::<bool>(),
        weight_type in any::<bool>(),
        no_anomalies in any::<bool>(),
        only_anomalies in any::<bool>(),
        recent_only in any::<bool>(),
        search in prop_oneof![
            Just(String::new()),
            Just("уголь".to_string()),
            Just("9".to_string())
        ],
    ) {
        let mut spec = FilterSpec::default();
        spec.probability.high = high;
        spec.probability.medium = medium;
        spec.probability.low = low;
        spec.risk.critical = critical;
        spec.risk.minimal = minimal;
        spec.anomaly.weight = weight_type;
        spec.anomaly.no_anomalies = no_anomalies;
        spec.quick.only_anomalies = only_anomalies;
        spec.quick.recent_only = recent_only;

        let records = fleet();
        let query = ViewQuery { filters: spec, search, sort: None };
        let today = date(2024, 3, 10);
        let kept = apply_view_at(&records, &query, today);

        prop_assert!(kept.len() <= records.len());
        for record in &kept {
            prop_assert!(records.contains(record));
        }
        let again = apply_view_at(&kept, &query, today);
        prop_assert_eq!(again, kept);
    }
}
