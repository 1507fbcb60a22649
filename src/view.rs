//! Command engine shared by `view` and `export`: record acquisition from
//! a raw CSV or a snapshot, flag merging into a filter spec, and output.

use std::path::Path;

use anyhow::{Context, Result, bail};
use log::info;

use crate::cache;
use crate::cli::{ExportArgs, ViewArgs};
use crate::columns::SynonymTable;
use crate::export;
use crate::filter::{FilterSpec, SortOrder, ViewQuery, apply_view};
use crate::loader::{self, LoadOptions};
use crate::record::TransitRecord;
use crate::table;

/// Loads the synonym table, with an optional YAML override file.
pub fn load_synonyms(path: Option<&Path>) -> Result<SynonymTable> {
    match path {
        Some(path) => SynonymTable::load_override(path)
            .with_context(|| format!("Loading synonym overrides from {path:?}")),
        None => Ok(SynonymTable::default()),
    }
}

/// Reads records from a raw CSV or a snapshot, exactly one of the two.
pub fn acquire_records(
    input: Option<&Path>,
    store: Option<&Path>,
    encoding_label: Option<&str>,
    synonyms: Option<&Path>,
    seed: Option<u64>,
) -> Result<Vec<TransitRecord>> {
    match (input, store) {
        (Some(_), Some(_)) => bail!("--input and --store are mutually exclusive"),
        (None, None) => bail!("one of --input or --store is required"),
        (Some(path), None) => {
            let synonyms = load_synonyms(synonyms)?;
            let options = LoadOptions {
                encoding_label: encoding_label.map(str::to_string),
                seed,
            };
            let outcome = loader::load_records(path, &synonyms, &options)
                .with_context(|| format!("Loading records from {path:?}"))?;
            Ok(outcome.records)
        }
        (None, Some(path)) => {
            cache::load_snapshot(path).with_context(|| format!("Reading snapshot {path:?}"))
        }
    }
}

/// Filter-related flags common to `view` and `export`.
#[derive(Default)]
struct QueryFlags<'a> {
    probability: &'a [String],
    risk: &'a [String],
    anomaly: &'a [String],
    only_anomalies: bool,
    critical_only: bool,
    high_probability_only: bool,
    recent_only: bool,
    search: Option<&'a str>,
    sort: Option<&'a str>,
    filters_json: Option<&'a str>,
}

impl<'a> From<&'a ViewArgs> for QueryFlags<'a> {
    fn from(args: &'a ViewArgs) -> QueryFlags<'a> {
        QueryFlags {
            probability: &args.probability,
            risk: &args.risk,
            anomaly: &args.anomaly,
            only_anomalies: args.only_anomalies,
            critical_only: args.critical_only,
            high_probability_only: args.high_probability_only,
            recent_only: args.recent_only,
            search: args.search.as_deref(),
            sort: args.sort.as_deref(),
            filters_json: args.filters.as_deref(),
        }
    }
}

impl<'a> From<&'a ExportArgs> for QueryFlags<'a> {
    fn from(args: &'a ExportArgs) -> QueryFlags<'a> {
        QueryFlags {
            probability: &args.probability,
            risk: &args.risk,
            anomaly: &args.anomaly,
            only_anomalies: args.only_anomalies,
            critical_only: args.critical_only,
            high_probability_only: args.high_probability_only,
            recent_only: args.recent_only,
            search: args.search.as_deref(),
            sort: args.sort.as_deref(),
            filters_json: args.filters.as_deref(),
        }
    }
}

/// Builds the view query. A `--filters` JSON document is the base; the
/// flag groups switch additional filters on top of it.
fn build_query(flags: QueryFlags<'_>) -> Result<ViewQuery> {
    let mut spec: FilterSpec = match flags.filters_json {
        Some(raw) => serde_json::from_str(raw).context("Parsing --filters JSON")?,
        None => FilterSpec::default(),
    };
    for key in flags.probability {
        if !spec.enable_probability(key) {
            bail!("unknown probability band '{key}' (expected high, elevated, medium, or low)");
        }
    }
    for key in flags.risk {
        if !spec.enable_risk(key) {
            bail!("unknown risk level '{key}' (expected minimal, low, medium, high, or critical)");
        }
    }
    for key in flags.anomaly {
        if !spec.enable_anomaly(key) {
            bail!("unknown anomaly type '{key}' (expected weight, time, route, duplicate, or none)");
        }
    }
    spec.quick.only_anomalies |= flags.only_anomalies;
    spec.quick.critical_only |= flags.critical_only;
    spec.quick.high_probability_only |= flags.high_probability_only;
    spec.quick.recent_only |= flags.recent_only;

    let sort = flags.sort.map(SortOrder::parse).transpose()?;
    Ok(ViewQuery {
        filters: spec,
        search: flags.search.unwrap_or("").to_string(),
        sort,
    })
}

pub fn execute_view(args: &ViewArgs) -> Result<()> {
    let records = acquire_records(
        args.input.as_deref(),
        args.store.as_deref(),
        args.input_encoding.as_deref(),
        args.synonyms.as_deref(),
        args.seed,
    )?;
    let query = build_query(QueryFlags::from(args))?;
    let mut kept = apply_view(&records, &query);
    if let Some(limit) = args.limit {
        kept.truncate(limit);
    }
    table::print_table(&table::view_headers(), &table::record_rows(&kept));
    info!(
        "{} of {} record(s) shown, {} active filter(s)",
        kept.len(),
        records.len(),
        query.filters.active_count()
    );
    Ok(())
}

pub fn execute_export(args: &ExportArgs) -> Result<()> {
    let records = acquire_records(
        args.input.as_deref(),
        args.store.as_deref(),
        args.input_encoding.as_deref(),
        args.synonyms.as_deref(),
        args.seed,
    )?;
    let query = build_query(QueryFlags::from(args))?;
    let mut kept = apply_view(&records, &query);
    if let Some(limit) = args.limit {
        kept.truncate(limit);
    }
    let mut writer = export::open_export_writer(args.output.as_deref())?;
    export::write_records(&mut writer, &kept)?;
    match &args.output {
        Some(path) if !loader::is_dash(path) => {
            info!("{} record(s) exported to {}", kept.len(), path.display());
        }
        _ => info!("{} record(s) exported to stdout", kept.len()),
    }
    Ok(())
}
