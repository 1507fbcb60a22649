pub mod cache;
pub mod cli;
pub mod columns;
pub mod decode;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod mapper;
pub mod normalize;
pub mod parse;
pub mod record;
pub mod risk;
pub mod stats;
pub mod store;
pub mod table;
pub mod view;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::{Cli, Commands};
use crate::columns::{CanonicalField, HeaderMap};
use crate::store::{ImportMode, RecordStore};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("gray_tranzit", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Load(args) => handle_load(&args),
        Commands::View(args) => view::execute_view(&args),
        Commands::Export(args) => view::execute_export(&args),
        Commands::Stats(args) => handle_stats(&args),
        Commands::Mapping(args) => handle_mapping(&args),
    }
}

fn handle_load(args: &cli::LoadArgs) -> Result<()> {
    let synonyms = view::load_synonyms(args.synonyms.as_deref())?;
    let options = loader::LoadOptions {
        encoding_label: args.input_encoding.clone(),
        seed: args.seed,
    };
    let outcome = loader::load_records(&args.input, &synonyms, &options)
        .with_context(|| format!("Loading records from {:?}", args.input))?;
    let summary = &outcome.summary;
    info!(
        "parsed {} row(s) as {} into {} record(s)",
        summary.rows_parsed, summary.encoding, summary.records_mapped
    );
    if summary.synthesized_rows > 0 {
        info!(
            "synthesized {} field(s) across {} row(s)",
            summary.synthesized_fields, summary.synthesized_rows
        );
    }

    if let Some(snapshot) = &args.snapshot {
        let mut store = RecordStore::new();
        store.subscribe(|change| {
            debug!(
                "store holds {} record(s) after adding {}",
                change.total, change.added
            );
        });
        let mode = if args.append {
            if snapshot.exists() {
                let existing = cache::load_snapshot(snapshot)
                    .with_context(|| format!("Reading snapshot {snapshot:?}"))?;
                store.replace(existing);
            }
            ImportMode::Append
        } else {
            ImportMode::Replace
        };
        let ticket = store.begin_load(mode);
        store.commit(ticket, outcome.records);
        let written = cache::save_snapshot(snapshot, store.records())
            .with_context(|| format!("Writing snapshot {snapshot:?}"))?;
        info!("snapshot of {written} record(s) written to {}", snapshot.display());
    }
    Ok(())
}

fn handle_stats(args: &cli::StatsArgs) -> Result<()> {
    let records = view::acquire_records(
        args.input.as_deref(),
        args.store.as_deref(),
        args.input_encoding.as_deref(),
        args.synonyms.as_deref(),
        args.seed,
    )?;
    let report = stats::compute_stats(&records);

    println!("records: {}", report.total_records);
    println!("with anomalies: {}", report.records_with_anomalies);
    println!();
    table::print_table(&owned_headers(&["probability", "count", "percent"]), &report.probability_rows);
    println!();
    table::print_table(&owned_headers(&["risk", "count", "percent"]), &report.risk_rows);
    if !report.anomaly_rows.is_empty() {
        println!();
        table::print_table(&owned_headers(&["anomaly", "count", "percent"]), &report.anomaly_rows);
    }
    println!();
    table::print_table(&owned_headers(&["column", "min", "max", "mean"]), &report.weight_rows);

    info!("computed statistics over {} record(s)", report.total_records);
    Ok(())
}

fn handle_mapping(args: &cli::MappingArgs) -> Result<()> {
    let synonyms = view::load_synonyms(args.synonyms.as_deref())?;

    let Some(input) = args.input.as_deref() else {
        let rows: Vec<Vec<String>> = CanonicalField::ALL
            .iter()
            .map(|field| {
                vec![
                    field.name().to_string(),
                    synonyms.labels(*field).join(", "),
                ]
            })
            .collect();
        table::print_table(&owned_headers(&["field", "accepted headers"]), &rows);
        return Ok(());
    };

    let (bytes, source) = loader::read_source(input)?;
    let encoding = decode::resolve_encoding(args.input_encoding.as_deref())?;
    let text = decode::decode_bytes(&bytes, encoding);
    let parsed = parse::parse_table(&text)
        .with_context(|| format!("Resolving headers from {source}"))?;

    let map = HeaderMap::resolve(&parsed.headers, &synonyms);
    let rows: Vec<Vec<String>> = CanonicalField::ALL
        .iter()
        .map(|field| {
            vec![
                field.name().to_string(),
                map.source_header(*field).unwrap_or("-").to_string(),
            ]
        })
        .collect();
    table::print_table(&owned_headers(&["field", "resolved header"]), &rows);

    let unmatched = map.unmatched(&parsed.headers);
    if !unmatched.is_empty() {
        println!();
        println!("unmatched headers: {}", unmatched.join(", "));
    }
    info!(
        "resolved {} of {} header(s) from {source}",
        parsed.headers.len() - unmatched.len(),
        parsed.headers.len()
    );
    Ok(())
}

fn owned_headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}
