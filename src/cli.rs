use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ingest and analyze railway transit-operation records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load a raw operations CSV, map it to records, and save a snapshot
    Load(LoadArgs),
    /// Filter, search, and sort records and print them as a table
    View(ViewArgs),
    /// Write filtered records as a semicolon-delimited CSV for spreadsheets
    Export(ExportArgs),
    /// Summarize probability, risk, anomaly, and weight distributions
    Stats(StatsArgs),
    /// Show the header synonym table, or resolve a file's headers against it
    Mapping(MappingArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Input CSV file ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Snapshot file to write after mapping
    #[arg(short = 's', long = "snapshot")]
    pub snapshot: Option<PathBuf>,
    /// Append to the snapshot contents instead of replacing them
    #[arg(long)]
    pub append: bool,
    /// Character encoding of the input file (defaults to windows-1251)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding header synonyms per canonical field
    #[arg(long)]
    pub synonyms: Option<PathBuf>,
    /// Seed for fallback synthesis, making a load reproducible
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Input CSV file to load on the fly ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Snapshot file to read instead of a raw CSV
    #[arg(short = 's', long = "store")]
    pub store: Option<PathBuf>,
    /// Character encoding of the input file (defaults to windows-1251)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding header synonyms per canonical field
    #[arg(long)]
    pub synonyms: Option<PathBuf>,
    /// Seed for fallback synthesis, making a load reproducible
    #[arg(long)]
    pub seed: Option<u64>,
    /// Probability bands to keep (high, elevated, medium, low)
    #[arg(long, value_delimiter = ',')]
    pub probability: Vec<String>,
    /// Risk levels to keep (minimal, low, medium, high, critical)
    #[arg(long, value_delimiter = ',')]
    pub risk: Vec<String>,
    /// Anomaly types to keep (weight, time, route, duplicate, none)
    #[arg(long, value_delimiter = ',')]
    pub anomaly: Vec<String>,
    /// Keep only records with at least one anomaly
    #[arg(long = "only-anomalies")]
    pub only_anomalies: bool,
    /// Keep only records at critical risk
    #[arg(long = "critical-only")]
    pub critical_only: bool,
    /// Keep only records in the high probability band
    #[arg(long = "high-probability-only")]
    pub high_probability_only: bool,
    /// Keep only records that arrived within the last seven days
    #[arg(long = "recent-only")]
    pub recent_only: bool,
    /// Case-insensitive substring search over text fields and ids
    #[arg(long)]
    pub search: Option<String>,
    /// Sort directive of the form `column[:asc|desc]`
    #[arg(long)]
    pub sort: Option<String>,
    /// Filter configuration as JSON, combined with the filter flags
    #[arg(long)]
    pub filters: Option<String>,
    /// Limit number of records shown
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Input CSV file to load on the fly ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Snapshot file to read instead of a raw CSV
    #[arg(short = 's', long = "store")]
    pub store: Option<PathBuf>,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Character encoding of the input file (defaults to windows-1251)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding header synonyms per canonical field
    #[arg(long)]
    pub synonyms: Option<PathBuf>,
    /// Seed for fallback synthesis, making a load reproducible
    #[arg(long)]
    pub seed: Option<u64>,
    /// Probability bands to keep (high, elevated, medium, low)
    #[arg(long, value_delimiter = ',')]
    pub probability: Vec<String>,
    /// Risk levels to keep (minimal, low, medium, high, critical)
    #[arg(long, value_delimiter = ',')]
    pub risk: Vec<String>,
    /// Anomaly types to keep (weight, time, route, duplicate, none)
    #[arg(long, value_delimiter = ',')]
    pub anomaly: Vec<String>,
    /// Keep only records with at least one anomaly
    #[arg(long = "only-anomalies")]
    pub only_anomalies: bool,
    /// Keep only records at critical risk
    #[arg(long = "critical-only")]
    pub critical_only: bool,
    /// Keep only records in the high probability band
    #[arg(long = "high-probability-only")]
    pub high_probability_only: bool,
    /// Keep only records that arrived within the last seven days
    #[arg(long = "recent-only")]
    pub recent_only: bool,
    /// Case-insensitive substring search over text fields and ids
    #[arg(long)]
    pub search: Option<String>,
    /// Sort directive of the form `column[:asc|desc]`
    #[arg(long)]
    pub sort: Option<String>,
    /// Filter configuration as JSON, combined with the filter flags
    #[arg(long)]
    pub filters: Option<String>,
    /// Limit number of records exported
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Input CSV file to load on the fly ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Snapshot file to read instead of a raw CSV
    #[arg(short = 's', long = "store")]
    pub store: Option<PathBuf>,
    /// Character encoding of the input file (defaults to windows-1251)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding header synonyms per canonical field
    #[arg(long)]
    pub synonyms: Option<PathBuf>,
    /// Seed for fallback synthesis, making a load reproducible
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct MappingArgs {
    /// Input CSV file whose headers to resolve ('-' reads stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Character encoding of the input file (defaults to windows-1251)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding header synonyms per canonical field
    #[arg(long)]
    pub synonyms: Option<PathBuf>,
}
