//! Semicolon-delimited CSV export of mapped records.
//!
//! Output leads with a UTF-8 byte order mark and quotes every cell, so
//! spreadsheet imports keep Cyrillic text and embedded delimiters intact.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::QuoteStyle;

use crate::decode::UTF8_BOM;
use crate::loader::is_dash;
use crate::record::{TransitRecord, format_weight};

pub const EXPORT_DELIMITER: u8 = b';';

pub const EXPORT_HEADERS: [&str; 22] = [
    "id_import",
    "id_export",
    "wagon_number",
    "origin_country",
    "destination_country",
    "station_origin",
    "station_transfer",
    "station_export_origin",
    "station_destination",
    "arrival_date",
    "departure_date",
    "weight_import",
    "weight_export",
    "cargo_name",
    "payer_name",
    "sender_bin",
    "receiver_bin",
    "remark",
    "probability",
    "risk_level",
    "anomaly_count",
    "recommendations",
];

/// Opens a quoted semicolon CSV writer over `path`, with `None` or `-`
/// meaning stdout. The byte order mark is written before any cell.
pub fn open_export_writer(path: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let mut base: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating export file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    base.write_all(&UTF8_BOM).context("Writing byte order mark")?;

    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(EXPORT_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

/// Writes the header row and one row per record, then flushes.
pub fn write_records<W: Write>(writer: &mut csv::Writer<W>, records: &[TransitRecord]) -> Result<()> {
    writer
        .write_record(EXPORT_HEADERS)
        .context("Writing export header row")?;
    for record in records {
        writer
            .write_record(&record_row(record))
            .context("Writing export row")?;
    }
    writer.flush().context("Flushing export output")?;
    Ok(())
}

/// Renders the full export byte stream in memory.
pub fn export_bytes(records: &[TransitRecord]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&UTF8_BOM);
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(EXPORT_DELIMITER)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    let mut writer = builder.from_writer(&mut buffer);
    write_records(&mut writer, records)?;
    drop(writer);
    Ok(buffer)
}

fn record_row(record: &TransitRecord) -> Vec<String> {
    vec![
        record.id_import.to_string(),
        record.id_export.to_string(),
        record.wagon_number.clone(),
        record.origin_country.clone(),
        record.destination_country.clone(),
        record.station_origin.clone(),
        record.station_transfer.clone(),
        record.station_export_origin.clone(),
        record.station_destination.clone(),
        record.arrival_date.clone(),
        record.departure_date.clone(),
        format_weight(record.weight_import),
        format_weight(record.weight_export),
        record.cargo_name.clone(),
        record.payer_name.clone(),
        record.sender_bin.clone(),
        record.receiver_bin.clone(),
        record.remark.clone(),
        record.probability.label().to_string(),
        record.risk_level.label().to_string(),
        record.anomalies.len().to_string(),
        record.recommendations.join("; "),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{AnomalyFinding, AnomalySeverity};

    fn sample() -> TransitRecord {
        TransitRecord {
            id_import: 1_000_000,
            id_export: 2_000_000,
            wagon_number: "12345678".to_string(),
            cargo_name: "Уголь \"каменный\"".to_string(),
            station_origin: "Москва; Сортировочная".to_string(),
            weight_import: 5000.0,
            weight_export: 4800.5,
            recommendations: vec!["a".to_string(), "b".to_string()],
            anomalies: vec![AnomalyFinding {
                tag: "weight_anomaly".to_string(),
                severity: AnomalySeverity::Medium,
                description: String::new(),
                explanation: String::new(),
                confidence: 0.8,
            }],
            ..TransitRecord::default()
        }
    }

    #[test]
    fn export_leads_with_byte_order_mark() {
        let bytes = export_bytes(&[sample()]).unwrap();
        assert_eq!(&bytes[..3], &UTF8_BOM);
    }

    #[test]
    fn every_cell_is_quoted_and_semicolon_delimited() {
        let bytes = export_bytes(&[sample()]).unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("\"id_import\";\"id_export\""));
        let row = lines.next().unwrap();
        // Embedded quotes double, embedded semicolons stay inside the cell.
        assert!(row.contains("\"Уголь \"\"каменный\"\"\""));
        assert!(row.contains("\"Москва; Сортировочная\""));
    }

    #[test]
    fn derived_columns_render_counts_and_joined_text() {
        let bytes = export_bytes(&[sample()]).unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let row = text.lines().nth(1).unwrap();
        assert!(row.contains("\"5000\""));
        assert!(row.contains("\"4800.5\""));
        assert!(row.contains("\"1\""));
        assert!(row.contains("\"a; b\""));
        assert!(row.contains("\"Минимальный\""));
        assert!(row.contains("\"Низкая вероятность\""));
    }

    #[test]
    fn header_width_matches_row_width() {
        let bytes = export_bytes(&[sample()]).unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(EXPORT_DELIMITER)
            .from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), EXPORT_HEADERS.len());
        for row in reader.records() {
            assert_eq!(row.unwrap().len(), EXPORT_HEADERS.len());
        }
    }
}
