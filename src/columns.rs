//! Canonical schema and source-header synonym resolution.
//!
//! The source system's localized exports label the same concept under
//! several known headers. The synonym table maps those labels (matched
//! case-insensitively after trimming) onto canonical fields; it ships with
//! compiled-in defaults and accepts a YAML override file so a new source
//! layout never requires a rebuild.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransitError};
use crate::parse::GenericRow;

/// Canonical fields a source column can resolve to, in record order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    WagonNumber,
    OriginCountry,
    DestinationCountry,
    StationOrigin,
    StationTransfer,
    StationExportOrigin,
    StationDestination,
    ArrivalDate,
    DepartureDate,
    WeightImport,
    WeightExport,
    CargoName,
    PayerName,
    SenderBin,
    ReceiverBin,
    Remark,
    AnomalyTags,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 17] = [
        CanonicalField::WagonNumber,
        CanonicalField::OriginCountry,
        CanonicalField::DestinationCountry,
        CanonicalField::StationOrigin,
        CanonicalField::StationTransfer,
        CanonicalField::StationExportOrigin,
        CanonicalField::StationDestination,
        CanonicalField::ArrivalDate,
        CanonicalField::DepartureDate,
        CanonicalField::WeightImport,
        CanonicalField::WeightExport,
        CanonicalField::CargoName,
        CanonicalField::PayerName,
        CanonicalField::SenderBin,
        CanonicalField::ReceiverBin,
        CanonicalField::Remark,
        CanonicalField::AnomalyTags,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::WagonNumber => "wagon_number",
            CanonicalField::OriginCountry => "origin_country",
            CanonicalField::DestinationCountry => "destination_country",
            CanonicalField::StationOrigin => "station_origin",
            CanonicalField::StationTransfer => "station_transfer",
            CanonicalField::StationExportOrigin => "station_export_origin",
            CanonicalField::StationDestination => "station_destination",
            CanonicalField::ArrivalDate => "arrival_date",
            CanonicalField::DepartureDate => "departure_date",
            CanonicalField::WeightImport => "weight_import",
            CanonicalField::WeightExport => "weight_export",
            CanonicalField::CargoName => "cargo_name",
            CanonicalField::PayerName => "payer_name",
            CanonicalField::SenderBin => "sender_bin",
            CanonicalField::ReceiverBin => "receiver_bin",
            CanonicalField::Remark => "remark",
            CanonicalField::AnomalyTags => "anomaly_tags",
        }
    }

    fn by_name(name: &str) -> Option<CanonicalField> {
        CanonicalField::ALL
            .into_iter()
            .find(|field| field.name() == name)
    }

    fn default_labels(self) -> &'static [&'static str] {
        match self {
            CanonicalField::WagonNumber => {
                &["Номер вагона", "wagon_container_number", "nomer_vagona"]
            }
            CanonicalField::OriginCountry => &[
                "Страна отправления_импорт",
                "strana_otpr",
                "departure_country_code",
            ],
            CanonicalField::DestinationCountry => &[
                "Страна назначения_экспорт",
                "strana_nazn",
                "destination_country_code",
            ],
            CanonicalField::StationOrigin => &[
                "Станция отправления_импорт",
                "stancia_otpr",
                "departure_station_name",
            ],
            CanonicalField::StationTransfer => {
                &["Станция назначения_импорт", "stancia_pereaddr"]
            }
            CanonicalField::StationExportOrigin => {
                &["Станция отправления_экспорт", "stancia_otpr_kzh"]
            }
            CanonicalField::StationDestination => &[
                "Станция назначения_экспорт",
                "stancia_nazn",
                "destination_station_name",
            ],
            CanonicalField::ArrivalDate => {
                &["Дата прибытия_импорт", "data_prib", "arrival_date"]
            }
            CanonicalField::DepartureDate => {
                &["Дата отправления_экспорт", "data_otpr", "departure_date"]
            }
            CanonicalField::WeightImport => &["ves_import", "вес", "total_weight"],
            CanonicalField::WeightExport => &["ves_export", "wagon_weight"],
            CanonicalField::CargoName => {
                &["Наименование груза", "naimenovanie_gruza", "cargo_name"]
            }
            CanonicalField::PayerName => {
                &["naimenovanie_plat", "Наименование плательщика"]
            }
            CanonicalField::SenderBin => &["БИН_импорт", "gruzootpravitel_bin"],
            CanonicalField::ReceiverBin => &["БИН_экспорт", "gruzopoluchatel_bin"],
            CanonicalField::Remark => {
                &["комент КТЖ", "osobaya_otmetka", "Особые отметки"]
            }
            CanonicalField::AnomalyTags => {
                &["anomaly_types", "Аномалии", "Типы аномалий"]
            }
        }
    }
}

/// Known source labels per canonical field.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    labels: HashMap<CanonicalField, Vec<String>>,
}

impl Default for SynonymTable {
    fn default() -> Self {
        let labels = CanonicalField::ALL
            .into_iter()
            .map(|field| {
                let defaults = field
                    .default_labels()
                    .iter()
                    .map(|label| (*label).to_string())
                    .collect();
                (field, defaults)
            })
            .collect();
        SynonymTable { labels }
    }
}

impl SynonymTable {
    /// Loads a YAML override mapping canonical field names to label lists.
    /// Named fields replace their default list; everything else keeps the
    /// built-ins. Unknown field names are rejected.
    pub fn load_override(path: &Path) -> Result<SynonymTable> {
        let file = File::open(path).map_err(|source| TransitError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: HashMap<String, Vec<String>> =
            serde_yaml::from_reader(BufReader::new(file)).map_err(|err| {
                TransitError::Synonyms {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                }
            })?;

        let mut table = SynonymTable::default();
        for (name, labels) in overrides {
            let field =
                CanonicalField::by_name(&name).ok_or_else(|| TransitError::Synonyms {
                    path: path.to_path_buf(),
                    reason: format!("unknown canonical field '{name}'"),
                })?;
            if labels.is_empty() {
                return Err(TransitError::Synonyms {
                    path: path.to_path_buf(),
                    reason: format!("field '{name}' has an empty label list"),
                });
            }
            table.labels.insert(field, labels);
        }
        Ok(table)
    }

    pub fn labels(&self, field: CanonicalField) -> &[String] {
        self.labels
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Resolution of one header row against the synonym table. Computed once
/// per load; the first matching header in file order wins per field.
#[derive(Debug)]
pub struct HeaderMap {
    resolved: HashMap<CanonicalField, String>,
}

impl HeaderMap {
    pub fn resolve(headers: &[String], table: &SynonymTable) -> HeaderMap {
        let mut resolved = HashMap::new();
        for field in CanonicalField::ALL {
            let labels: Vec<String> = table
                .labels(field)
                .iter()
                .map(|label| label.trim().to_lowercase())
                .collect();
            let hit = headers
                .iter()
                .find(|header| labels.contains(&header.trim().to_lowercase()));
            if let Some(header) = hit {
                resolved.insert(field, header.clone());
            }
        }
        HeaderMap { resolved }
    }

    /// Source header a canonical field resolved to, if any.
    pub fn source_header(&self, field: CanonicalField) -> Option<&str> {
        self.resolved.get(&field).map(String::as_str)
    }

    /// Cell value for a canonical field in one row. `Some("")` means the
    /// column exists but the cell is blank.
    pub fn value<'a>(&self, row: &'a GenericRow, field: CanonicalField) -> Option<&'a str> {
        self.resolved
            .get(&field)
            .and_then(|header| row.get(header))
            .map(String::as_str)
    }

    /// Headers that resolved to no canonical field.
    pub fn unmatched<'a>(&self, headers: &'a [String]) -> Vec<&'a str> {
        headers
            .iter()
            .filter(|header| !self.resolved.values().any(|hit| hit == *header))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|h| h.to_string()).collect()
    }

    #[test]
    fn russian_labels_resolve_case_insensitively() {
        let table = SynonymTable::default();
        let headers = headers(&["НОМЕР ВАГОНА", " вес ", "комент КТЖ"]);
        let map = HeaderMap::resolve(&headers, &table);
        assert_eq!(
            map.source_header(CanonicalField::WagonNumber),
            Some("НОМЕР ВАГОНА")
        );
        assert_eq!(map.source_header(CanonicalField::WeightImport), Some(" вес "));
        assert_eq!(map.source_header(CanonicalField::Remark), Some("комент КТЖ"));
        assert_eq!(map.source_header(CanonicalField::CargoName), None);
    }

    #[test]
    fn first_matching_header_wins() {
        let table = SynonymTable::default();
        let headers = headers(&["ves_import", "вес"]);
        let map = HeaderMap::resolve(&headers, &table);
        assert_eq!(
            map.source_header(CanonicalField::WeightImport),
            Some("ves_import")
        );
    }

    #[test]
    fn unmatched_headers_are_reported() {
        let table = SynonymTable::default();
        let headers = headers(&["Номер вагона", "загадка"]);
        let map = HeaderMap::resolve(&headers, &table);
        assert_eq!(map.unmatched(&headers), vec!["загадка"]);
    }

    #[test]
    fn override_replaces_only_named_fields() {
        use std::io::Write;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("synonyms.yml");
        let mut file = File::create(&path).expect("create override");
        writeln!(file, "weight_import:\n  - Вес брутто").expect("write override");

        let table = SynonymTable::load_override(&path).expect("load override");
        assert_eq!(table.labels(CanonicalField::WeightImport), ["Вес брутто"]);
        assert!(
            table
                .labels(CanonicalField::WagonNumber)
                .iter()
                .any(|l| l == "Номер вагона")
        );
    }

    #[test]
    fn override_rejects_unknown_fields() {
        use std::io::Write;

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("synonyms.yml");
        let mut file = File::create(&path).expect("create override");
        writeln!(file, "no_such_field:\n  - label").expect("write override");

        assert!(matches!(
            SynonymTable::load_override(&path),
            Err(TransitError::Synonyms { .. })
        ));
    }
}
