mod common;

use std::fs;

use gray_tranzit::columns::SynonymTable;
use gray_tranzit::export::{self, EXPORT_HEADERS};
use gray_tranzit::loader::{self, LoadOptions};

use common::{TestWorkspace, sample_operations_csv};

fn mapped_records() -> Vec<gray_tranzit::record::TransitRecord> {
    let options = LoadOptions {
        encoding_label: Some("utf-8".to_string()),
        seed: Some(17),
    };
    loader::load_from_bytes(
        sample_operations_csv().as_bytes(),
        "sample".to_string(),
        &SynonymTable::default(),
        &options,
    )
    .expect("load sample")
    .records
}

#[test]
fn export_file_starts_with_byte_order_mark() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("records.csv");
    let records = mapped_records();

    let mut writer = export::open_export_writer(Some(&path)).expect("open writer");
    export::write_records(&mut writer, &records).expect("write records");
    drop(writer);

    let bytes = fs::read(&path).expect("read export");
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
}

#[test]
fn export_file_parses_back_with_a_strict_reader() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("records.csv");
    let records = mapped_records();

    let mut writer = export::open_export_writer(Some(&path)).expect("open writer");
    export::write_records(&mut writer, &records).expect("write records");
    drop(writer);

    let bytes = fs::read(&path).expect("read export");
    let text = String::from_utf8(bytes[3..].to_vec()).expect("utf-8 export");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(text.as_bytes());

    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.len(), EXPORT_HEADERS.len());
    assert_eq!(&headers[0], "id_import");
    assert_eq!(&headers[21], "recommendations");

    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("well-formed rows");
    assert_eq!(rows.len(), records.len());
    assert_eq!(&rows[0][2], "12345678");
    assert_eq!(&rows[0][13], "Уголь");
    // The anomalous row carries its advisory texts joined with "; ".
    assert_eq!(rows[2][21].matches("; ").count(), 2);
    assert_eq!(&rows[2][20], "4");
}

#[test]
fn exported_cells_are_always_quoted() {
    let records = mapped_records();
    let bytes = export::export_bytes(&records).expect("render export");
    let text = String::from_utf8(bytes[3..].to_vec()).expect("utf-8 export");
    for line in text.lines() {
        assert!(line.starts_with('"'), "line not quoted: {line}");
        assert!(line.ends_with('"'), "line not quoted: {line}");
    }
}
