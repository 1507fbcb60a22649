mod common;

use gray_tranzit::cache;
use gray_tranzit::columns::SynonymTable;
use gray_tranzit::error::TransitError;
use gray_tranzit::loader::{self, LoadOptions};
use gray_tranzit::store::{ImportMode, RecordStore};

use common::{TestWorkspace, sample_operations_csv};

fn load_sample(seed: u64) -> Vec<gray_tranzit::record::TransitRecord> {
    let options = LoadOptions {
        encoding_label: Some("utf-8".to_string()),
        seed: Some(seed),
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
fn snapshot_round_trips_mapped_records() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("records.bin");
    let records = load_sample(21);

    let written = cache::save_snapshot(&path, &records).expect("save snapshot");
    assert_eq!(written, records.len());

    let reloaded = cache::load_snapshot(&path).expect("reload snapshot");
    assert_eq!(reloaded, records);
}

#[test]
fn append_through_store_accumulates() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("records.bin");

    let mut store = RecordStore::new();
    store.replace(load_sample(1));
    store.append(load_sample(2));
    assert_eq!(store.len(), 6);

    cache::save_snapshot(&path, store.records()).expect("save snapshot");
    let reloaded = cache::load_snapshot(&path).expect("reload snapshot");
    assert_eq!(reloaded.len(), 6);
    assert_eq!(&reloaded[..], store.records());
}

#[test]
fn interleaved_loads_keep_only_the_newest() {
    let mut store = RecordStore::new();
    let slow = store.begin_load(ImportMode::Replace);
    let fast = store.begin_load(ImportMode::Replace);

    assert!(store.commit(fast, load_sample(2)));
    assert!(!store.commit(slow, load_sample(1)));

    let expected = load_sample(2);
    assert_eq!(store.records(), &expected[..]);
}

#[test]
fn corrupt_snapshot_reports_typed_error() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("records.bin", "definitely not bincode");
    match cache::load_snapshot(&path) {
        Err(TransitError::Cache { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected cache error, got {other:?}"),
    }
}
