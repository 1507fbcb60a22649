#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes raw bytes, for fixtures in legacy encodings.
    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}

/// Encodes UTF-8 text as windows-1251 bytes.
pub fn windows_1251_bytes(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1251.encode(text);
    assert!(!had_errors, "fixture text must be encodable as windows-1251");
    bytes.into_owned()
}

/// A small operations file with the header variants real exports carry.
pub fn sample_operations_csv() -> String {
    [
        "Номер вагона;Страна отправления_импорт;strana_nazn;Станция отправления_импорт;data_prib;вес;ves_export;Наименование груза;БИН_импорт;anomaly_types",
        "12345678;RU;KZ;Москва-Сортировочная;2024-03-01;5000;4800;Уголь;870524301210;",
        "87654321;BY;KZ;Брест-Центральный;2024-03-02;не число;3100;Зерно;1.23456789E+11;weight",
        ";;;;;;;;;weight,time,route,duplicate",
    ]
    .join("\n")
}
