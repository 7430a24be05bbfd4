/*!
 * Common test utilities for the mccreader test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use isolang::Language;
use tempfile::TempDir;

use mccreader::LanguageDetector;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a descriptor artifact declaring the given frame rate
pub fn create_ccd_file(dir: &Path, asset: &str, frame_rate: u32, drop_frame: bool) -> Result<PathBuf> {
    let content = format!(
        "Frame Rate={}\nDrop Frame={}\n",
        frame_rate,
        if drop_frame { "TRUE" } else { "FALSE" }
    );
    create_test_file(dir, &format!("{}.ccd", asset), &content)
}

/// Creates a CEA-608 decode artifact for the given channel
pub fn create_608_file(dir: &Path, asset: &str, channel: u32, records: &str) -> Result<PathBuf> {
    let content = format!(
        "Decoded Line 21 / CEA-608 for Asset: {} - Channel: {}\n{}",
        asset, channel, records
    );
    create_test_file(dir, &format!("{}-C{}.608", asset, channel), &content)
}

/// Creates a CEA-708 decode artifact for the given service
pub fn create_708_file(dir: &Path, asset: &str, service: u32, records: &str) -> Result<PathBuf> {
    let content = format!(
        "Decoded DTVCC / CEA-708 for Asset: {} - Service: {}\n{}",
        asset, service, records
    );
    create_test_file(dir, &format!("{}-S{}.708", asset, service), &content)
}

/// Creates a decoder debug-log artifact
pub fn create_dbg_file(dir: &Path, asset: &str, content: &str) -> Result<PathBuf> {
    create_test_file(dir, &format!("{}.dbg", asset), content)
}

/// A deterministic keyword-based language detector for tests
pub struct MockLanguageDetector {
    rules: Vec<(String, Language)>,
}

impl MockLanguageDetector {
    pub fn new() -> Self {
        MockLanguageDetector { rules: Vec::new() }
    }

    /// Detect `language` whenever the text contains `keyword`
    pub fn with_rule(mut self, keyword: &str, language: Language) -> Self {
        self.rules.push((keyword.to_string(), language));
        self
    }
}

impl LanguageDetector for MockLanguageDetector {
    fn detect(&self, text: &str) -> Option<Language> {
        self.rules
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
            .map(|(_, language)| *language)
    }
}
