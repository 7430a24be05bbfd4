use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::MccError;

// @module: File and directory utilities

/// Magic header identifying a MacCaption MCC file
pub const MCC_MAGIC_HEADER: &str = "File Format=MacCaption_MCC";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<(), MccError> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Find files with a specific extension in a directory
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>, MccError> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.map_err(|e| {
                MccError::Io(std::io::Error::other(format!(
                    "Failed to read directory entry: {}",
                    e
                )))
            })?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        Ok(result)
    }

    /// Every file directly inside a directory, sorted by path
    pub fn list_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, MccError> {
        let mut result = Vec::new();
        for entry in fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            if entry.path().is_file() {
                result.push(entry.path());
            }
        }
        result.sort();
        Ok(result)
    }

    /// Read a file that may be UTF-8 (with or without a BOM) or Latin-1.
    ///
    /// The decoder's artifacts are nominally Latin-1; MCC inputs are usually
    /// UTF-8. UTF-8 is tried first, then every byte is taken as a Latin-1
    /// character so no input can fail to read.
    pub fn read_to_string_lossy<P: AsRef<Path>>(path: P) -> Result<String, MccError> {
        let bytes = fs::read(path.as_ref())?;

        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
        };

        Ok(content.strip_prefix('\u{feff}').unwrap_or(&content).to_string())
    }

    /// Write a string to a file, creating parent directories as needed
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<(), MccError> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }

    /// Detect whether a file looks like an MCC caption file: the .mcc
    /// extension or the magic header in its first line. The content is only
    /// sniffed, never decoded.
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType, MccError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MccError::InputNotFound(path.to_path_buf()));
        }

        if let Some(ext) = path.extension() {
            if ext.to_string_lossy().eq_ignore_ascii_case("mcc") {
                return Ok(FileType::Mcc);
            }
        }

        let content = Self::read_to_string_lossy(path)?;
        if content.starts_with(MCC_MAGIC_HEADER) {
            return Ok(FileType::Mcc);
        }

        Ok(FileType::Unknown)
    }
}

/// Enum representing different file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// MacCaption MCC caption file
    Mcc,
    /// Unknown file type
    Unknown,
}
