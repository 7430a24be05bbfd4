/*!
 * Error types for the mccreader library.
 *
 * This module contains custom error types for the decode pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while decoding an MCC file and parsing its artifacts
#[derive(Error, Debug)]
pub enum MccError {
    /// The input caption file does not exist
    #[error("MCC file not found: {0}")]
    InputNotFound(PathBuf),

    /// The input file is not a usable MCC file (wrong extension, empty
    /// content, or missing magic header)
    #[error("Invalid MCC file: {0}")]
    InvalidMcc(String),

    /// The external decoder failed or did not produce usable artifacts
    #[error("Caption decoder failed: {0}")]
    ExternalDecodeFailed(String),

    /// No frame rate could be located in the decode descriptor
    #[error("No frame rate found in decoder descriptor: {0}")]
    MissingDescriptor(String),

    /// A timecode string had the wrong field count or an out-of-range
    /// frame number
    #[error("Malformed timecode: {0}")]
    MalformedTimecode(String),

    /// A decode-stream line matched no known record form
    #[error("Unrecognized directive: {0}")]
    UnrecognizedDirective(String),

    /// An underlying file operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MccError {
    /// Whether this error aborts a whole decode run. Non-fatal conditions
    /// are handled inside a single-file parse (the offending record is
    /// skipped and a synthetic debug entry recorded) and never escape it.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            MccError::MalformedTimecode(_) | MccError::UnrecognizedDirective(_)
        )
    }
}
