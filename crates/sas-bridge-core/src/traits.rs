//! Host-facing traits and their errors.
//!
//! The bridge owns no kernel, namespace or codec of its own. Everything it
//! talks to is supplied by the host through these seams.

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::{HostValue, Response, Table};

/// Message kind carrying the final expression result of an execution.
pub const EXECUTE_RESULT: &str = "execute_result";

/// One `(kind, payload)` message returned by the host kernel.
pub type KernelMessage = (String, Value);

/// Host callback error.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Kernel did not respond: {0}")]
    NoResponse(String),
    #[error("Host error: {0}")]
    Internal(String),
}

/// Response-retrieval callback supplied by the host.
pub trait ResponseSource {
    /// Execute `code` in the SAS sub-kernel and return the messages whose
    /// kind is listed in `kinds`, in arrival order.
    ///
    /// # Errors
    /// Returns error if the kernel cannot be reached.
    fn get_response(&self, code: &str, kinds: &[&str]) -> Result<Vec<KernelMessage>, HostError>;
}

impl<F> ResponseSource for F
where
    F: Fn(&str, &[&str]) -> Result<Vec<KernelMessage>, HostError>,
{
    fn get_response(&self, code: &str, kinds: &[&str]) -> Result<Vec<KernelMessage>, HostError> {
        self(code, kinds)
    }
}

/// Sink for user-visible, non-fatal warnings.
pub trait WarningSink {
    /// Report a warning.
    fn warn(&self, message: &str);
}

impl<F> WarningSink for F
where
    F: Fn(&str),
{
    fn warn(&self, message: &str) {
        self(message);
    }
}

/// Host namespace holding notebook variables.
pub trait Namespace {
    /// Look up a variable.
    fn get(&self, name: &str) -> Option<&HostValue>;

    /// Create or replace a variable.
    fn insert(&mut self, name: String, value: HostValue);
}

/// Text encoding used to decode character columns of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

impl TextEncoding {
    /// Encoding tried after this one fails to decode.
    #[must_use]
    pub const fn fallback(self) -> Option<Self> {
        match self {
            Self::Utf8 => Some(Self::Latin1),
            Self::Latin1 => None,
        }
    }
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
        })
    }
}

/// Dataset codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Cannot decode {path} as {encoding}: {message}")]
    Decode {
        path: String,
        encoding: TextEncoding,
        message: String,
    },
    #[error("Invalid dataset {path}: {message}")]
    Format { path: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reader for the engine-native dataset format.
pub trait TableCodec {
    /// Read the dataset at `path`.
    ///
    /// # Errors
    /// Returns [`CodecError::Decode`] when character data does not decode
    /// with `encoding`, other variants for unreadable files.
    fn read_table(&self, path: &Path, encoding: TextEncoding) -> Result<Table, CodecError>;
}

/// Read a dataset, retrying once with the fallback encoding on decode failure.
///
/// # Errors
/// Returns the last codec error if no encoding succeeds.
pub fn read_with_fallback(codec: &dyn TableCodec, path: &Path) -> Result<Table, CodecError> {
    let mut encoding = TextEncoding::Utf8;
    loop {
        match codec.read_table(path, encoding) {
            Err(err @ CodecError::Decode { .. }) => match encoding.fallback() {
                Some(next) => {
                    tracing::debug!(path = %path.display(), %err, %next, "Retrying dataset decode");
                    encoding = next;
                }
                None => return Err(err),
            },
            other => return other,
        }
    }
}

/// Anything code can be submitted to.
pub trait Submit {
    /// Submit `code` and return the parsed response.
    ///
    /// # Errors
    /// Returns error if the host kernel fails.
    fn submit(&mut self, code: &str) -> Result<Response, HostError>;
}

/// Table upload error.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Table has no columns")]
    NoColumns,
    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("Unsupported value in column {column}: {value}")]
    UnsupportedValue { column: String, value: String },
    #[error("SAS rejected the upload: {0}")]
    Rejected(String),
    #[error("Submission failed: {0}")]
    Submit(#[from] HostError),
}

/// Routine that materializes a table inside the SAS session.
pub trait TableUploader {
    /// Create dataset `name` (in `libref`, or `work` when empty) from `table`.
    ///
    /// # Errors
    /// Returns error if the table cannot be expressed or submitted.
    fn upload(
        &self,
        session: &mut dyn Submit,
        table: &Table,
        name: &str,
        libref: &str,
    ) -> Result<(), UploadError>;
}
