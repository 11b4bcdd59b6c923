//! Core abstractions for bridging notebook sessions to a SAS engine.
//!
//! This crate provides the fundamental building blocks:
//! - `Response` / `parse_response` - Split SAS HTML output into LOG and LST
//! - `ExchangeItem` / `resolve_library_paths` - Dataset naming and library lookup
//! - `Table` / `HostValue` - Values exchanged with the host namespace
//! - `Profile` - Connection profiles, discovered once per process
//! - Host traits: response retrieval, warnings, namespace, codec, upload

pub mod config;
pub mod language;
pub mod library;
pub mod logging;
pub mod response;
pub mod table;
pub mod traits;

pub use config::{ConnectionMode, Profile, shared_profile};
pub use language::{LanguageInfo, SAS_LANGUAGE};
pub use library::{ExchangeItem, NameError, resolve_library_paths};
pub use response::{Response, parse_response};
pub use table::{ColumnLabel, HostValue, Table};
pub use traits::{
    CodecError, EXECUTE_RESULT, HostError, KernelMessage, Namespace, ResponseSource, Submit,
    TableCodec, TableUploader, TextEncoding, UploadError, WarningSink, read_with_fallback,
};
