//! Session adapter exchanging code and datasets with a SAS sub-kernel.
//!
//! Provides:
//! - `SessionAdapter` - Submit code, import and export datasets
//! - `DatalinesUploader` - Upload tables as `DATALINES` data steps
//! - Namespace implementations (memory)

pub mod adapter;
pub mod namespace;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use adapter::{SessionAdapter, SessionError, Submission};
pub use upload::DatalinesUploader;

#[cfg(feature = "memory")]
pub use namespace::MemoryNamespace;
