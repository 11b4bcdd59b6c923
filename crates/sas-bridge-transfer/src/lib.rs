//! Secure-copy retrieval of SAS datasets from remote hosts.
//!
//! Provides:
//! - `CommandBuilder` - Build copy invocations from profile settings
//! - `RemoteFileFetcher` - Copy a remote dataset to a local temporary file
//! - Executable resolution utilities

pub mod command;
pub mod fetch;
pub mod shell;

pub use command::{CommandBuildError, CommandBuilder, CommandParts};
pub use fetch::{FetchError, FetchedFile, RemoteFileFetcher};
pub use shell::{copy_program_for, resolve_executable_path};
