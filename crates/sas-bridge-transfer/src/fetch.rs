//! Secure-copy retrieval of datasets from the SAS host.
//!
//! The copy runs synchronously and has no timeout: a stalled transfer
//! blocks the caller until `scp` exits.

use std::path::{Path, PathBuf};

use sas_bridge_core::Profile;
use thiserror::Error;

use crate::{
    command::{CommandBuildError, CommandBuilder},
    shell::{copy_program_for, resolve_executable_path},
};

/// Fetch error.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} command not found")]
    ToolNotFound(String),
    #[error("No SAS host configured for secure copy")]
    MissingHost,
    #[error("Failed to retrieve {remote} from {host} with command {command}{detail}")]
    Retrieval {
        remote: String,
        host: String,
        command: String,
        detail: String,
    },
    #[error("Command build error: {0}")]
    CommandBuild(#[from] CommandBuildError),
}

/// Local copy of a remote dataset, deleted when dropped.
#[derive(Debug)]
pub struct FetchedFile {
    path: PathBuf,
}

impl FetchedFile {
    /// Local path of the copy.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FetchedFile {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            tracing::debug!(path = %self.path.display(), %err, "Failed to remove fetched file");
        }
    }
}

/// Copies files from the SAS host using the profile's SSH settings.
#[derive(Debug, Clone)]
pub struct RemoteFileFetcher {
    copy_program: PathBuf,
    shell_base: String,
    host: String,
    identity: Option<PathBuf>,
    port: Option<u16>,
    local_dir: PathBuf,
}

impl RemoteFileFetcher {
    /// Create a fetcher for `profile`.
    ///
    /// # Errors
    /// Returns [`FetchError::ToolNotFound`] if the secure-copy program
    /// derived from the profile's remote shell cannot be found, and
    /// [`FetchError::MissingHost`] if the profile names no host.
    pub fn new(profile: &Profile) -> Result<Self, FetchError> {
        let shell_base = CommandBuilder::new(profile.ssh.clone())
            .override_program(copy_program_for)
            .base;
        let program = shlex::split(&shell_base)
            .and_then(|words| words.into_iter().next())
            .unwrap_or_else(|| copy_program_for(&profile.ssh));
        let copy_program =
            resolve_executable_path(&program).ok_or_else(|| FetchError::ToolNotFound(program))?;

        let host = profile.host.as_deref().ok_or(FetchError::MissingHost)?;
        let host = match profile.user.as_deref() {
            Some(user) => format!("{user}@{host}"),
            None => host.to_string(),
        };

        Ok(Self {
            copy_program,
            shell_base,
            host,
            identity: profile.identity.clone(),
            port: profile.port,
            local_dir: std::env::temp_dir(),
        })
    }

    /// Place fetched files in `dir` instead of the system temp directory.
    #[must_use]
    pub fn with_local_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.local_dir = dir.into();
        self
    }

    /// Resolved secure-copy program.
    #[must_use]
    pub fn copy_program(&self) -> &Path {
        &self.copy_program
    }

    /// Copy `remote_path` to a local file named after `token`.
    ///
    /// # Errors
    /// Returns [`FetchError::Retrieval`] if the local copy does not exist
    /// after the copy command exits.
    pub fn fetch(&self, remote_path: &str, token: &str) -> Result<FetchedFile, FetchError> {
        let base_name = Path::new(remote_path)
            .file_name()
            .map_or_else(|| "dataset".into(), |name| name.to_string_lossy());
        let dest = self.local_dir.join(format!("{token}_{base_name}"));

        let parts = CommandBuilder::new(self.shell_base.clone())
            .override_program(|_| self.copy_program.to_string_lossy().into_owned())
            .option("-i", self.identity.as_ref().map(|p| p.to_string_lossy()))
            .option("-P", self.port.map(|p| p.to_string()))
            .param(format!("{}:{remote_path}", self.host))
            .param(dest.to_string_lossy())
            .build()?;
        let command = parts.display();
        tracing::debug!(%command, "Copy dataset from SAS host");

        let detail = match parts.to_command().status() {
            Ok(status) if status.success() => String::new(),
            Ok(status) => format!(" ({status})"),
            Err(err) => format!(" ({err})"),
        };

        if !dest.is_file() {
            return Err(FetchError::Retrieval {
                remote: remote_path.to_string(),
                host: self.host.clone(),
                command,
                detail,
            });
        }
        Ok(FetchedFile { path: dest })
    }
}
