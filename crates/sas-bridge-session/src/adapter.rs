//! Session adapter for one SAS sub-kernel activation.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use sas_bridge_core::{
    CodecError, EXECUTE_RESULT, ExchangeItem, HostError, NameError, Namespace, Profile, Response,
    ResponseSource, SAS_LANGUAGE, Submit, Table, TableCodec, TableUploader, WarningSink,
    parse_response, read_with_fallback, resolve_library_paths, shared_profile,
};
use sas_bridge_transfer::{FetchError, RemoteFileFetcher};
use serde_json::Value;
use uuid::Uuid;

use crate::upload::DatalinesUploader;

/// Diagnostic statement whose LOG describes the SAS installation.
const SESSION_INFO_CODE: &str = "PROC PRODUCT_STATUS;\nrun;\n";

/// Session adapter error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Host(#[from] HostError),
    #[error("{0}")]
    Name(#[from] NameError),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Codec(#[from] CodecError),
}

/// One block of code sent to the kernel.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Marker tying trace lines of this submission together.
    pub marker: Uuid,
    /// Pending input followed by the submitted code.
    pub code: String,
}

impl Submission {
    fn new(code: String) -> Self {
        Self {
            marker: Uuid::new_v4(),
            code,
        }
    }
}

/// Adapter exposing submit, import, export and session info to the host.
///
/// Calls are serialized by `&mut self`; a session is never shared between
/// threads.
pub struct SessionAdapter<R, W>
where
    R: ResponseSource,
    W: WarningSink,
{
    source: R,
    warnings: W,
    codec: Box<dyn TableCodec>,
    uploader: Arc<dyn TableUploader>,
    profile: Arc<Profile>,
    pending: String,
    log_count: usize,
    fetcher: Option<RemoteFileFetcher>,
    fetch_dir: Option<PathBuf>,
}

impl<R, W> SessionAdapter<R, W>
where
    R: ResponseSource,
    W: WarningSink,
{
    /// Create an adapter using the process-wide connection profile.
    #[must_use]
    pub fn new(source: R, warnings: W, codec: impl TableCodec + 'static) -> Self {
        Self::with_profile(source, warnings, codec, shared_profile())
    }

    /// Create an adapter for an explicit connection profile.
    #[must_use]
    pub fn with_profile(
        source: R,
        warnings: W,
        codec: impl TableCodec + 'static,
        profile: Arc<Profile>,
    ) -> Self {
        Self {
            source,
            warnings,
            codec: Box::new(codec),
            uploader: Arc::new(DatalinesUploader),
            profile,
            pending: String::new(),
            log_count: 0,
            fetcher: None,
            fetch_dir: None,
        }
    }

    /// Replace the table upload routine.
    #[must_use]
    pub fn with_uploader(mut self, uploader: impl TableUploader + 'static) -> Self {
        self.uploader = Arc::new(uploader);
        self
    }

    /// Put fetched remote datasets in `dir` instead of the temp directory.
    #[must_use]
    pub fn with_fetch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fetch_dir = Some(dir.into());
        self.fetcher = None;
        self
    }

    /// Active connection profile.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The host's response source.
    #[must_use]
    pub const fn source(&self) -> &R {
        &self.source
    }

    /// The host's warning sink.
    #[must_use]
    pub const fn warning_sink(&self) -> &W {
        &self.warnings
    }

    /// Code queued to run ahead of the next submission.
    #[must_use]
    pub fn pending_input(&self) -> &str {
        &self.pending
    }

    /// Number of submissions made so far.
    #[must_use]
    pub const fn submission_count(&self) -> usize {
        self.log_count
    }

    /// Queue code to run ahead of the next submission.
    pub fn queue_input(&mut self, code: &str) {
        self.pending.push_str(code);
    }

    /// Run pending input followed by `code` and split the output.
    ///
    /// # Errors
    /// Returns error if the host kernel fails.
    pub fn submit(&mut self, code: &str) -> Result<Response, HostError> {
        let mut sas_code = std::mem::take(&mut self.pending);
        sas_code.push_str(code);
        let submission = Submission::new(sas_code);
        self.log_count += 1;

        tracing::debug!(
            marker = %submission.marker,
            count = self.log_count,
            "Executing in SAS kernel\n{}",
            submission.code
        );
        let messages = self.source.get_response(&submission.code, &[EXECUTE_RESULT])?;
        tracing::debug!(marker = %submission.marker, ?messages, "RESPONSE");

        let html = messages
            .iter()
            .filter(|(kind, _)| kind == EXECUTE_RESULT)
            .find_map(|(_, payload)| payload.pointer("/data/text~1html").and_then(Value::as_str))
            .unwrap_or_default();
        Ok(parse_response(html))
    }

    /// LOG of the product status report.
    ///
    /// # Errors
    /// Returns error if the host kernel fails.
    pub fn session_info(&mut self) -> Result<String, HostError> {
        self.submit(SESSION_INFO_CODE).map(|response| response.log)
    }

    /// Change the engine's working directory.
    ///
    /// # Errors
    /// Returns error if the host kernel fails.
    pub fn change_directory(&mut self, dir: &str) -> Result<Response, HostError> {
        let statement = SAS_LANGUAGE.cd_statement(dir);
        self.submit(&statement)
    }

    /// Create SAS datasets from host tables.
    ///
    /// Missing names, non-table values and failed uploads are reported as
    /// warnings and skipped. Returns the names that were uploaded.
    pub fn export_variables<I>(&mut self, namespace: &dyn Namespace, names: I) -> Vec<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut exported = Vec::new();
        for name in names {
            let name = name.as_ref();
            let Some(value) = namespace.get(name) else {
                self.warn(&format!("Variable {name} does not exist"));
                continue;
            };
            let Some(table) = value.as_table() else {
                self.warn(&format!(
                    "Cannot transfer a non-table object {name} of type {} to SAS",
                    value.type_name()
                ));
                continue;
            };
            // SAS cannot handle columns with non-string labels.
            let table = table.with_string_labels();
            let uploader = Arc::clone(&self.uploader);
            match uploader.upload(self, &table, name, "") {
                Ok(()) => exported.push(name.to_string()),
                Err(err) => self.warn(&format!("Failed to transfer {name} to SAS: {err}")),
            }
        }
        exported
    }

    /// Read SAS datasets into host tables.
    ///
    /// Each item is `table` or `library.table`. Items that fail are reported
    /// as warnings and left out of the result, keyed by the item name with
    /// `.` replaced by `_`.
    pub fn import_variables<I>(&mut self, items: I) -> HashMap<String, Table>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut result = HashMap::new();
        for item in items {
            let name = item.as_ref();
            match self.import_item(name) {
                Ok(Some((key, table))) => {
                    result.insert(key, table);
                }
                Ok(None) => {}
                Err(err) => self.warn(&format!("Failed to get dataset {name} from SAS: {err}")),
            }
        }
        result
    }

    fn import_item(&mut self, name: &str) -> Result<Option<(String, Table)>, SessionError> {
        let token = Uuid::new_v4().simple().to_string();
        let item = ExchangeItem::parse(name)?;

        self.pending.push_str(&item.path_probe(&token));
        let response = self.submit("")?;
        tracing::debug!(item = %item, lst = %response.lst, "Library path response");

        let mut candidates = resolve_library_paths(&response.lst, &token);
        if candidates.is_empty() {
            candidates = resolve_library_paths(&response.log, &token);
        }

        // Unreadable or unreachable candidates fall through to the next path.
        let mut last_error: Option<SessionError> = None;
        for library_path in &candidates {
            let data_file = item.data_file(Path::new(library_path));
            if data_file.is_file() {
                match read_with_fallback(self.codec.as_ref(), &data_file) {
                    Ok(table) => return Ok(Some((item.result_key(), table))),
                    Err(err) => {
                        tracing::debug!(item = %item, %err, "Candidate dataset unreadable");
                        last_error = Some(err.into());
                        continue;
                    }
                }
            }
            if !self.profile.allows_remote_copy() {
                continue;
            }
            let remote = data_file.to_string_lossy().into_owned();
            let fetched = self.fetcher()?.fetch(&remote, &token);
            match fetched {
                Ok(local) => {
                    // The local copy is removed when `local` drops.
                    match read_with_fallback(self.codec.as_ref(), local.path()) {
                        Ok(table) => return Ok(Some((item.result_key(), table))),
                        Err(err) => {
                            tracing::debug!(item = %item, %err, "Fetched dataset unreadable");
                            last_error = Some(err.into());
                        }
                    }
                }
                Err(err @ FetchError::Retrieval { .. }) => {
                    tracing::debug!(item = %item, %err, "Candidate library path failed");
                    last_error = Some(err.into());
                }
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(err) = last_error {
            return Err(err);
        }
        self.warn(&format!(
            "Failed to access dataset {item}. Only SAS servers that share the file system \
             with this session, or that are reached over SSH, are supported."
        ));
        Ok(None)
    }

    fn fetcher(&mut self) -> Result<&RemoteFileFetcher, FetchError> {
        let fetcher = match self.fetcher.take() {
            Some(fetcher) => fetcher,
            None => {
                let fetcher = RemoteFileFetcher::new(&self.profile)?;
                match &self.fetch_dir {
                    Some(dir) => fetcher.with_local_dir(dir.clone()),
                    None => fetcher,
                }
            }
        };
        Ok(self.fetcher.insert(fetcher))
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
        self.warnings.warn(message);
    }
}

impl<R, W> Submit for SessionAdapter<R, W>
where
    R: ResponseSource,
    W: WarningSink,
{
    fn submit(&mut self, code: &str) -> Result<Response, HostError> {
        Self::submit(self, code)
    }
}
