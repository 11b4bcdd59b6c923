//! In-crate test doubles for the host collaborators.

use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};

use sas_bridge_core::{
    CodecError, EXECUTE_RESULT, HostError, KernelMessage, ResponseSource, Table, TableCodec,
    TextEncoding, WarningSink,
};
use serde_json::{Value, json};

/// Scripted SAS kernel.
///
/// Echoes every line into the LOG, answers `%put` path probes from its
/// library table, and materializes `DATA ...; CARDS; ... ;` steps as JSON
/// datasets in the matching library directory.
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    pub libraries: HashMap<String, String>,
    pub executed: Rc<RefCell<Vec<String>>>,
}

impl FakeEngine {
    pub fn with_work(dir: &Path) -> Self {
        let mut libraries = HashMap::new();
        libraries.insert("work".to_string(), dir.to_string_lossy().into_owned());
        Self {
            libraries,
            executed: Rc::default(),
        }
    }

    pub fn library(mut self, libref: &str, printed: &str) -> Self {
        self.libraries.insert(libref.to_lowercase(), printed.to_string());
        self
    }

    fn put_line(&self, line: &str) -> Option<String> {
        let rest = line.strip_prefix("%put ")?;
        let (token, expr) = rest.split_once('=')?;
        let libref = expr
            .strip_prefix("%sysfunc(pathname(")?
            .split(')')
            .next()?
            .to_lowercase();
        let path = self.libraries.get(&libref).cloned().unwrap_or_default();
        Some(format!("{token}={path}"))
    }

    fn write_dataset(&self, name: &str, rows: &[String]) {
        let (libref, member) = name.split_once('.').unwrap_or(("work", name));
        let Some(dir) = self.libraries.get(&libref.to_lowercase()) else {
            return;
        };
        let table = Table::new(
            ["line"],
            rows.iter().map(|row| vec![Value::String(row.clone())]).collect(),
        );
        let path = PathBuf::from(dir).join(format!("{}.sas7bdat", member.to_lowercase()));
        fs::write(path, serde_json::to_vec(&table).unwrap_or_default()).ok();
    }
}

impl ResponseSource for FakeEngine {
    fn get_response(&self, code: &str, kinds: &[&str]) -> Result<Vec<KernelMessage>, HostError> {
        self.executed.borrow_mut().push(code.to_string());
        let mut html = String::from("<div class=\"sas\">");
        let mut dataset: Option<String> = None;
        let mut rows: Vec<String> = Vec::new();
        let mut in_cards = false;

        for (n, raw) in code.lines().enumerate() {
            let line = raw.trim();
            let upper = line.to_uppercase();
            if in_cards {
                if line.starts_with(';') || upper.starts_with("RUN;") || upper.starts_with("PROC ") {
                    in_cards = false;
                    if let Some(name) = dataset.take() {
                        self.write_dataset(&name, &rows);
                    }
                    rows.clear();
                } else {
                    rows.push(line.to_string());
                    continue;
                }
            }
            html.push_str(&format!("<span class=\"err\">{}    {line}</span><br>", n + 1));
            if let Some(output) = self.put_line(line) {
                html.push_str(&format!("<span class=\"s\">{output}</span><br>"));
            } else if upper.starts_with("DATA ") {
                let rest = line.get(5..).unwrap_or_default();
                dataset = rest
                    .split([';', ' '])
                    .find(|word| !word.is_empty())
                    .map(str::to_string);
            } else if matches!(upper.as_str(), "CARDS;" | "DATALINES;" | "CARDS4;" | "DATALINES4;") {
                in_cards = true;
            } else if upper.starts_with("PROC PRODUCT_STATUS") {
                html.push_str(
                    "<span class=\"err\">For Base SAS Software ...</span><br>\
                     <span class=\"err\">   Custom version information: 9.4_M6</span><br>",
                );
            }
        }
        if let Some(name) = dataset.take() {
            if in_cards {
                self.write_dataset(&name, &rows);
            }
        }
        html.push_str("</div>");

        let mut messages = vec![(
            "display_data".to_string(),
            json!({"data": {"text/plain": "ignored"}}),
        )];
        if kinds.contains(&EXECUTE_RESULT) {
            messages.push((
                EXECUTE_RESULT.to_string(),
                json!({"data": {"text/html": html}, "execution_count": 1}),
            ));
        }
        Ok(messages)
    }
}

/// Codec storing datasets as JSON tables.
///
/// Files that are not valid UTF-8 fail to decode as UTF-8 and are read as
/// Latin-1 instead.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    pub reads: Rc<RefCell<Vec<(PathBuf, TextEncoding)>>>,
}

impl TableCodec for JsonCodec {
    fn read_table(&self, path: &Path, encoding: TextEncoding) -> Result<Table, CodecError> {
        self.reads.borrow_mut().push((path.to_path_buf(), encoding));
        let bytes = fs::read(path)?;
        let text = match encoding {
            TextEncoding::Utf8 => String::from_utf8(bytes).map_err(|e| CodecError::Decode {
                path: path.display().to_string(),
                encoding,
                message: e.to_string(),
            })?,
            TextEncoding::Latin1 => bytes.into_iter().map(char::from).collect(),
        };
        serde_json::from_str(&text).map_err(|e| CodecError::Format {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// Warning sink remembering every message.
#[derive(Debug, Clone, Default)]
pub struct RecordingWarnings {
    pub messages: Rc<RefCell<Vec<String>>>,
}

impl RecordingWarnings {
    pub fn all(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl WarningSink for RecordingWarnings {
    fn warn(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
