//! Table upload as an in-stream `DATALINES4` data step.

use std::collections::HashSet;

use sas_bridge_core::{Submit, Table, TableUploader, UploadError};
use serde_json::Value;

/// Longest name SAS accepts for variables and datasets.
const MAX_NAME_LEN: usize = 32;

/// Uploads tables by submitting a data step with the rows inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatalinesUploader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Character { length: usize },
}

impl DatalinesUploader {
    /// Data step creating `target` from `table`.
    ///
    /// # Errors
    /// Returns error if the table is empty, ragged, or holds nested values.
    pub fn data_step(table: &Table, target: &str) -> Result<String, UploadError> {
        if table.columns.is_empty() {
            return Err(UploadError::NoColumns);
        }
        let expected = table.column_count();
        if let Some((row, cells)) = table
            .rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != expected)
        {
            return Err(UploadError::RaggedRow {
                row,
                found: cells.len(),
                expected,
            });
        }

        let names = variable_names(table);
        let kinds = (0..expected)
            .map(|index| column_kind(table, index, &names[index]))
            .collect::<Result<Vec<_>, _>>()?;

        let mut code = format!("DATA {target};\n  INFILE DATALINES DSD DLM=',' TRUNCOVER;\n  LENGTH");
        for (name, kind) in names.iter().zip(&kinds) {
            match kind {
                ColumnKind::Numeric => code.push_str(&format!(" {name} 8")),
                ColumnKind::Character { length } => code.push_str(&format!(" {name} $ {length}")),
            }
        }
        code.push_str(";\n  INPUT");
        for (name, kind) in names.iter().zip(&kinds) {
            code.push(' ');
            code.push_str(name);
            if matches!(kind, ColumnKind::Character { .. }) {
                code.push_str(" $");
            }
        }
        code.push_str(";\nDATALINES4;\n");
        for row in &table.rows {
            let line = row
                .iter()
                .zip(&kinds)
                .map(|(cell, kind)| render_cell(cell, *kind))
                .collect::<Vec<_>>()
                .join(",");
            code.push_str(&line);
            code.push('\n');
        }
        code.push_str(";;;;\nRUN;\n");
        Ok(code)
    }
}

impl TableUploader for DatalinesUploader {
    fn upload(
        &self,
        session: &mut dyn Submit,
        table: &Table,
        name: &str,
        libref: &str,
    ) -> Result<(), UploadError> {
        let dataset = sas_name(name);
        let target = if libref.is_empty() {
            dataset
        } else {
            format!("{libref}.{dataset}")
        };
        let code = Self::data_step(table, &target)?;
        tracing::debug!(%target, rows = table.row_count(), "Uploading table to SAS");

        let response = session.submit(&code)?;
        let errors: Vec<&str> = response
            .log
            .lines()
            .filter(|line| line.trim_start().starts_with("ERROR"))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(UploadError::Rejected(errors.join("\n")))
        }
    }
}

/// Turn an arbitrary label into a valid SAS name.
fn sas_name(label: &str) -> String {
    let mut name: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name.truncate(MAX_NAME_LEN);
    name
}

/// Valid, case-insensitively unique variable names for every column.
fn variable_names(table: &Table) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .columns
        .iter()
        .map(|label| {
            let base = sas_name(&label.to_string());
            let mut name = base.clone();
            let mut suffix = 1;
            while !seen.insert(name.to_ascii_lowercase()) {
                suffix += 1;
                let tag = format!("_{suffix}");
                let keep = base.len().min(MAX_NAME_LEN - tag.len());
                name = format!("{}{tag}", &base[..keep]);
            }
            name
        })
        .collect()
}

fn column_kind(table: &Table, index: usize, name: &str) -> Result<ColumnKind, UploadError> {
    let mut character = false;
    let mut length = 1;
    for cell in table.column(index) {
        match cell {
            Value::String(s) => {
                character = true;
                length = length.max(s.len());
            }
            Value::Number(n) => length = length.max(n.to_string().len()),
            Value::Null | Value::Bool(_) => {}
            Value::Array(_) | Value::Object(_) => {
                return Err(UploadError::UnsupportedValue {
                    column: name.to_string(),
                    value: cell.to_string(),
                });
            }
        }
    }
    Ok(if character {
        ColumnKind::Character { length }
    } else {
        ColumnKind::Numeric
    })
}

fn render_cell(cell: &Value, kind: ColumnKind) -> String {
    let text = match cell {
        Value::Null => return String::new(),
        Value::Bool(b) => String::from(if *b { "1" } else { "0" }),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.replace(['\n', '\r'], " "),
        Value::Array(_) | Value::Object(_) => cell.to_string(),
    };
    match kind {
        ColumnKind::Numeric => text,
        ColumnKind::Character { .. } => format!("\"{}\"", text.replace('"', "\"\"")),
    }
}
