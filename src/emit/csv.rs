use crate::db::{QueryResult, Value};
use crate::error::{CatalogError, Result};
use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

const DELIMITER: char = ',';
const QUOTE: char = '"';
const LINE_END: &str = "\r\n";

/// Quotes a field if it contains the delimiter, a quote or a line break.
///
/// Embedded quotes are doubled.
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([DELIMITER, QUOTE, '\n', '\r']) {
        Cow::Owned(format!("{QUOTE}{}{QUOTE}", field.replace(QUOTE, "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Text written for a value. NULL becomes an empty field.
fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bytes(bytes) => {
            let mut hex = String::with_capacity(2 + bytes.len() * 2);
            hex.push_str("\\x");
            for b in bytes {
                let _ = write!(hex, "{b:02x}");
            }
            hex
        }
        other => other.to_display_string(),
    }
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = Cow<'a, str>>) {
    let fields: Vec<_> = fields.collect();

    // A lone empty field must not collapse into a blank line
    if let [only] = fields.as_slice() {
        if only.is_empty() {
            out.push(QUOTE);
            out.push(QUOTE);
            out.push_str(LINE_END);
            return;
        }
    }

    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        out.push_str(&escape_field(field));
    }
    out.push_str(LINE_END);
}

/// Serializes a result as CSV: a header line, then one line per row.
///
/// Records end in CRLF as RFC 4180 prescribes; line breaks inside quoted
/// fields are kept verbatim.
///
/// Fails if any row's width differs from the header's.
pub fn to_csv(result: &QueryResult) -> Result<String> {
    if let Some(index) = result.find_ragged_row() {
        return Err(CatalogError::internal(format!(
            "row {index} has {} values but the result has {} columns",
            result.rows[index].len(),
            result.columns.len()
        )));
    }

    let mut out = String::new();
    push_record(&mut out, result.column_names().map(Cow::Borrowed));
    for row in &result.rows {
        push_record(&mut out, row.iter().map(|v| Cow::Owned(field_text(v))));
    }
    Ok(out)
}

/// Writes a result to `path` as CSV, replacing any existing file.
///
/// Missing parent directories are created.
pub async fn write_csv(path: &Path, result: &QueryResult) -> Result<()> {
    let content = to_csv(result)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CatalogError::io(parent, e))?;
    }

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CatalogError::io(path, e))?;

    debug!(
        "Wrote {} rows to {}",
        result.row_count(),
        path.display()
    );
    Ok(())
}
