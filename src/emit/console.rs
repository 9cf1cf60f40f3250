use crate::db::QueryResult;
use crate::error::{CatalogError, Result};
use std::io::Write;

/// Renders a result as `label: (v1, v2), (v3, v4)`.
pub fn render_line(label: &str, result: &QueryResult) -> String {
    if result.is_empty() {
        return format!("{label}: (no rows)");
    }

    let rows: Vec<String> = result
        .rows
        .iter()
        .map(|row| {
            let values: Vec<String> = row.iter().map(|v| v.to_display_string()).collect();
            format!("({})", values.join(", "))
        })
        .collect();

    format!("{label}: {}", rows.join(", "))
}

/// Writes the rendered line for a result to `out`.
pub fn write_line<W: Write>(out: &mut W, label: &str, result: &QueryResult) -> Result<()> {
    writeln!(out, "{}", render_line(label, result))
        .and_then(|()| out.flush())
        .map_err(|e| CatalogError::io("<stdout>", e))
}
