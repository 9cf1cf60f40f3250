//! Quoting for the configurable fragments of report queries.

/// Renders a string as a single-quoted SQL literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Renders a possibly schema-qualified name as quoted identifiers.
///
/// `public.project` becomes `"public"."project"`.
pub fn quote_identifier_path(path: &str) -> String {
    path.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}
