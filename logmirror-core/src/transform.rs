//! The line transformation.
//!
//! Deliberately format-agnostic: whatever the source line contains, the
//! transformed line is the original content plus a marker recording
//! when it went through the pipeline.

use chrono::Local;

/// Separator between the original line content and the marker.
pub const MARKER_SEPARATOR: &str = ": Transformed at ";

/// Transforms one source line.
///
/// Pure given (line, wall clock); the embedded timestamp means output
/// is not reproducible byte-for-byte across runs, and tests should
/// assert on the prefix rather than the whole line.
pub fn transform_line(line: &str) -> String {
    format!("{}{}{}", line, MARKER_SEPARATOR, Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_content_is_preserved_as_prefix() {
        let out = transform_line("GET /health 200");
        assert!(out.starts_with("GET /health 200: Transformed at "));
    }

    #[test]
    fn test_empty_line_still_gets_a_marker() {
        let out = transform_line("");
        assert!(out.starts_with(": Transformed at "));
        assert!(out.len() > MARKER_SEPARATOR.len());
    }
}
