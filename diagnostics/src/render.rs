use std::fmt::Write;

use crate::location::SourceLocation;

/// Render a single-line diagnostic with the offending source line and a caret
/// underline, e.g.
///
/// ```text
/// error: Left operand of - operator is not a 'number', but a 'boolean'.
///  --> 1:1
///   |
/// 1 | true - 1
///   | ^^^^
/// ```
pub fn render_snippet(source: &str, location: &SourceLocation, message: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "error: {message}");
    let _ = writeln!(out, " --> {location}");

    let line_no = location.start.line as usize;
    let Some(line) = source.lines().nth(line_no.saturating_sub(1)) else {
        return out;
    };

    let gutter = line_no.to_string().len();
    let _ = writeln!(out, "{:gutter$} |", "");
    let _ = writeln!(out, "{line_no} | {line}");

    let col = location.start.column.max(1) as usize;
    let width = if location.end.line == location.start.line {
        (location.end.column as usize).saturating_sub(col).max(1)
    } else {
        line.chars().count().saturating_sub(col - 1).max(1)
    };
    let _ = writeln!(
        out,
        "{:gutter$} | {}{}",
        "",
        " ".repeat(col - 1),
        "^".repeat(width)
    );
    out
}
