//! Delimiter-aware, permissive CSV parsing.
//!
//! Real transit exports are irregular: ragged rows, stray quotes, blank
//! lines, BOM artifacts. This parser degrades row by row instead of
//! failing; the only fatal condition is an input with no data lines at
//! all. It is deliberately not an RFC-4180 reader, so the `csv` crate is
//! used on the emit side only.

use std::collections::HashMap;

use log::debug;

use crate::error::{Result, TransitError};

/// Header-keyed cell values for one source row. Ephemeral; exists only
/// between parse and map.
pub type GenericRow = HashMap<String, String>;

#[derive(Debug)]
pub struct ParsedTable {
    pub delimiter: char,
    pub headers: Vec<String>,
    pub rows: Vec<GenericRow>,
}

/// Parses decoded text into headers plus generic rows.
///
/// Missing trailing cells become empty strings and cells beyond the header
/// width are dropped, so a ragged row never aborts a load.
pub fn parse_table(text: &str) -> Result<ParsedTable> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lines: Vec<&str> = text.lines().filter(|line| !line.trim().is_empty()).collect();
    if lines.is_empty() {
        return Err(TransitError::EmptyInput);
    }

    let delimiter = sniff_delimiter(lines[0]);
    let headers: Vec<String> = tokenize_line(lines[0], delimiter)
        .iter()
        .map(|cell| strip_wrapping_quotes(cell).trim().to_string())
        .collect();

    let mut rows = Vec::with_capacity(lines.len().saturating_sub(1));
    for line in &lines[1..] {
        let cells = tokenize_line(line, delimiter);
        let mut row = GenericRow::with_capacity(headers.len());
        for (idx, header) in headers.iter().enumerate() {
            let value = cells
                .get(idx)
                .map(|cell| strip_wrapping_quotes(cell).to_string())
                .unwrap_or_default();
            row.insert(header.clone(), value);
        }
        rows.push(row);
    }

    debug!(
        "parsed {} data row(s) across {} column(s), delimiter '{}'",
        rows.len(),
        headers.len(),
        delimiter
    );
    Ok(ParsedTable {
        delimiter,
        headers,
        rows,
    })
}

/// Counts `,` and `;` on the header line only; `;` wins ties. Quoted
/// delimiter characters in the header still count, a known limitation
/// of the source format kept as-is.
fn sniff_delimiter(header_line: &str) -> char {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons >= commas { ';' } else { ',' }
}

/// Single-pass field scanner. A quote toggles quote mode; a doubled quote
/// inside quote mode emits one literal quote; the delimiter splits only
/// outside quote mode. Fields are trimmed as they are pushed.
fn tokenize_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if ch == delimiter && !in_quotes {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push(ch);
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Removes at most one leading and one trailing quote character. Catches
/// leftovers from unbalanced quoting that the tokenizer passed through.
fn strip_wrapping_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_prefers_semicolon_on_tie() {
        assert_eq!(sniff_delimiter("a,b;c"), ';');
        assert_eq!(sniff_delimiter("a,b,c;d"), ',');
    }

    #[test]
    fn quoted_delimiter_is_not_a_split_point() {
        let fields = tokenize_line("\"Moscow, hub\",\"123\"", ',');
        assert_eq!(fields, vec!["Moscow, hub".to_string(), "123".to_string()]);
    }

    #[test]
    fn doubled_quotes_escape_to_one_literal() {
        let fields = tokenize_line("\"say \"\"hi\"\"\"", ',');
        assert_eq!(fields, vec!["say \"hi\"".to_string()]);
    }

    #[test]
    fn fields_are_trimmed() {
        let fields = tokenize_line("  a ; b ;c  ", ';');
        assert_eq!(fields, vec!["a", "b", "c"]);
    }

    #[test]
    fn wrapping_quote_leftovers_are_stripped() {
        assert_eq!(strip_wrapping_quotes("\"open"), "open");
        assert_eq!(strip_wrapping_quotes("close\""), "close");
        assert_eq!(strip_wrapping_quotes("\""), "");
        assert_eq!(strip_wrapping_quotes("plain"), "plain");
    }

    #[test]
    fn bom_and_blank_lines_are_dropped() {
        let table = parse_table("\u{feff}a;b\n\n  \n1;2\r\n3;4\n").expect("parse");
        assert_eq!(table.delimiter, ';');
        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1]["b"], "4");
    }

    #[test]
    fn blank_input_is_the_only_fatal_case() {
        assert!(matches!(parse_table(""), Err(TransitError::EmptyInput)));
        assert!(matches!(parse_table("  \n \n"), Err(TransitError::EmptyInput)));
        assert!(parse_table("only_header").is_ok());
    }

    #[test]
    fn ragged_rows_fill_and_drop() {
        let table = parse_table("a;b;c\n1;2\n1;2;3;4\n").expect("parse");
        assert_eq!(table.rows[0]["c"], "");
        assert_eq!(table.rows[1].len(), 3);
    }
}
