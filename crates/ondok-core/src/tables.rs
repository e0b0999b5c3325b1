//! Reading tabular sources for the vocabulary and score range tables.
//!
//! Sources are small comma-separated files, historically saved as EUC-KR.
//! Bytes are decoded as UTF-8 first (BOM stripped) and fall back to EUC-KR
//! when they are not valid UTF-8. Columns are located by header name, in
//! Korean or English.

use std::borrow::Cow;

use camino::Utf8Path;

use crate::error::{TableError, TableResult};

/// Decode raw table bytes to text.
///
/// Tries UTF-8 (with or without BOM) and falls back to EUC-KR.
pub fn decode_bytes(bytes: &[u8]) -> Cow<'_, str> {
    let (content, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(bytes);
    if !had_errors {
        return content;
    }
    tracing::debug!("table is not valid UTF-8, decoding as EUC-KR");
    let (content, _, _) = encoding_rs::EUC_KR.decode(bytes);
    content
}

/// Read and decode a table file.
pub fn read_table(path: &Utf8Path) -> TableResult<String> {
    let bytes = std::fs::read(path.as_std_path()).map_err(|source| TableError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_bytes(&bytes).into_owned())
}

/// A parsed table: header cells plus data rows tagged with their line number.
#[derive(Debug, Clone)]
pub struct Records {
    header: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl Records {
    /// Parse comma-separated text. Blank lines are ignored.
    pub fn parse(text: &str) -> TableResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header_line)) = lines.next() else {
            return Err(TableError::Empty);
        };
        let header = split_record(header_line);
        let rows: Vec<_> = lines.map(|(n, line)| (n, split_record(line))).collect();

        if rows.is_empty() {
            return Err(TableError::Empty);
        }
        Ok(Self { header, rows })
    }

    /// Index of the first header matching one of `accepted` (case-insensitive).
    pub fn column(&self, column: &'static str, accepted: &[&str]) -> TableResult<usize> {
        self.header
            .iter()
            .position(|h| accepted.iter().any(|a| h.eq_ignore_ascii_case(a)))
            .ok_or_else(|| TableError::MissingColumn {
                column,
                accepted: accepted.join(", "),
            })
    }

    /// Data rows with 1-based line numbers.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows.iter().map(|(n, cells)| (*n, cells.as_slice()))
    }
}

/// Fetch a trimmed cell, reporting a row error when the row is too short.
pub fn cell(cells: &[String], idx: usize, line: usize) -> TableResult<&str> {
    cells
        .get(idx)
        .map(|c| c.trim())
        .ok_or_else(|| TableError::InvalidRow {
            line,
            message: format!("expected at least {} columns, found {}", idx + 1, cells.len()),
        })
}

/// Split one CSV record, honoring double-quoted fields and `""` escapes.
fn split_record(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_record() {
        assert_eq!(split_record("분석,1"), vec!["분석", "1"]);
    }

    #[test]
    fn splits_quoted_record_with_comma() {
        assert_eq!(
            split_record(r#""0~139","초등 1, 2학년""#),
            vec!["0~139", "초등 1, 2학년"]
        );
    }

    #[test]
    fn quoted_escape_keeps_quote() {
        assert_eq!(split_record(r#""a ""b"" c",2"#), vec![r#"a "b" c"#, "2"]);
    }

    #[test]
    fn decodes_utf8_with_bom() {
        let bytes = "\u{feff}단어,등급\n".as_bytes();
        assert_eq!(decode_bytes(bytes), "단어,등급\n");
    }

    #[test]
    fn decodes_euc_kr_fallback() {
        let (encoded, _, _) = encoding_rs::EUC_KR.encode("단어,등급\n분석,1\n");
        assert!(std::str::from_utf8(&encoded).is_err());
        assert_eq!(decode_bytes(&encoded), "단어,등급\n분석,1\n");
    }

    #[test]
    fn header_only_is_empty() {
        assert!(matches!(Records::parse("단어,등급\n"), Err(TableError::Empty)));
    }

    #[test]
    fn column_lookup_accepts_english() {
        let records = Records::parse("Word,Grade\n분석,1\n").unwrap();
        assert_eq!(records.column("grade", &["등급", "grade"]).unwrap(), 1);
        assert!(matches!(
            records.column("label", &["대상 학년"]),
            Err(TableError::MissingColumn { .. })
        ));
    }

    #[test]
    fn rows_keep_line_numbers_past_blank_lines() {
        let records = Records::parse("단어,등급\n\n분석,1\n").unwrap();
        let (line, cells) = records.rows().next().unwrap();
        assert_eq!(line, 3);
        assert_eq!(cells[0], "분석");
    }

    #[test]
    fn read_table_reports_missing_file() {
        let err = read_table(Utf8Path::new("/nonexistent/vocab.csv")).unwrap_err();
        assert!(matches!(err, TableError::Read { .. }));
    }
}
