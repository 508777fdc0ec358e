//! Minimal RFC 4180 reader
//!
//! Handles quoted fields with embedded commas, doubled quotes and line breaks,
//! and both LF and CRLF record terminators. Blank lines are dropped. A quote that
//! does not start a field is kept as a literal character (`5" display`).

/// Header row plus data rows, exactly as they appear in the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Why a document could not be read as CSV
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsvError {
    /// No header row at all
    MissingHeader,
    /// A quoted field was still open at end of input
    UnterminatedQuote { line: usize },
}

impl std::fmt::Display for CsvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "CSV has no header row"),
            Self::UnterminatedQuote { line } => {
                write!(f, "unterminated quoted field starting on line {line}")
            }
        }
    }
}

impl CsvTable {
    /// Parse a whole document; a leading UTF-8 BOM is ignored
    pub fn parse(content: &str) -> Result<Self, CsvError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut records = parse_records(content)?.into_iter();

        let headers = records.next().ok_or(CsvError::MissingHeader)?;
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(CsvError::MissingHeader);
        }

        Ok(Self {
            headers,
            rows: records.collect(),
        })
    }

    /// Rows as (header, value) pairs; short rows are padded with empty values
    pub fn pairs(&self) -> impl Iterator<Item = Vec<(&str, &str)>> + '_ {
        self.rows.iter().map(move |row| {
            self.headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.as_str(), row.get(i).map_or("", String::as_str)))
                .collect()
        })
    }
}

fn parse_records(content: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut quote_line = 0;
    let mut line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        // A quote only opens a quoted field as its first character; elsewhere it is literal
        match c {
            '"' if field_start => {
                in_quotes = true;
                field_start = false;
                quote_line = line;
            }
            ',' => {
                record.push(std::mem::take(&mut field));
                field_start = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
                field_start = true;
            }
            _ => {
                field.push(c);
                field_start = false;
            }
        }
    }

    if in_quotes {
        return Err(CsvError::UnterminatedQuote { line: quote_line });
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }

    Ok(records)
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    let blank = record.len() == 1 && record[0].is_empty();
    if !blank {
        records.push(record);
    }
}

/// Quote a value when it carries a delimiter, quote or line break
pub fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_table() {
        let table = CsvTable::parse("id,text\nREQ-1,The pump shall start.\n").unwrap();
        assert_eq!(table.headers, vec!["id", "text"]);
        assert_eq!(table.rows, vec![vec!["REQ-1", "The pump shall start."]]);
    }

    #[test]
    fn test_quoting_rules() {
        let content = "id,text\r\n\"REQ-1\",\"Open, then \"\"close\"\"\nthe valve\"\r\n";
        let table = CsvTable::parse(content).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "Open, then \"close\"\nthe valve");
    }

    #[test]
    fn test_bom_blank_lines_and_missing_trailing_newline() {
        let table = CsvTable::parse("\u{feff}id,text\n\nREQ-1,a\n\nREQ-2,b").unwrap();
        assert_eq!(table.headers[0], "id");
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["REQ-2", "b"]);
    }

    #[test]
    fn test_mid_field_quote_is_literal() {
        let content = "id,text,method\nREQ-001,The panel shall have a 5\" display.,Test\n";
        let table = CsvTable::parse(content).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0], vec!["REQ-001", "The panel shall have a 5\" display.", "Test"]);
    }

    #[test]
    fn test_literal_quotes_on_separate_rows_do_not_merge_records() {
        let content = "id,text,method\n\
                       REQ-001,The panel shall have a 5\" display.,Inspection\n\
                       REQ-002,The system should be fast.,\n\
                       REQ-003,The bezel shall be 1\" wide.,Test\n";
        let table = CsvTable::parse(content).unwrap();

        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0][2], "Inspection");
        assert_eq!(table.rows[1][0], "REQ-002");
        assert_eq!(table.rows[2][1], "The bezel shall be 1\" wide.");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = CsvTable::parse("id,title,text\nREQ-1\n").unwrap();
        let pairs: Vec<_> = table.pairs().collect();
        assert_eq!(pairs[0], vec![("id", "REQ-1"), ("title", ""), ("text", "")]);
    }

    #[test]
    fn test_errors() {
        assert_eq!(CsvTable::parse(""), Err(CsvError::MissingHeader));
        assert_eq!(CsvTable::parse("\u{feff}\n\n"), Err(CsvError::MissingHeader));
        assert_eq!(
            CsvTable::parse("id,text\nREQ-1,\"open"),
            Err(CsvError::UnterminatedQuote { line: 2 })
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
