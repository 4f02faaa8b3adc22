//! Cell-level helpers shared by the dialect parsers: line splitting,
//! quote-aware record reading, amounts and dates.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::ParseError;

/// Trimmed, non-blank lines of an export
pub(crate) fn significant_lines(raw: &str) -> Vec<&str> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Groups of trimmed lines separated by one or more blank lines
pub(crate) fn sections(raw: &str) -> Vec<Vec<&str>> {
    let mut sections = Vec::new();
    let mut current = Vec::new();

    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

/// Header names of a single CSV line, lower-cased
pub(crate) fn header_names(line: &str) -> Result<Columns, ParseError> {
    let mut reader = reader_for(line, false);
    let mut record = StringRecord::new();
    reader.read_record(&mut record)?;
    Ok(Columns::from_record(&record))
}

/// Read a block of lines whose first line is the header
pub(crate) fn read_table(lines: &[&str]) -> Result<(Columns, Vec<StringRecord>), ParseError> {
    let text = lines.join("\n");
    let mut reader = reader_for(&text, true);
    let columns = Columns::from_record(reader.headers()?);
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok((columns, records))
}

fn reader_for(text: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes())
}

/// Lower-cased header row with name lookup
#[derive(Debug, Clone)]
pub(crate) struct Columns(Vec<String>);

impl Columns {
    fn from_record(record: &StringRecord) -> Self {
        Columns(record.iter().map(|h| h.trim().to_lowercase()).collect())
    }

    /// Index of the first column matching any of `names`
    pub(crate) fn find(&self, names: &[&str]) -> Option<usize> {
        self.0.iter().position(|h| names.contains(&h.as_str()))
    }

    pub(crate) fn has(&self, name: &str) -> bool {
        self.0.iter().any(|h| h == name)
    }
}

/// Cell text, empty when the row is shorter than the header
pub(crate) fn cell(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

/// Parse a monetary or numeric cell.
///
/// `$`, `,` and parentheses are stripped; a value wrapped in parentheses is
/// an accounting-style negative. Returns `None` for blank or non-finite input.
pub(crate) fn parse_amount(value: &str) -> Option<f64> {
    let value = value.trim();
    let negated = value.starts_with('(') && value.ends_with(')');
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '(' | ')'))
        .collect();

    let parsed = cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(if negated { -parsed } else { parsed })
}

/// Parse a trade date cell as `MM/DD/YYYY` or `YYYY-MM-DD`.
///
/// Anything after the first whitespace (a time of day) is ignored. The
/// result must be a real calendar date.
pub(crate) fn parse_trade_date(value: &str) -> Option<NaiveDate> {
    let token = value.split_whitespace().next()?;

    if token.contains('/') {
        let mut parts = token.split('/');
        let (month, day, year) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() || year.len() != 4 {
            return None;
        }
        NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
    } else {
        NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_strips_currency_formatting() {
        assert_eq!(parse_amount("$1,250.50"), Some(1250.5));
        assert_eq!(parse_amount("-$75.00"), Some(-75.0));
        assert_eq!(parse_amount(" 42 "), Some(42.0));
    }

    #[test]
    fn test_parse_amount_parentheses_are_negative() {
        assert_eq!(parse_amount("($50.00)"), Some(-50.0));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_trade_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 6).unwrap();
        assert_eq!(parse_trade_date("01/06/2024"), Some(expected));
        assert_eq!(parse_trade_date("1/6/2024"), Some(expected));
        assert_eq!(parse_trade_date("2024-01-06"), Some(expected));
        assert_eq!(parse_trade_date("01/06/2024 9:30:00 AM"), Some(expected));
    }

    #[test]
    fn test_parse_trade_date_rejects_invalid_calendar_dates() {
        assert_eq!(parse_trade_date("02/30/2024"), None);
        assert_eq!(parse_trade_date("2024-13-01"), None);
        assert_eq!(parse_trade_date("01/06/24"), None);
        assert_eq!(parse_trade_date("Jan 6 2024"), None);
        assert_eq!(parse_trade_date(""), None);
    }

    #[test]
    fn test_sections_split_on_blank_lines() {
        let raw = "a,b\n1,2\n\n\nc,d\r\n3,4\n";
        let sections = sections(raw);
        assert_eq!(sections, vec![vec!["a,b", "1,2"], vec!["c,d", "3,4"]]);
    }

    #[test]
    fn test_header_names_are_quote_aware() {
        let columns = header_names("\"Net Profit\",\"Entry Time, Local\",Strategy").unwrap();
        assert_eq!(columns.find(&["net profit"]), Some(0));
        assert_eq!(columns.find(&["entry time, local"]), Some(1));
        assert!(columns.has("strategy"));
    }

    #[test]
    fn test_read_table_keeps_quoted_commas() {
        let (columns, rows) =
            read_table(&["profit,date", "\"$1,200.00\",2024-01-05"]).unwrap();
        let idx = columns.find(&["profit"]).unwrap();
        assert_eq!(cell(&rows[0], idx), "$1,200.00");
        assert_eq!(cell(&rows[0], 9), "");
    }
}
