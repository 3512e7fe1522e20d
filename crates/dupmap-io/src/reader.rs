use std::fs::File;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use dupmap_core::{ColumnMap, ColumnNames, DupError, DupResult, RawRecord, RelationRecord};

/// How to read a delimited relation file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputOptions {
    pub delimiter: char,
    /// When set, the first row names the columns and `columns` is resolved
    /// against it. Otherwise the fixed question-pair layout is assumed.
    pub has_header: bool,
    pub columns: ColumnNames,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
            columns: ColumnNames::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// DelimitedReader
// ---------------------------------------------------------------------------

/// Splits a delimited stream into rows of raw fields.
///
/// Fields may be wrapped in double quotes; inside quotes the delimiter and
/// line breaks are literal and `""` stands for one quote. Blank lines are
/// skipped. Bytes that are not valid UTF-8 decode to U+FFFD.
pub struct DelimitedReader<R> {
    reader: R,
    delimiter: char,
    header: Option<Vec<String>>,
    /// Data rows returned so far.
    row: usize,
    /// Physical lines consumed so far.
    line: usize,
    done: bool,
}

impl<R: BufRead> DelimitedReader<R> {
    pub fn new(reader: R, delimiter: char, has_header: bool) -> DupResult<Self> {
        let mut rows = Self {
            reader,
            delimiter,
            header: None,
            row: 0,
            line: 0,
            done: false,
        };
        if has_header {
            let header = match rows.read_fields(0) {
                Some(fields) => fields?,
                None => return Err(DupError::Config("input is empty, expected a header row".into())),
            };
            rows.header = Some(header);
        }
        Ok(rows)
    }

    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    fn read_fields(&mut self, row: usize) -> Option<DupResult<Vec<String>>> {
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut started = false;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let n = match self.reader.read_until(b'\n', &mut buf) {
                Ok(n) => n,
                Err(e) => {
                    return Some(Err(DupError::Io(format!(
                        "read failed at line {}: {e}",
                        self.line + 1
                    ))))
                }
            };
            if n == 0 {
                if !started {
                    return None;
                }
                fields.push(field);
                return Some(Err(DupError::malformed(
                    row,
                    "unterminated quoted field",
                    &fields,
                )));
            }
            self.line += 1;

            // Invalid UTF-8 in free text is replaced, not fatal.
            let decoded = String::from_utf8_lossy(&buf);
            let mut text = decoded.strip_suffix('\n').unwrap_or(&decoded);
            text = text.strip_suffix('\r').unwrap_or(text);
            if self.line == 1 {
                text = text.strip_prefix('\u{feff}').unwrap_or(text);
            }
            if !started && text.trim().is_empty() {
                continue;
            }
            started = true;

            let mut chars = text.chars().peekable();
            while let Some(c) = chars.next() {
                if in_quotes {
                    if c == '"' {
                        if chars.peek() == Some(&'"') {
                            field.push('"');
                            chars.next();
                        } else {
                            in_quotes = false;
                        }
                    } else {
                        field.push(c);
                    }
                } else if c == '"' && field.is_empty() {
                    in_quotes = true;
                } else if c == self.delimiter {
                    fields.push(std::mem::take(&mut field));
                } else {
                    field.push(c);
                }
            }

            if in_quotes {
                // Quoted field continues on the next physical line.
                field.push('\n');
                continue;
            }
            fields.push(field);
            return Some(Ok(fields));
        }
    }
}

impl<R: BufRead> Iterator for DelimitedReader<R> {
    type Item = DupResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let row = self.row + 1;
        match self.read_fields(row) {
            Some(Ok(fields)) => {
                self.row = row;
                Some(Ok(RawRecord::new(row, fields)))
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// RecordReader
// ---------------------------------------------------------------------------

/// Typed relation records read from a delimited source, in file order.
pub struct RecordReader<K, R> {
    rows: DelimitedReader<R>,
    columns: ColumnMap,
    _id: PhantomData<K>,
}

impl<K: FromStr> RecordReader<K, BufReader<File>> {
    pub fn open(path: &Path, options: &InputOptions) -> DupResult<Self> {
        let file = File::open(path)
            .map_err(|e| DupError::Io(format!("cannot open {}: {e}", path.display())))?;
        let reader = Self::from_reader(BufReader::new(file), options)?;
        debug!(path = %path.display(), columns = ?reader.columns, "opened input");
        Ok(reader)
    }
}

impl<K: FromStr, R: BufRead> RecordReader<K, R> {
    pub fn from_reader(reader: R, options: &InputOptions) -> DupResult<Self> {
        let rows = DelimitedReader::new(reader, options.delimiter, options.has_header)?;
        let columns = match rows.header() {
            Some(header) => ColumnMap::from_header(header, &options.columns)?,
            None => ColumnMap::default(),
        };
        Ok(Self {
            rows,
            columns,
            _id: PhantomData,
        })
    }
}

impl<K: FromStr, R: BufRead> Iterator for RecordReader<K, R> {
    type Item = DupResult<RelationRecord<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.rows.next()?;
        Some(raw.and_then(|raw| raw.parse(&self.columns)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dupmap_core::Label;
    use std::io::Cursor;
    use std::io::Write as _;

    fn rows(input: &str, has_header: bool) -> Vec<DupResult<RawRecord>> {
        DelimitedReader::new(Cursor::new(input), ',', has_header)
            .unwrap()
            .collect()
    }

    fn fields(input: &str) -> Vec<Vec<String>> {
        rows(input, false)
            .into_iter()
            .map(|r| r.unwrap().fields)
            .collect()
    }

    #[test]
    fn test_plain_fields() {
        assert_eq!(fields("a,b,c\n1,2,3\n"), vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_quoted_delimiter_and_escaped_quote() {
        let got = fields("1,\"Hi, there\",\"say \"\"no\"\"\",\"\"\n");
        assert_eq!(got, vec![vec!["1", "Hi, there", "say \"no\"", ""]]);
    }

    #[test]
    fn test_quoted_field_spans_lines() {
        let got = fields("1,\"first line\nsecond line\",x\r\n2,y,z\n");
        assert_eq!(got.len(), 2);
        assert_eq!(got[0][1], "first line\nsecond line");
        assert_eq!(got[0][2], "x");
        assert_eq!(got[1], vec!["2", "y", "z"]);
    }

    #[test]
    fn test_blank_lines_skipped_and_rows_numbered() {
        let got = rows("h1,h2\n\n1,2\n\n3,4", true);
        let numbered: Vec<usize> = got.into_iter().map(|r| r.unwrap().row).collect();
        assert_eq!(numbered, vec![1, 2]);
    }

    #[test]
    fn test_trailing_empty_field() {
        assert_eq!(fields("1,2,\n"), vec![vec!["1", "2", ""]]);
    }

    #[test]
    fn test_bom_stripped_from_header() {
        let reader = DelimitedReader::new(Cursor::new("\u{feff}qid1,qid2\n"), ',', true).unwrap();
        assert_eq!(reader.header().unwrap()[0], "qid1");
    }

    #[test]
    fn test_unterminated_quote_is_malformed() {
        let got = rows("1,\"never closed\n2,3\n", false);
        assert_eq!(got.len(), 1);
        match &got[0] {
            Err(DupError::MalformedRecord { row, reason, .. }) => {
                assert_eq!(*row, 1);
                assert!(reason.contains("unterminated"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_text_is_replaced() {
        let input: &[u8] = b"0,1,2,caf\xE9,cafe,1\n1,2,3,x,y,1\n";
        let options = InputOptions {
            has_header: false,
            ..Default::default()
        };
        let records: Vec<RelationRecord<u64>> = RecordReader::from_reader(Cursor::new(input), &options)
            .unwrap()
            .collect::<DupResult<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text_a.as_deref(), Some("caf\u{FFFD}"));
        assert_eq!((records[1].id_a, records[1].id_b), (2, 3));
    }

    #[test]
    fn test_empty_input_with_header_required() {
        let err = DelimitedReader::new(Cursor::new(""), ',', true).err().unwrap();
        assert!(matches!(err, DupError::Config(_)));
    }

    #[test]
    fn test_custom_delimiter() {
        let got: Vec<_> = DelimitedReader::new(Cursor::new("1\t2\t\"a\tb\"\n"), '\t', false)
            .unwrap()
            .map(|r| r.unwrap().fields)
            .collect();
        assert_eq!(got, vec![vec!["1", "2", "a\tb"]]);
    }

    #[test]
    fn test_records_resolved_from_header() {
        let input = "is_duplicate,qid2,qid1\n1,20,10\n0,30,10\n";
        let records: Vec<RelationRecord<u64>> =
            RecordReader::from_reader(Cursor::new(input), &InputOptions::default())
                .unwrap()
                .collect::<DupResult<_>>()
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!((records[0].id_a, records[0].id_b), (10, 20));
        assert_eq!(records[0].label, Label::Duplicate);
        assert_eq!(records[1].label, Label::NotDuplicate);
        assert!(records[0].text_a.is_none());
    }

    #[test]
    fn test_records_headerless_default_layout() {
        let options = InputOptions {
            has_header: false,
            ..Default::default()
        };
        let mut reader: RecordReader<u64, _> =
            RecordReader::from_reader(Cursor::new("0,1,2,\"A?\",\"B?\",1\n"), &options).unwrap();
        let rec = reader.next().unwrap().unwrap();
        assert_eq!((rec.id_a, rec.id_b), (1, 2));
        assert_eq!(rec.text_b.as_deref(), Some("B?"));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_records_report_bad_row() {
        let input = "id,qid1,qid2,question1,question2,is_duplicate\n\
                     0,1,2,a,b,1\n\
                     1,3,four,c,d,0\n";
        let results: Vec<DupResult<RelationRecord<u64>>> =
            RecordReader::from_reader(Cursor::new(input), &InputOptions::default())
                .unwrap()
                .collect();
        assert!(results[0].is_ok());
        match &results[1] {
            Err(DupError::MalformedRecord { row, fields, .. }) => {
                assert_eq!(*row, 2);
                assert_eq!(fields[2], "four");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,qid1,qid2,question1,question2,is_duplicate").unwrap();
        writeln!(file, "0,1,2,\"What is Rust?\",\"What's Rust?\",1").unwrap();
        let records: Vec<RelationRecord<u64>> =
            RecordReader::open(file.path(), &InputOptions::default())
                .unwrap()
                .collect::<DupResult<_>>()
                .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text_a.as_deref(), Some("What is Rust?"));
    }

    #[test]
    fn test_open_missing_file() {
        let err = RecordReader::<u64, _>::open(Path::new("/nonexistent/pairs.csv"), &InputOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, DupError::Io(_)));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: InputOptions = serde_json::from_str(r#"{"delimiter": "\t", "has_header": false}"#).unwrap();
        assert_eq!(opts.delimiter, '\t');
        assert!(!opts.has_header);
        assert_eq!(opts.columns, ColumnNames::default());
    }
}
