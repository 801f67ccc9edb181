//! The old price export: one metadata line, one header line, then
//! semicolon-delimited rows. Only replaced cells are ever re-encoded;
//! everything else goes back out byte for byte.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::ReconError;

pub const EXPORT_DELIMITER: u8 = b';';

/// One data row: its parsed cells and the exact source text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    cells: Vec<String>,
    /// Source text without the trailing line break(s).
    raw: String,
    /// Line break(s) after the row, possibly empty on the last line.
    ending: String,
    /// 1-based line in the source file where the row starts.
    line: usize,
    /// Cells replaced through [`OldExport::set_cell`].
    edits: BTreeMap<usize, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OldExport {
    /// First line, without its line terminator.
    pub metadata: String,
    /// Header names, trimmed for lookup.
    pub headers: Vec<String>,
    /// Metadata and header lines exactly as read.
    prologue: String,
    rows: Vec<Row>,
}

impl OldExport {
    pub fn parse(source: &str, content: &str) -> Result<Self, ReconError> {
        let (metadata, rest) = match content.split_once('\n') {
            Some((first, rest)) => (first.trim_end_matches('\r'), rest),
            None => {
                return Err(ReconError::MissingHeader {
                    source: source.into(),
                })
            }
        };
        let rest_offset = content.len() - rest.len();

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(EXPORT_DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(rest.as_bytes());

        let mut records = reader.records();
        let headers: Vec<String> = match records.next() {
            Some(record) => record
                .map_err(|e| csv_err(source, e))?
                .iter()
                .map(|h| h.trim().to_string())
                .collect(),
            None => {
                return Err(ReconError::MissingHeader {
                    source: source.into(),
                })
            }
        };

        // Record starts as byte offsets into `rest`. Pending line breaks of
        // the previous record (or blank lines) belong to what came before.
        let mut parsed: Vec<(usize, Vec<String>)> = Vec::new();
        for record in records {
            let record = record.map_err(|e| csv_err(source, e))?;
            let pos = record.position().map(|p| p.byte() as usize).unwrap_or(rest.len());
            let start = pos + rest[pos..].bytes().take_while(|b| *b == b'\r' || *b == b'\n').count();
            parsed.push((start, record.iter().map(str::to_string).collect()));
        }

        let first_row = parsed.first().map(|(start, _)| *start).unwrap_or(rest.len());
        let prologue = content[..rest_offset + first_row].to_string();

        let mut rows = Vec::with_capacity(parsed.len());
        let mut line = 1 + prologue.matches('\n').count();
        for i in 0..parsed.len() {
            let start = parsed[i].0;
            let end = parsed.get(i + 1).map(|(next, _)| *next).unwrap_or(rest.len());
            let text = &rest[start..end];
            let body = text.trim_end_matches(['\r', '\n']);
            rows.push(Row {
                cells: std::mem::take(&mut parsed[i].1),
                raw: body.to_string(),
                ending: text[body.len()..].to_string(),
                line,
                edits: BTreeMap::new(),
            });
            line += text.matches('\n').count();
        }

        Ok(Self {
            metadata: metadata.to_string(),
            headers,
            prologue,
            rows,
        })
    }

    pub fn column(&self, source: &str, name: &str) -> Result<usize, ReconError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReconError::MissingColumn {
                source: source.into(),
                column: name.into(),
            })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text, empty when the row is shorter than the header.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.edits.get(&col).or_else(|| r.cells.get(col)))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Replace one cell. Only replaced cells are re-encoded on render; the
    /// rest of the row keeps its source text.
    pub fn set_cell(&mut self, row: usize, col: usize, value: String) {
        if let Some(r) = self.rows.get_mut(row) {
            r.edits.insert(col, value);
        }
    }

    /// 1-based line number of a data row in the source file.
    pub fn line_of(&self, row: usize) -> usize {
        self.rows.get(row).map(|r| r.line).unwrap_or(0)
    }

    /// The source text with replaced cells spliced in. Untouched rows, the
    /// header and the metadata line come back byte for byte.
    pub fn render(&self) -> Result<String, ReconError> {
        let body: usize = self.rows.iter().map(|r| r.raw.len() + r.ending.len()).sum();
        let mut out = String::with_capacity(self.prologue.len() + body);
        out.push_str(&self.prologue);
        for row in &self.rows {
            if row.edits.is_empty() {
                out.push_str(&row.raw);
            } else {
                out.push_str(&splice(&row.raw, &row.edits));
            }
            out.push_str(&row.ending);
        }
        Ok(out)
    }
}

/// Byte ranges of the fields in one raw record. Quotes only open a quoted
/// field at its first byte; `""` inside quotes is an escaped quote.
fn field_spans(raw: &str) -> Vec<Range<usize>> {
    let bytes = raw.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else if b == EXPORT_DELIMITER {
            spans.push(start..i);
            start = i + 1;
        } else if b == b'"' && i == start {
            in_quotes = true;
        }
        i += 1;
    }
    spans.push(start..bytes.len());
    spans
}

fn splice(raw: &str, edits: &BTreeMap<usize, String>) -> String {
    let spans = field_spans(raw);
    let delimiter = EXPORT_DELIMITER as char;
    let mut out = String::with_capacity(raw.len() + 8);
    let mut last = 0;

    for (col, span) in spans.iter().enumerate() {
        if let Some(value) = edits.get(&col) {
            out.push_str(&raw[last..span.start]);
            out.push_str(&encode_field(value));
            last = span.end;
        }
    }
    out.push_str(&raw[last..]);

    // Cells past the end of a short row
    let mut width = spans.len();
    for (&col, value) in edits.range(spans.len()..) {
        for _ in width..col {
            out.push(delimiter);
        }
        out.push(delimiter);
        out.push_str(&encode_field(value));
        width = col + 1;
    }
    out
}

fn encode_field(value: &str) -> String {
    let needs_quotes = value
        .bytes()
        .any(|b| b == EXPORT_DELIMITER || b == b'"' || b == b'\n' || b == b'\r');
    if needs_quotes {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Write records with `delimiter`, quoting only where a field needs it.
pub fn write_delimited<I, R, F>(delimiter: u8, records: I) -> Result<String, ReconError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(Vec::new());

    for record in records {
        writer
            .write_record(record)
            .map_err(|e| ReconError::Io(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReconError::Io(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconError::Io(e.to_string()))
}

fn csv_err(source: &str, e: csv::Error) -> ReconError {
    ReconError::Csv {
        source: source.into(),
        message: e.to_string(),
    }
}
