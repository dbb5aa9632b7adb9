use std::borrow::Cow;

/// One parsed CSV record with enough source tracking to preserve it verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRecord {
    pub fields: Vec<String>,
    /// 1-based line number where the record starts
    pub line: usize,
    /// The record's source text, without its line terminator
    pub raw: String,
}

/// Split CSV text into records.
///
/// Quoted fields may contain commas, doubled quotes and line breaks. A stray
/// quote inside an unquoted field opens a quoted run rather than failing, so
/// the parser never rejects input; malformed rows surface later as a wrong
/// column count. Blank lines are skipped. A leading byte-order mark is ignored.
pub fn parse_records(source: &str) -> Vec<CsvRecord> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut record_start = 0;
    let mut line = 1;
    let mut record_line = 1;

    let mut chars = source.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if matches!(chars.peek(), Some((_, '"'))) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                push_record(
                    &mut records,
                    std::mem::take(&mut fields),
                    record_line,
                    &source[record_start..i],
                );
                record_start = i + 1;
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if record_start < source.len() {
        fields.push(field);
        push_record(&mut records, fields, record_line, &source[record_start..]);
    }

    records
}

fn push_record(records: &mut Vec<CsvRecord>, fields: Vec<String>, line: usize, raw: &str) {
    if fields.len() == 1 && fields[0].is_empty() {
        return;
    }
    records.push(CsvRecord {
        fields,
        line,
        raw: raw.trim_end_matches('\r').to_string(),
    });
}

/// Quote a field when it contains a delimiter, quote or line break
pub fn quote_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Append one record (with trailing newline) to `out`
pub fn write_record<S: AsRef<str>>(out: &mut String, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote_field(field.as_ref()));
    }
    out.push('\n');
}
