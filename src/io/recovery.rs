use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Maximum size of the recovery log before inline trimming (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Default number of days before entries are prunable.
pub const PRUNE_AGE_DAYS: i64 = 30;

/// Separator between the timestamp and the rest of an entry header.
const HEADER_SEP: &str = " | ";

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- helpdesk recovery log: append-only record of rows and writes
     that could not be kept in the ticket or POC tables.
     If a ticket went missing, look here.
     View with: hd recovery
     Prune old entries: hd recovery prune
     Safe to delete if empty or stale. -->

---
";

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// Rows dropped while loading a table
    Parser,
    /// A table write that failed; the body holds the unsaved table
    Write,
    /// A ticket removed by an admin
    Delete,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Parser => write!(f, "parser"),
            RecoveryCategory::Write => write!(f, "write"),
            RecoveryCategory::Delete => write!(f, "delete"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "parser" => Some(RecoveryCategory::Parser),
            "write" => Some(RecoveryCategory::Write),
            "delete" => Some(RecoveryCategory::Delete),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, description: impl Into<String>) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            description: description.into(),
            fields: Vec::new(),
            body: String::new(),
        }
    }

    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Path helper
// ---------------------------------------------------------------------------

/// Return the path to the recovery log file.
pub fn recovery_log_path(desk_dir: &Path) -> PathBuf {
    desk_dir.join(".recovery.log")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry formatting
// ---------------------------------------------------------------------------

impl RecoveryEntry {
    /// Markdown block as it is appended to the log: header, `Key: value`
    /// fields, the body in a text fence, then a `---` rule.
    fn to_markdown(&self) -> String {
        use std::fmt::Write as _;

        let mut out = format!(
            "## {}{}{}: {}\n\n",
            self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            HEADER_SEP,
            self.category,
            self.description,
        );
        for (key, value) in &self.fields {
            let _ = writeln!(out, "{}: {}", key, value);
        }
        if !self.body.is_empty() {
            let _ = writeln!(out, "\n```text\n{}", self.body.trim_end_matches('\n'));
            out.push_str("```\n");
        }
        out.push_str("\n---\n");
        out
    }

    /// Format as raw markdown for `hd recovery`.
    pub fn to_display_markdown(&self) -> String {
        self.to_markdown()
    }

    /// Serialize to JSON value for `hd recovery --json`.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append a recovery entry to the log. Errors are swallowed and printed to stderr.
pub fn log_recovery(desk_dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(&recovery_log_path(desk_dir), &entry) {
        eprintln!("warning: could not write to recovery log: {}", e);
    }
}

fn append_entry(path: &Path, entry: &RecoveryEntry) -> io::Result<()> {
    let size = std::fs::metadata(path).map_or(0, |m| m.len());
    if size > MAX_LOG_SIZE {
        trim_old_entries(path);
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if file.metadata()?.len() == 0 {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())
}

/// Drop entries older than [`PRUNE_AGE_DAYS`] once the log has grown past
/// [`MAX_LOG_SIZE`]. Best effort.
fn trim_old_entries(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    let cutoff = Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS);
    let trimmed = prune_entries_before(&content, &cutoff);
    if trimmed.len() < content.len() {
        let _ = atomic_write(path, trimmed.as_bytes());
    }
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Split log text into the preamble (file header) and one chunk per entry.
/// A chunk runs from its `## ` header up to the next header outside a fence.
fn split_log(content: &str) -> (String, Vec<String>) {
    let mut preamble = String::new();
    let mut chunks: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in content.lines() {
        if !in_fence && line.starts_with("## ") {
            chunks.push(String::new());
        }
        if line.starts_with("```") {
            in_fence = !in_fence;
        }
        let target = chunks.last_mut().unwrap_or(&mut preamble);
        target.push_str(line);
        target.push('\n');
    }

    (preamble, chunks)
}

/// Parse one entry chunk. `None` when the header is not recognized.
fn parse_chunk(chunk: &str) -> Option<RecoveryEntry> {
    let mut lines = chunk.lines();
    let header = lines.next()?.strip_prefix("## ")?;
    let (timestamp, category, description) = parse_entry_header(header)?;

    let mut fields = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    let mut in_fence = false;
    for line in lines {
        if in_fence {
            if line == "```" {
                in_fence = false;
            } else {
                body.push(line);
            }
        } else if line.starts_with("```") {
            in_fence = true;
        } else if line == "---" {
            break;
        } else if let Some((key, value)) = line.trim().split_once(": ") {
            fields.push((key.to_string(), value.to_string()));
        }
    }

    Some(RecoveryEntry {
        timestamp,
        category,
        description,
        fields,
        body: body.join("\n"),
    })
}

/// All entries in the log, oldest first
fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    split_log(content)
        .1
        .iter()
        .filter_map(|chunk| parse_chunk(chunk))
        .collect()
}

/// Parse an entry header: `<timestamp> | <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp_str, rest) = header.split_once(HEADER_SEP)?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .ok()?
        .with_timezone(&Utc);
    let (category_str, description) = rest.split_once(": ")?;
    let category = RecoveryCategory::parse_category(category_str)?;
    Some((timestamp, category, description.to_string()))
}

/// Read recovery entries, most recent first, optionally only those at or
/// after `since` and at most `limit` of them.
pub fn read_recovery_entries(
    desk_dir: &Path,
    limit: Option<usize>,
    since: Option<DateTime<Utc>>,
) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(desk_dir)) else {
        return Vec::new();
    };

    let newest_first = parse_entries(&content)
        .into_iter()
        .rev()
        .filter(|e| since.is_none_or(|s| e.timestamp >= s));
    match limit {
        Some(n) => newest_first.take(n).collect(),
        None => newest_first.collect(),
    }
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

/// Prune entries from the recovery log: everything when `all`, otherwise
/// entries older than `before` (default: [`PRUNE_AGE_DAYS`] ago).
/// Returns the number of entries removed.
pub fn prune_recovery(
    desk_dir: &Path,
    before: Option<DateTime<Utc>>,
    all: bool,
) -> io::Result<usize> {
    let path = recovery_log_path(desk_dir);
    if !path.exists() {
        return Ok(0);
    }

    let content = std::fs::read_to_string(&path)?;
    let kept = if all {
        FILE_HEADER.to_string()
    } else {
        let cutoff = before.unwrap_or_else(|| Utc::now() - chrono::Duration::days(PRUNE_AGE_DAYS));
        prune_entries_before(&content, &cutoff)
    };

    atomic_write(&path, kept.as_bytes())?;
    Ok(parse_entries(&content)
        .len()
        .saturating_sub(parse_entries(&kept).len()))
}

/// Keep the preamble and every entry stamped at or after `cutoff`. Chunks
/// with an unreadable header are dropped.
fn prune_entries_before(content: &str, cutoff: &DateTime<Utc>) -> String {
    let (mut kept, chunks) = split_log(content);
    for chunk in chunks {
        let stamped_after = chunk
            .lines()
            .next()
            .and_then(|l| l.strip_prefix("## "))
            .and_then(parse_entry_header)
            .is_some_and(|(ts, _, _)| ts >= *cutoff);
        if stamped_after {
            kept.push_str(&chunk);
        }
    }
    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
