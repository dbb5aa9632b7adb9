use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::config::FilesConfig;
use crate::model::poc::PocDirectory;
use crate::model::ticket::Ticket;
use crate::ops::allocator::max_dropped_number;
use crate::parse::{DroppedRow, parse_poc, parse_tickets, serialize_poc, serialize_tickets};

/// Error type for table and config storage
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a help desk: no helpdesk/ directory found")]
    NotADesk,
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse desk.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit desk.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The two persisted tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Tickets,
    Poc,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::Tickets => write!(f, "tickets"),
            TableKind::Poc => write!(f, "poc"),
        }
    }
}

/// Whole-table storage. `read` returns `None` when the table does not exist
/// yet; `write` replaces the table unconditionally.
pub trait TableStore {
    fn read(&self, kind: TableKind) -> Result<Option<String>, StoreError>;

    fn write(&self, kind: TableKind, contents: &str) -> Result<(), StoreError>;

    /// Record something that could not be kept in a table
    fn log(&self, entry: RecoveryEntry);
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Tables stored as CSV files inside the desk directory
#[derive(Debug, Clone)]
pub struct FileStore {
    desk_dir: PathBuf,
    tickets_file: String,
    poc_file: String,
}

impl FileStore {
    pub fn new(desk_dir: &Path, files: &FilesConfig) -> Self {
        FileStore {
            desk_dir: desk_dir.to_path_buf(),
            tickets_file: files.tickets.clone(),
            poc_file: files.poc.clone(),
        }
    }

    pub fn path(&self, kind: TableKind) -> PathBuf {
        match kind {
            TableKind::Tickets => self.desk_dir.join(&self.tickets_file),
            TableKind::Poc => self.desk_dir.join(&self.poc_file),
        }
    }

    pub fn desk_dir(&self) -> &Path {
        &self.desk_dir
    }
}

impl TableStore for FileStore {
    fn read(&self, kind: TableKind) -> Result<Option<String>, StoreError> {
        let path = self.path(kind);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::ReadError { path, source: e }),
        }
    }

    fn write(&self, kind: TableKind, contents: &str) -> Result<(), StoreError> {
        let path = self.path(kind);
        recovery::atomic_write(&path, contents.as_bytes())
            .map_err(|e| StoreError::WriteError { path, source: e })
    }

    fn log(&self, entry: RecoveryEntry) {
        recovery::log_recovery(&self.desk_dir, entry);
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Tables held in memory. Used by tests and as a scratch store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<HashMap<TableKind, String>>,
    logged: RefCell<Vec<RecoveryEntry>>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_table(self, kind: TableKind, contents: impl Into<String>) -> Self {
        self.tables.borrow_mut().insert(kind, contents.into());
        self
    }

    pub fn contents(&self, kind: TableKind) -> Option<String> {
        self.tables.borrow().get(&kind).cloned()
    }

    pub fn logged(&self) -> Vec<RecoveryEntry> {
        self.logged.borrow().clone()
    }

    /// Make every following write fail, as a read-only disk would
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl TableStore for MemoryStore {
    fn read(&self, kind: TableKind) -> Result<Option<String>, StoreError> {
        Ok(self.contents(kind))
    }

    fn write(&self, kind: TableKind, contents: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::WriteError {
                path: PathBuf::from(format!("memory:{}", kind)),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.tables.borrow_mut().insert(kind, contents.to_string());
        Ok(())
    }

    fn log(&self, entry: RecoveryEntry) {
        self.logged.borrow_mut().push(entry);
    }
}

// ---------------------------------------------------------------------------
// Table load / save
// ---------------------------------------------------------------------------

/// The ticket rows that loaded, plus the highest id number found on rows
/// that did not
#[derive(Debug, Default)]
pub struct LoadedTickets {
    pub rows: Vec<Ticket>,
    pub dropped_max: Option<u64>,
}

/// Load the ticket table. A missing table is created empty and persisted.
pub fn load_tickets(store: &dyn TableStore) -> Result<LoadedTickets, StoreError> {
    match store.read(TableKind::Tickets)? {
        Some(text) => {
            let table = parse_tickets(&text);
            log_dropped(store, TableKind::Tickets, &table.dropped);
            Ok(LoadedTickets {
                dropped_max: max_dropped_number(&table.dropped),
                rows: table.rows,
            })
        }
        None => {
            let loaded = LoadedTickets::default();
            save_tickets(store, &loaded.rows)?;
            Ok(loaded)
        }
    }
}

/// Load the POC directory. A missing table is created with a placeholder row
/// per department and persisted. An existing table is backfilled in memory
/// so every department has exactly one row.
pub fn load_or_init_poc(store: &dyn TableStore) -> Result<PocDirectory, StoreError> {
    match store.read(TableKind::Poc)? {
        Some(text) => {
            let table = parse_poc(&text);
            log_dropped(store, TableKind::Poc, &table.dropped);
            let mut directory = PocDirectory::from_records(table.rows);
            directory.backfill();
            Ok(directory)
        }
        None => {
            let directory = PocDirectory::placeholder();
            save_poc(store, &directory)?;
            Ok(directory)
        }
    }
}

pub fn save_tickets(store: &dyn TableStore, tickets: &[Ticket]) -> Result<(), StoreError> {
    write_table(store, TableKind::Tickets, serialize_tickets(tickets))
}

pub fn save_poc(store: &dyn TableStore, directory: &PocDirectory) -> Result<(), StoreError> {
    write_table(store, TableKind::Poc, serialize_poc(directory))
}

/// Write a serialized table; on failure the table text goes to the recovery
/// log before the error is returned.
fn write_table(store: &dyn TableStore, kind: TableKind, content: String) -> Result<(), StoreError> {
    if let Err(e) = store.write(kind, &content) {
        store.log(
            RecoveryEntry::new(RecoveryCategory::Write, format!("{} write failed", kind))
                .field("Table", kind.to_string())
                .field("Error", e.to_string())
                .body(content),
        );
        return Err(e);
    }
    Ok(())
}

fn log_dropped(store: &dyn TableStore, kind: TableKind, dropped: &[DroppedRow]) {
    for row in dropped {
        store.log(
            RecoveryEntry::new(RecoveryCategory::Parser, "dropped row")
                .field("Table", kind.to_string())
                .field("Line", row.line.to_string())
                .field("Reason", row.reason.clone())
                .body(row.raw.clone()),
        );
    }
}
