use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_ERROR_LOG_ENTRIES: usize = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Error,
    Warning,
    Info,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    /// Cause chain of the logged error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    /// Where the error was caught, such as an error boundary name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl LogEntry {
    pub fn new(message: impl Into<String>, kind: LogKind) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            kind,
            stack: None,
            context: None,
        }
    }

    pub fn stack(mut self, value: impl Into<String>) -> Self {
        self.stack = Some(value.into());
        self
    }

    pub fn context(mut self, value: impl Into<String>) -> Self {
        self.context = Some(value.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum ErrorLogError {
    #[error("error log storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("error log storage holds malformed data: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("error log storage lock poisoned")]
    StoragePoisoned,
}

/// Where an [`ErrorLog`] persists its entries.
pub trait ErrorLogStore: Send + Sync {
    fn save(&self, entries: &[LogEntry]) -> Result<(), ErrorLogError>;
    fn load(&self) -> Result<Vec<LogEntry>, ErrorLogError>;
    fn clear(&self) -> Result<(), ErrorLogError>;
}

/// Keeps the serialized log in memory, like a key/value storage slot.
#[derive(Debug, Default)]
pub struct InMemoryErrorLogStore {
    slot: Mutex<Option<String>>,
}

impl InMemoryErrorLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl ErrorLogStore for InMemoryErrorLogStore {
    fn save(&self, entries: &[LogEntry]) -> Result<(), ErrorLogError> {
        let json = serde_json::to_string(entries)?;
        *self.slot.lock().map_err(|_| ErrorLogError::StoragePoisoned)? = Some(json);
        Ok(())
    }

    fn load(&self) -> Result<Vec<LogEntry>, ErrorLogError> {
        let slot = self.slot.lock().map_err(|_| ErrorLogError::StoragePoisoned)?;
        match slot.as_deref() {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn clear(&self) -> Result<(), ErrorLogError> {
        *self.slot.lock().map_err(|_| ErrorLogError::StoragePoisoned)? = None;
        Ok(())
    }
}

/// Stores the log as a JSON array in one file.
#[derive(Clone, Debug)]
pub struct JsonFileErrorLogStore {
    path: PathBuf,
}

impl JsonFileErrorLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorLogStore for JsonFileErrorLogStore {
    fn save(&self, entries: &[LogEntry]) -> Result<(), ErrorLogError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn load(&self) -> Result<Vec<LogEntry>, ErrorLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn clear(&self) -> Result<(), ErrorLogError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// Bounded, persisted log of runtime errors and notices.
///
/// Persistence is best effort: storage failures are reported through `tracing`
/// and never surface to the caller.
#[derive(Clone)]
pub struct ErrorLog {
    entries: Arc<RwLock<VecDeque<LogEntry>>>,
    store: Arc<dyn ErrorLogStore>,
    /// Held across snapshot and save so the store sees snapshots in order.
    persist_lock: Arc<Mutex<()>>,
    max_entries: usize,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ErrorLog {
    pub fn new(store: impl ErrorLogStore + 'static) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            store: Arc::new(store),
            persist_lock: Arc::new(Mutex::new(())),
            max_entries: MAX_ERROR_LOG_ENTRIES,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(InMemoryErrorLogStore::new())
    }

    pub fn max_entries(mut self, value: usize) -> Self {
        self.max_entries = value.max(1);
        self
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    /// Records an error with its cause chain.
    pub fn log_error(
        &self,
        error: &(dyn std::error::Error + 'static),
        context: Option<&str>,
    ) -> LogEntry {
        let mut entry = LogEntry::new(error.to_string(), LogKind::Error);
        let causes: Vec<String> = std::iter::successors(error.source(), |cause| cause.source())
            .map(|cause| format!("caused by: {cause}"))
            .collect();
        if !causes.is_empty() {
            entry.stack = Some(causes.join("\n"));
        }
        entry.context = context.map(str::to_string);
        self.push(entry)
    }

    pub fn log_message(&self, message: impl Into<String>, kind: LogKind) -> LogEntry {
        self.push(LogEntry::new(message, kind))
    }

    pub fn push(&self, entry: LogEntry) -> LogEntry {
        let _persisting = self.lock_persist();
        let snapshot: Vec<LogEntry> = {
            let mut entries = self.write();
            entries.push_back(entry.clone());
            while entries.len() > self.max_entries {
                entries.pop_front();
            }
            entries.iter().cloned().collect()
        };
        self.persist(&snapshot);
        entry
    }

    /// Oldest first.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Replaces the in-memory entries with the stored ones. Returns how many were restored.
    pub fn load(&self) -> usize {
        let _persisting = self.lock_persist();
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!(%error, "failed to load error log");
                return 0;
            }
        };
        let skip = stored.len().saturating_sub(self.max_entries);
        let mut entries = self.write();
        *entries = stored.into_iter().skip(skip).collect();
        entries.len()
    }

    pub fn clear(&self) {
        let _persisting = self.lock_persist();
        self.write().clear();
        if let Err(error) = self.store.clear() {
            tracing::warn!(%error, "failed to clear stored error log");
        }
    }

    fn persist(&self, entries: &[LogEntry]) {
        if let Err(error) = self.store.save(entries) {
            tracing::warn!(%error, "failed to save error log");
        }
    }

    fn lock_persist(&self) -> MutexGuard<'_, ()> {
        match self.persist_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, VecDeque<LogEntry>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, VecDeque<LogEntry>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Debug for ErrorLog {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorLog")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("request failed")]
    struct RequestError {
        #[source]
        cause: std::io::Error,
    }

    struct FailingStore;

    impl ErrorLogStore for FailingStore {
        fn save(&self, _entries: &[LogEntry]) -> Result<(), ErrorLogError> {
            Err(ErrorLogError::StoragePoisoned)
        }

        fn load(&self) -> Result<Vec<LogEntry>, ErrorLogError> {
            Err(ErrorLogError::StoragePoisoned)
        }

        fn clear(&self) -> Result<(), ErrorLogError> {
            Err(ErrorLogError::StoragePoisoned)
        }
    }

    #[test]
    fn error_log_keeps_the_newest_entries() {
        let log = ErrorLog::in_memory();
        for index in 0..(MAX_ERROR_LOG_ENTRIES + 5) {
            log.log_message(format!("event {index}"), LogKind::Info);
        }

        let entries = log.entries();
        assert_eq!(entries.len(), MAX_ERROR_LOG_ENTRIES);
        assert_eq!(entries[0].message, "event 5");
        assert_eq!(
            entries.last().map(|entry| entry.message.as_str()),
            Some("event 104")
        );
    }

    #[test]
    fn logged_errors_carry_cause_chain_and_context() {
        let log = ErrorLog::in_memory();
        let error = RequestError {
            cause: std::io::Error::other("connection reset"),
        };

        let entry = log.log_error(&error, Some("ProfilePage"));
        assert_eq!(entry.kind, LogKind::Error);
        assert_eq!(entry.message, "request failed");
        assert_eq!(entry.stack.as_deref(), Some("caused by: connection reset"));
        assert_eq!(entry.context.as_deref(), Some("ProfilePage"));
    }

    #[test]
    fn entries_serialize_with_type_tag() {
        let entry = LogEntry::new("slow response", LogKind::Warning).context("Dashboard");
        let json = serde_json::to_value(&entry).expect("serialize entry");
        assert_eq!(json["type"], "warning");
        assert_eq!(json["context"], "Dashboard");
        assert!(json.get("stack").is_none());
    }

    #[test]
    fn file_store_restores_entries_across_logs() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("logs").join("errors.json");

        let first = ErrorLog::new(JsonFileErrorLogStore::new(&path));
        first.log_message("first", LogKind::Error);
        first.log_message("second", LogKind::Info);
        assert!(path.exists());

        let second = ErrorLog::new(JsonFileErrorLogStore::new(&path));
        assert!(second.is_empty());
        assert_eq!(second.load(), 2);
        let messages: Vec<_> = second
            .entries()
            .into_iter()
            .map(|entry| entry.message)
            .collect();
        assert_eq!(messages, vec!["first", "second"]);

        second.clear();
        assert!(second.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn concurrent_pushes_leave_the_store_complete() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("errors.json");
        let log = ErrorLog::new(JsonFileErrorLogStore::new(&path));

        let writers: Vec<_> = (0..8)
            .map(|writer| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for index in 0..10 {
                        log.log_message(format!("writer {writer} event {index}"), LogKind::Info);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread");
        }

        let stored = JsonFileErrorLogStore::new(&path).load().expect("load stored log");
        assert_eq!(stored.len(), 80);
        assert_eq!(stored, log.entries());
    }

    #[test]
    fn load_trims_to_capacity() {
        let store = InMemoryErrorLogStore::new();
        let entries: Vec<_> = (0..5)
            .map(|index| LogEntry::new(format!("entry {index}"), LogKind::Info))
            .collect();
        store.save(&entries).expect("save entries");

        let log = ErrorLog::new(store).max_entries(3);
        assert_eq!(log.load(), 3);
        assert_eq!(log.entries()[0].message, "entry 2");
    }

    #[test]
    fn storage_failures_do_not_reach_the_caller() {
        let log = ErrorLog::new(FailingStore);
        log.log_message("kept in memory", LogKind::Warning);
        assert_eq!(log.len(), 1);
        assert_eq!(log.load(), 0);
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn malformed_storage_is_reported_as_serde_error() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("errors.json");
        fs::write(&path, b"not json").expect("write garbage");

        let store = JsonFileErrorLogStore::new(&path);
        assert!(matches!(store.load(), Err(ErrorLogError::Serde(_))));
    }
}
