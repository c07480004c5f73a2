mod error_log;

pub use error_log::{
    ErrorLog, ErrorLogError, ErrorLogStore, InMemoryErrorLogStore, JsonFileErrorLogStore,
    LogEntry, LogKind, MAX_ERROR_LOG_ENTRIES,
};
