use std::path::PathBuf;

use chrono::{DateTime, Duration, FixedOffset};

/// A chunk that breaks one of its invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    #[error("{field} is not set")]
    ZeroTimestamp { field: &'static str },

    #[error("interval is empty or reversed: finished at {finished_at}, started at {started_at}")]
    InvalidInterval {
        started_at: DateTime<FixedOffset>,
        finished_at: DateTime<FixedOffset>,
    },

    #[error("active time {active_time} is outside of [0, {duration}]")]
    InvalidActiveTime {
        active_time: Duration,
        duration: Duration,
    },
}

/// Errors of the chunk log. A missing day file is not one of them, it reads as an empty day.
#[derive(Debug, thiserror::Error)]
pub enum ChunkLogError {
    #[error("{}:{line}: malformed record: {source}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}:{line}: line is not valid UTF-8: {source}", path.display())]
    InvalidEncoding {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("{}:{line}: invalid chunk: {source}", path.display())]
    InvalidChunk {
        path: PathBuf,
        line: usize,
        #[source]
        source: ChunkError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ChunkLogError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
