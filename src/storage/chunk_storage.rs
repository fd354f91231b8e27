use std::{
    collections::HashMap,
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use chrono::{Duration, NaiveDate};
use tokio::{
    fs::{self, File},
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
};
use tracing::{debug, instrument, warn};

use crate::utils::time::date_to_record_path;

use super::{
    entities::Chunk,
    error::{ChunkError, ChunkLogError},
};

/// Totals of one day file, used to seed the live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayTotals {
    pub worked: Duration,
    pub active: Duration,
    /// Keyed by the raw task name, so untracked tasks live under `""`.
    pub by_task: HashMap<String, Duration>,
}

impl Default for DayTotals {
    fn default() -> Self {
        Self {
            worked: Duration::zero(),
            active: Duration::zero(),
            by_task: HashMap::new(),
        }
    }
}

impl DayTotals {
    fn add(&mut self, chunk: &Chunk) {
        let duration = chunk.duration();
        self.worked += duration;
        self.active += chunk.active_time;
        *self
            .by_task
            .entry(chunk.task_name.clone())
            .or_insert_with(Duration::zero) += duration;
    }
}

/// Interface for abstracting storage of chunks.
pub trait ChunkStorage {
    /// Appends a single chunk to the file of the day it started on. The line is flushed before
    /// the future resolves.
    fn append(&self, chunk: &Chunk) -> impl Future<Output = Result<(), ChunkLogError>> + Send;

    /// Strict read used at startup. A missing file gives zero totals, but any bad line aborts
    /// the read.
    fn load_day_totals(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<DayTotals, ChunkLogError>> + Send;

    /// Lenient read used by reports. Bad lines are logged and skipped, only I/O failures of a
    /// present file are errors.
    fn read_day(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Chunk>, ChunkLogError>> + Send;
}

impl<T: Deref + Sync> ChunkStorage for T
where
    T::Target: ChunkStorage + Sync,
{
    fn append(&self, chunk: &Chunk) -> impl Future<Output = Result<(), ChunkLogError>> + Send {
        self.deref().append(chunk)
    }

    fn load_day_totals(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<DayTotals, ChunkLogError>> + Send {
        self.deref().load_day_totals(date)
    }

    fn read_day(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Chunk>, ChunkLogError>> + Send {
        self.deref().read_day(date)
    }
}

/// The main realization of [ChunkStorage].
pub struct ChunkStorageImpl {
    record_dir: PathBuf,
}

impl ChunkStorageImpl {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    pub fn day_file(&self, date: NaiveDate) -> PathBuf {
        self.record_dir.join(date_to_record_path(date))
    }

    /// Opens a day file for sequential reading. `None` means there is no file for that day.
    async fn open_day(path: &Path) -> Result<Option<BufReader<File>>, ChunkLogError> {
        match File::open(path).await {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No day file at {path:?}, treating it as empty");
                Ok(None)
            }
            Err(e) => Err(ChunkLogError::io(path)(e)),
        }
    }
}

impl ChunkStorage for ChunkStorageImpl {
    #[instrument(skip(self, chunk), fields(task = %chunk.task_name))]
    async fn append(&self, chunk: &Chunk) -> Result<(), ChunkLogError> {
        let path = self.day_file(chunk.started_at.date_naive());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(ChunkLogError::io(parent))?;
        }

        let mut line = serde_json::to_vec(chunk).map_err(|source| ChunkLogError::Malformed {
            path: path.clone(),
            line: 0,
            source,
        })?;
        line.push(b'\n');

        let mut file = File::options()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(ChunkLogError::io(&path))?;
        file.write_all(&line).await.map_err(ChunkLogError::io(&path))?;
        file.flush().await.map_err(ChunkLogError::io(&path))?;

        debug!("Appended chunk to {path:?}");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_day_totals(&self, date: NaiveDate) -> Result<DayTotals, ChunkLogError> {
        let path = self.day_file(date);
        let mut totals = DayTotals::default();
        let Some(mut reader) = Self::open_day(&path).await? else {
            return Ok(totals);
        };

        let mut buf = Vec::new();
        let mut line_number = 0;
        while next_raw_line(&mut reader, &mut buf, &path).await? {
            line_number += 1;
            if let Some(chunk) = parse_line(&path, line_number, &buf, Chunk::validate) {
                totals.add(&chunk?);
            }
        }

        debug!("Loaded totals from {path:?}: {totals:?}");
        Ok(totals)
    }

    #[instrument(skip(self))]
    async fn read_day(&self, date: NaiveDate) -> Result<Vec<Chunk>, ChunkLogError> {
        let path = self.day_file(date);
        let Some(mut reader) = Self::open_day(&path).await? else {
            return Ok(vec![]);
        };

        let mut buf = Vec::new();
        let mut line_number = 0;
        let mut chunks = vec![];
        while next_raw_line(&mut reader, &mut buf, &path).await? {
            line_number += 1;
            match parse_line(&path, line_number, &buf, Chunk::validate_window) {
                Some(Ok(chunk)) => chunks.push(chunk),
                Some(Err(e)) => warn!("Skipping line: {e}"),
                None => {}
            }
        }

        Ok(chunks)
    }
}

/// Reads the next line, terminator included, into `buf`. `false` at the end of the file.
///
/// Lines stay bytes here so a line that isn't UTF-8 is a problem of that line alone.
async fn next_raw_line(
    reader: &mut BufReader<File>,
    buf: &mut Vec<u8>,
    path: &Path,
) -> Result<bool, ChunkLogError> {
    buf.clear();
    let read = reader
        .read_until(b'\n', buf)
        .await
        .map_err(ChunkLogError::io(path))?;
    Ok(read > 0)
}

/// Parses one line and checks it with `check`. Blank lines and `#` comments give `None`.
fn parse_line(
    path: &Path,
    line: usize,
    raw: &[u8],
    check: fn(&Chunk) -> Result<(), ChunkError>,
) -> Option<Result<Chunk, ChunkLogError>> {
    let text = match std::str::from_utf8(raw) {
        Ok(text) => text.trim(),
        Err(source) => {
            return Some(Err(ChunkLogError::InvalidEncoding {
                path: path.to_owned(),
                line,
                source,
            }))
        }
    };
    if text.is_empty() || text.starts_with('#') {
        return None;
    }

    let chunk = match serde_json::from_str::<Chunk>(text) {
        Ok(chunk) => chunk,
        Err(source) => {
            return Some(Err(ChunkLogError::Malformed {
                path: path.to_owned(),
                line,
                source,
            }))
        }
    };

    Some(
        check(&chunk)
            .map(|_| chunk)
            .map_err(|source| ChunkLogError::InvalidChunk {
                path: path.to_owned(),
                line,
                source,
            }),
    )
}
