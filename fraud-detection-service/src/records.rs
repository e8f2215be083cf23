//! Flat-file record store.
//!
//! All submissions live in one CSV file whose header is [`HEADER`]. Rows are
//! only ever appended. Appends hold the write side of an async lock and add a
//! single line to the end of the file, so concurrent submissions are
//! serialised and none of them can overwrite another. Full reads hold the
//! read side of the same lock and never observe a half-written row.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::ClaimRecord;

pub const HEADER: [&str; 5] = [
    "age",
    "months_as_customer",
    "policy_annual_premium",
    "total_claim_amount",
    "ML_Prediction",
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record store CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("record store {} has header {found:?}, expected {expected:?}", .path.display(), expected = HEADER)]
    SchemaMismatch { path: PathBuf, found: Vec<String> },

    #[error("record store task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Clone, Debug)]
pub struct RecordStore {
    path: Arc<PathBuf>,
    lock: Arc<RwLock<()>>,
}

impl RecordStore {
    /// Open the store at `path`, creating it with only the header row when
    /// the file is absent or empty. An existing file with any other header
    /// is rejected.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let prepared = path.clone();
        tokio::task::spawn_blocking(move || prepare_file(&prepared)).await??;

        info!(path = %path.display(), "record store ready");
        Ok(Self {
            path: Arc::new(path),
            lock: Arc::new(RwLock::new(())),
        })
    }

    /// Append one record at the end of the store. The write guard lives in
    /// the blocking task, so it is held until the row is on disk even if the
    /// caller stops waiting.
    pub async fn append(&self, record: ClaimRecord) -> StoreResult<()> {
        let guard = Arc::clone(&self.lock).write_owned().await;
        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            append_row(&path, &record)
        })
        .await??;
        debug!(path = %self.path.display(), "record appended");
        Ok(())
    }

    /// Every record in insertion order.
    pub async fn read_all(&self) -> StoreResult<Vec<ClaimRecord>> {
        let _guard = self.lock.read().await;
        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || read_rows(&path)).await?
    }

    pub async fn len(&self) -> StoreResult<usize> {
        Ok(self.read_all().await?.len())
    }

    pub async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }
}

fn prepare_file(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let is_empty = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => return Err(e.into()),
    };

    if is_empty {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        info!(path = %path.display(), "created empty record store");
        return Ok(());
    }

    let mut reader = csv::Reader::from_path(path)?;
    let found: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if found != HEADER {
        return Err(StoreError::SchemaMismatch {
            path: path.to_path_buf(),
            found,
        });
    }

    terminate_last_line(path)
}

/// Files written by other tools may lack a trailing newline; appending to
/// such a file would glue the new row onto the last one.
fn terminate_last_line(path: &Path) -> StoreResult<()> {
    let mut file = OpenOptions::new().read(true).append(true).open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        file.write_all(b"\n")?;
        file.sync_data()?;
    }
    Ok(())
}

fn append_row(path: &Path, record: &ClaimRecord) -> StoreResult<()> {
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.serialize(record)?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_data()?;
    Ok(())
}

fn read_rows(path: &Path) -> StoreResult<Vec<ClaimRecord>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
