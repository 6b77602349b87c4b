//! Persisted ID-tracking table.
//!
//! # Responsibility
//! - Resolve `(node type, internal id)` to the external id recorded when the
//!   entity was created.
//! - Append one row per newly created entity, durably, before the loader
//!   moves on to the next record.
//!
//! # Invariants
//! - The file is append-only: existing rows are never rewritten or removed.
//! - Node type comparison is case-insensitive (labels are stored lowercase).
//! - When a key appears more than once the most recently appended row wins.

use crate::model::tracking::{IdTrackingRecord, TRACKING_HEADER};
use csv::{ReaderBuilder, Writer};
use log::{debug, info};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

pub type TrackingResult<T> = Result<T, TrackingError>;

#[derive(Debug)]
pub enum TrackingError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    UnexpectedHeader {
        path: PathBuf,
        found: Vec<String>,
    },
    MalformedRow {
        path: PathBuf,
        line: u64,
    },
}

impl Display for TrackingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Csv { path, source } => write!(f, "{}: {source}", path.display()),
            Self::UnexpectedHeader { path, found } => write!(
                f,
                "{}: unexpected tracking header `{}`, expected `{}`",
                path.display(),
                found.join(","),
                TRACKING_HEADER.join(",")
            ),
            Self::MalformedRow { path, line } => {
                write!(f, "{}:{line}: malformed tracking row", path.display())
            }
        }
    }
}

impl Error for TrackingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::UnexpectedHeader { .. } | Self::MalformedRow { .. } => None,
        }
    }
}

/// Append-only `(type, internal id) -> external id` table backed by a CSV file.
pub struct IdTrackingTable {
    path: PathBuf,
    rows: Vec<IdTrackingRecord>,
    index: HashMap<(String, String), usize>,
    writer: Writer<File>,
}

impl IdTrackingTable {
    /// Opens the tracking file, creating it with a header when absent.
    pub fn open(path: impl AsRef<Path>) -> TrackingResult<Self> {
        let path = path.as_ref().to_path_buf();
        let io_err = |source| TrackingError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let is_empty = file.metadata().map_err(io_err)?.len() == 0;

        let rows = if is_empty {
            Vec::new()
        } else {
            read_rows(&path)?
        };

        let mut table = Self {
            writer: Writer::from_writer(file),
            path,
            rows: Vec::with_capacity(rows.len()),
            index: HashMap::new(),
        };
        if is_empty {
            table.write_durably(TRACKING_HEADER)?;
        }
        for row in rows {
            table.index_row(row);
        }

        info!(
            "event=tracking_open module=tracking status=ok path={} rows={}",
            table.path.display(),
            table.rows.len()
        );
        Ok(table)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in file order.
    pub fn rows(&self) -> &[IdTrackingRecord] {
        &self.rows
    }

    /// Returns the external id recorded for `(node_type, internal_id)`.
    pub fn lookup(&self, node_type: &str, internal_id: &str) -> Option<&str> {
        self.index
            .get(&(node_type.to_lowercase(), internal_id.to_string()))
            .map(|&position| self.rows[position].external_id.as_str())
    }

    /// Appends `record` and syncs it to disk before returning.
    pub fn append(&mut self, record: IdTrackingRecord) -> TrackingResult<()> {
        self.write_durably(record.to_row())?;
        debug!(
            "event=tracking_append module=tracking status=ok node_type={} internal_id={} external_id={}",
            record.node_type, record.internal_id, record.external_id
        );
        self.index_row(record);
        Ok(())
    }

    fn index_row(&mut self, record: IdTrackingRecord) {
        let key = (record.node_type.to_lowercase(), record.internal_id.clone());
        self.index.insert(key, self.rows.len());
        self.rows.push(record);
    }

    fn write_durably<I, T>(&mut self, row: I) -> TrackingResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(row)
            .map_err(|source| TrackingError::Csv {
                path: self.path.clone(),
                source,
            })?;
        let io_err = |source| TrackingError::Io {
            path: self.path.clone(),
            source,
        };
        self.writer.flush().map_err(io_err)?;
        self.writer.get_ref().sync_data().map_err(io_err)
    }
}

fn read_rows(path: &Path) -> TrackingResult<Vec<IdTrackingRecord>> {
    let csv_err = |source| TrackingError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let header = reader.headers().map_err(csv_err)?;
    if !header.iter().eq(TRACKING_HEADER.iter().copied()) {
        return Err(TrackingError::UnexpectedHeader {
            path: path.to_path_buf(),
            found: header.iter().map(str::to_string).collect(),
        });
    }

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row.map_err(csv_err)?;
        let record = IdTrackingRecord::from_row(row.iter()).ok_or_else(|| {
            TrackingError::MalformedRow {
                path: path.to_path_buf(),
                line: row.position().map_or(0, |position| position.line()),
            }
        })?;
        rows.push(record);
    }
    Ok(rows)
}
