//! Tabular input and categorized CSV output.
//!
//! # Responsibility
//! - Read header-defined CSV data sources as lazy `Record` streams.
//! - Append raw records to per-category output files keyed by the source's
//!   original header.
//!
//! # Invariants
//! - A source can be re-read from the start by calling `records()` again.
//! - Each output file carries exactly one header row, written when the file
//!   is created (or found empty); rows are only ever appended.
//! - Output rows keep the input field order.

use crate::model::record::{Record, RecordError};
use csv::{Reader, ReaderBuilder, StringRecordsIntoIter, Writer};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type TabularResult<T> = Result<T, TabularError>;

#[derive(Debug)]
pub enum TabularError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    /// Source has no header row, or an empty column name.
    EmptyHeader(PathBuf),
    Record {
        path: PathBuf,
        line: u64,
        source: RecordError,
    },
}

impl Display for TabularError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Csv { path, source } => write!(f, "{}: {source}", path.display()),
            Self::EmptyHeader(path) => {
                write!(f, "{}: missing or blank header field", path.display())
            }
            Self::Record { path, line, source } => {
                write!(f, "{}:{line}: {source}", path.display())
            }
        }
    }
}

impl Error for TabularError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Record { source, .. } => Some(source),
            Self::EmptyHeader(_) => None,
        }
    }
}

/// Header-defined CSV file of input records.
#[derive(Debug, Clone)]
pub struct TabularSource {
    path: PathBuf,
    header: Arc<[String]>,
}

impl TabularSource {
    /// Opens `path` and reads its header row.
    pub fn open(path: impl AsRef<Path>) -> TabularResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = open_reader(&path)?;
        let header = read_header(&mut reader, &path)?;
        Ok(Self { path, header })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// File stem used to name categorized outputs.
    pub fn logical_name(&self) -> String {
        logical_name(&self.path)
    }

    /// Starts a fresh pass over the data rows.
    pub fn records(&self) -> TabularResult<RecordIter> {
        let mut reader = open_reader(&self.path)?;
        // Header already validated in `open`; consume it before the rows.
        read_header(&mut reader, &self.path)?;
        Ok(RecordIter {
            path: self.path.clone(),
            header: Arc::clone(&self.header),
            rows: reader.into_records(),
        })
    }
}

/// Lazy iterator over the rows of a `TabularSource`.
pub struct RecordIter {
    path: PathBuf,
    header: Arc<[String]>,
    rows: StringRecordsIntoIter<File>,
}

impl Iterator for RecordIter {
    type Item = TabularResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(source) => {
                return Some(Err(TabularError::Csv {
                    path: self.path.clone(),
                    source,
                }))
            }
        };
        let line = row.position().map_or(0, |position| position.line());
        let values = row.iter().map(str::to_string).collect();
        Some(
            Record::new(Arc::clone(&self.header), values).map_err(|source| {
                TabularError::Record {
                    path: self.path.clone(),
                    line,
                    source,
                }
            }),
        )
    }
}

/// Returns the header fields of the data source at `path`.
pub fn header_fields(path: impl AsRef<Path>) -> TabularResult<Vec<String>> {
    Ok(TabularSource::open(path)?.header().to_vec())
}

/// Output category for a processed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkCategory {
    Invalid,
    Unsaved,
    Submitted,
}

impl SinkCategory {
    pub const ALL: [SinkCategory; 3] = [Self::Invalid, Self::Unsaved, Self::Submitted];

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Invalid => "_invalid_records.csv",
            Self::Unsaved => "_unsaved_records.csv",
            Self::Submitted => "_submitted.csv",
        }
    }
}

/// Path of the `category` output for `data_file`.
///
/// Files land in `output_dir` when given, else beside the data file.
pub fn sink_path(data_file: &Path, output_dir: Option<&Path>, category: SinkCategory) -> PathBuf {
    let name = format!("{}{}", logical_name(data_file), category.suffix());
    match output_dir {
        Some(dir) => dir.join(name),
        None => data_file.with_file_name(name),
    }
}

struct CsvSink {
    path: PathBuf,
    writer: Writer<File>,
    rows: usize,
}

impl CsvSink {
    fn open(path: PathBuf, header: &[String]) -> TabularResult<Self> {
        let io_err = |source| TabularError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(io_err)?;
        let is_empty = file.metadata().map_err(io_err)?.len() == 0;

        let mut sink = Self {
            writer: Writer::from_writer(file),
            path,
            rows: 0,
        };
        if is_empty {
            sink.write_row(header)?;
            debug!(
                "event=sink_open module=tabular status=header_written path={}",
                sink.path.display()
            );
        }
        Ok(sink)
    }

    fn write_row<I, T>(&mut self, row: I) -> TabularResult<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(row)
            .map_err(|source| TabularError::Csv {
                path: self.path.clone(),
                source,
            })?;
        self.writer.flush().map_err(|source| TabularError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// The invalid / unsaved / submitted outputs of one batch run.
pub struct CategorizedSinks {
    invalid: CsvSink,
    unsaved: CsvSink,
    submitted: CsvSink,
}

impl CategorizedSinks {
    /// Opens (creating when needed) all three outputs for `data_file`.
    pub fn open(
        data_file: &Path,
        output_dir: Option<&Path>,
        header: &[String],
    ) -> TabularResult<Self> {
        let open = |category| CsvSink::open(sink_path(data_file, output_dir, category), header);
        Ok(Self {
            invalid: open(SinkCategory::Invalid)?,
            unsaved: open(SinkCategory::Unsaved)?,
            submitted: open(SinkCategory::Submitted)?,
        })
    }

    /// Appends `record` to the `category` output.
    pub fn write(&mut self, category: SinkCategory, record: &Record) -> TabularResult<()> {
        let sink = self.sink_mut(category);
        sink.write_row(record.values())?;
        sink.rows += 1;
        Ok(())
    }

    pub fn path(&self, category: SinkCategory) -> &Path {
        &self.sink(category).path
    }

    /// Rows appended to `category` by this instance.
    pub fn rows_written(&self, category: SinkCategory) -> usize {
        self.sink(category).rows
    }

    fn sink(&self, category: SinkCategory) -> &CsvSink {
        match category {
            SinkCategory::Invalid => &self.invalid,
            SinkCategory::Unsaved => &self.unsaved,
            SinkCategory::Submitted => &self.submitted,
        }
    }

    fn sink_mut(&mut self, category: SinkCategory) -> &mut CsvSink {
        match category {
            SinkCategory::Invalid => &mut self.invalid,
            SinkCategory::Unsaved => &mut self.unsaved,
            SinkCategory::Submitted => &mut self.submitted,
        }
    }
}

fn open_reader(path: &Path) -> TabularResult<Reader<File>> {
    ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| TabularError::Csv {
            path: path.to_path_buf(),
            source,
        })
}

fn read_header(reader: &mut Reader<File>, path: &Path) -> TabularResult<Arc<[String]>> {
    let header = reader.headers().map_err(|source| TabularError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    if header.is_empty() || header.iter().any(|field| field.trim().is_empty()) {
        return Err(TabularError::EmptyHeader(path.to_path_buf()));
    }
    Ok(header.iter().map(str::to_string).collect::<Vec<_>>().into())
}

fn logical_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
