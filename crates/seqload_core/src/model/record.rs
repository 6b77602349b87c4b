//! Input row model.
//!
//! # Responsibility
//! - Hold one tabular row as ordered `(field, value)` pairs.
//! - Provide typed accessors that fail with semantic errors.
//!
//! # Invariants
//! - Values stay in header order so output sinks can replay the row verbatim.
//! - A missing field is an error, never an empty default.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Row-level access error.
///
/// These are hard failures: a batch aborts when one is raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Row width does not match the header.
    ShapeMismatch { expected: usize, actual: usize },
    /// Header does not contain the requested field.
    MissingField(String),
    /// Field is present but cannot be interpreted.
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShapeMismatch { expected, actual } => write!(
                f,
                "record has {actual} values but header declares {expected} fields"
            ),
            Self::MissingField(field) => write!(f, "record is missing field `{field}`"),
            Self::InvalidValue {
                field,
                value,
                message,
            } => write!(f, "invalid value `{value}` for field `{field}`: {message}"),
        }
    }
}

impl Error for RecordError {}

/// One row of input metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    header: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Pairs a shared header with one row of values.
    pub fn new(header: Arc<[String]>, values: Vec<String>) -> Result<Self, RecordError> {
        if header.len() != values.len() {
            return Err(RecordError::ShapeMismatch {
                expected: header.len(),
                actual: values.len(),
            });
        }
        Ok(Self { header, values })
    }

    /// Builds a record from literal pairs, keeping pair order as header order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (header, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .unzip();
        Self {
            header: header.into(),
            values,
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the value of `field`, or `None` when the header lacks it.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.header
            .iter()
            .position(|name| name == field)
            .map(|index| self.values[index].as_str())
    }

    /// Returns the value of `field` or `RecordError::MissingField`.
    pub fn require(&self, field: &str) -> Result<&str, RecordError> {
        self.get(field)
            .ok_or_else(|| RecordError::MissingField(field.to_string()))
    }

    /// Parses `field` as a non-negative integer, ignoring surrounding spaces.
    pub fn require_u64(&self, field: &str) -> Result<u64, RecordError> {
        let raw = self.require(field)?;
        raw.trim()
            .parse::<u64>()
            .map_err(|err| RecordError::InvalidValue {
                field: field.to_string(),
                value: raw.to_string(),
                message: err.to_string(),
            })
    }

    /// Iterates `(field, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}
