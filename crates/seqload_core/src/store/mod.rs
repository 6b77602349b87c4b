//! Entity store contract.
//!
//! # Responsibility
//! - Define the narrow interface the loader uses to reach the scientific-data
//!   repository: lookup by search field, schema validation and save.
//! - Separate soft rejections (`Ok(false)`) from store unavailability (`Err`).
//!
//! # Invariants
//! - `save` assigns an external id exactly when the entity had none.
//! - `save` never clears an existing external id.

use crate::db::DbError;
use crate::model::entity::{SearchField, SeqSetEntity, Violation};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod sqlite;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store failure that makes continuing the batch pointless.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Serialization(serde_json::Error),
    /// Persisted state cannot be decoded into an entity.
    InvalidData(String),
    /// Store backend is unreachable or refused the connection.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "entity document encoding failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid stored entity: {message}"),
            Self::Unavailable(message) => write!(f, "entity store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Repository of sequencing-artifact entities.
pub trait EntityStore {
    /// Finds the first entity of `kind` whose `field` equals `value`.
    fn find_one(
        &self,
        kind: &str,
        field: SearchField,
        value: &str,
    ) -> StoreResult<Option<SeqSetEntity>>;

    /// Returns schema violations for `entity`; empty means valid.
    fn validate(&self, entity: &SeqSetEntity) -> Vec<Violation> {
        entity.validate()
    }

    fn is_valid(&self, entity: &SeqSetEntity) -> bool {
        self.validate(entity).is_empty()
    }

    /// Creates `entity` when it has no id, otherwise updates it.
    ///
    /// Returns `Ok(false)` when the store rejects the write.
    fn save(&mut self, entity: &mut SeqSetEntity) -> StoreResult<bool>;
}

impl<S: EntityStore + ?Sized> EntityStore for &mut S {
    fn find_one(
        &self,
        kind: &str,
        field: SearchField,
        value: &str,
    ) -> StoreResult<Option<SeqSetEntity>> {
        (**self).find_one(kind, field, value)
    }

    fn validate(&self, entity: &SeqSetEntity) -> Vec<Violation> {
        (**self).validate(entity)
    }

    fn save(&mut self, entity: &mut SeqSetEntity) -> StoreResult<bool> {
        (**self).save(entity)
    }
}
