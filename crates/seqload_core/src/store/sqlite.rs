//! SQLite-backed entity store.
//!
//! # Responsibility
//! - Persist entities as JSON documents with indexed search columns.
//! - Assign opaque 32-hex external ids on create.
//!
//! # Invariants
//! - Writes call `SeqSetEntity::validate()` first; invalid entities are
//!   rejected with `Ok(false)` and never written.
//! - `(kind, comment)` is unique; a duplicate create is a soft rejection.
//! - Reads reject documents whose embedded id disagrees with the row id.

use crate::model::entity::{SearchField, SeqSetEntity};
use crate::store::{EntityStore, StoreError, StoreResult};
use log::{debug, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use uuid::Uuid;

pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Loads one entity by external id.
    pub fn get(&self, id: &str) -> StoreResult<Option<SeqSetEntity>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, document FROM entities WHERE id = ?1;",
                [id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(id, document)| decode_document(&id, &document))
            .transpose()
    }

    /// Counts stored entities of `kind`.
    pub fn count(&self, kind: &str) -> StoreResult<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM entities WHERE kind = ?1;",
            [kind],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    fn insert(&self, entity: &mut SeqSetEntity) -> StoreResult<bool> {
        let id = Uuid::new_v4().simple().to_string();
        let mut stored = entity.clone();
        stored.id = Some(id.clone());
        let document = serde_json::to_string(&stored)?;

        let inserted = self.conn.execute(
            "INSERT INTO entities (id, kind, comment, local_file, document)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.as_str(),
                stored.kind.as_str(),
                stored.comment.as_str(),
                stored.local_file.as_deref(),
                document,
            ],
        );

        match inserted {
            Ok(_) => {
                debug!(
                    "event=entity_insert module=store status=ok kind={} id={}",
                    stored.kind, id
                );
                *entity = stored;
                Ok(true)
            }
            Err(err) if is_constraint_violation(&err) => {
                warn!(
                    "event=entity_insert module=store status=rejected kind={} comment={} error={}",
                    stored.kind, stored.comment, err
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, entity: &SeqSetEntity, id: &str) -> StoreResult<bool> {
        let document = serde_json::to_string(entity)?;
        let updated = self.conn.execute(
            "UPDATE entities
             SET
                kind = ?2,
                comment = ?3,
                local_file = ?4,
                document = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                id,
                entity.kind.as_str(),
                entity.comment.as_str(),
                entity.local_file.as_deref(),
                document,
            ],
        );

        match updated {
            Ok(0) => {
                warn!("event=entity_update module=store status=not_found id={id}");
                Ok(false)
            }
            Ok(_) => {
                debug!("event=entity_update module=store status=ok id={id}");
                Ok(true)
            }
            Err(err) if is_constraint_violation(&err) => {
                warn!("event=entity_update module=store status=rejected id={id} error={err}");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn find_one(
        &self,
        kind: &str,
        field: SearchField,
        value: &str,
    ) -> StoreResult<Option<SeqSetEntity>> {
        let column = match field {
            SearchField::Comment => "comment",
            SearchField::LocalFile => "local_file",
        };
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, document FROM entities
                     WHERE kind = ?1 AND {column} = ?2
                     ORDER BY created_at ASC, id ASC
                     LIMIT 1;"
                ),
                params![kind, value],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        row.map(|(id, document)| decode_document(&id, &document))
            .transpose()
    }

    fn save(&mut self, entity: &mut SeqSetEntity) -> StoreResult<bool> {
        let violations = entity.validate();
        if !violations.is_empty() {
            warn!(
                "event=entity_save module=store status=rejected kind={} violations={}",
                entity.kind,
                violations.len()
            );
            return Ok(false);
        }

        match entity.id.clone() {
            Some(id) => self.update(entity, &id),
            None => self.insert(entity),
        }
    }
}

fn decode_document(id: &str, document: &str) -> StoreResult<SeqSetEntity> {
    let mut entity: SeqSetEntity = serde_json::from_str(document)
        .map_err(|err| StoreError::InvalidData(format!("entity `{id}`: {err}")))?;
    if let Some(embedded) = entity.id.as_deref() {
        if embedded != id {
            return Err(StoreError::InvalidData(format!(
                "entity `{id}` embeds mismatched id `{embedded}`"
            )));
        }
    }
    entity.id = Some(id.to_string());
    Ok(entity)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}
