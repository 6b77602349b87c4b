//! Record-to-entity field mapping.
//!
//! # Invariants
//! - `exp_length` is always zeroed; it is not sourced from input.
//! - Without consent the entity is private: no local file, size zero and the
//!   all-zero md5 sentinel.
//! - Exactly one parent link is set.

use crate::config::node_type::{FileRule, NodeTypeConfig};
use crate::model::entity::{Checksums, SeqSetEntity};
use crate::model::record::{Record, RecordError};

/// Overwrites `entity`'s mapped attributes from `record`.
///
/// Fails only when the record lacks a configured field or a numeric field
/// cannot be parsed.
pub fn apply_record(
    config: &NodeTypeConfig,
    record: &Record,
    entity: &mut SeqSetEntity,
    parent_external_id: &str,
) -> Result<(), RecordError> {
    let defaults = &config.defaults;

    entity.comment = config.comment.resolve(record)?;
    entity.study = defaults.study.clone();
    entity.sequence_type = defaults.sequence_type.clone();
    entity.seq_model = record.require(&config.seq_model_field)?.to_string();
    entity.format = defaults.format.clone();
    entity.format_doc = defaults.format_doc.clone();
    entity.exp_length = 0;

    apply_file_metadata(&config.file, record, entity)?;

    entity.tags = config
        .tags
        .iter()
        .map(|tag| tag.render(record))
        .collect::<Result<Vec<_>, _>>()?;
    entity.set_parent_link(&config.link_relation, parent_external_id);

    Ok(())
}

/// Returns whether `record` grants consent to expose file metadata.
pub fn consent_granted(rule: &FileRule, record: &Record) -> Result<bool, RecordError> {
    match &rule.consent {
        Some(consent) => Ok(record.require(&consent.field)? == consent.granted_value),
        None => Ok(true),
    }
}

fn apply_file_metadata(
    rule: &FileRule,
    record: &Record,
    entity: &mut SeqSetEntity,
) -> Result<(), RecordError> {
    if !consent_granted(rule, record)? {
        entity.private_files = true;
        entity.local_file = None;
        entity.checksums = Checksums::private_sentinel();
        entity.size = 0;
        return Ok(());
    }

    let sha256 = match &rule.sha256_field {
        Some(field) => Some(record.require(field)?.to_string()),
        None => None,
    };
    entity.private_files = false;
    entity.local_file = Some(record.require(&rule.local_file_field)?.to_string());
    entity.checksums = Checksums {
        md5: record.require(&rule.md5_field)?.to_string(),
        sha256,
    };
    entity.size = record.require_u64(&rule.size_field)?;
    Ok(())
}
