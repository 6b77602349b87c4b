//! Per-node-type mapping configuration.
//!
//! # Responsibility
//! - Declare which record fields feed parent resolution, identity and
//!   entity attributes for one node type.
//! - Resolve value rules against a record.
//!
//! # Invariants
//! - Tag rules render in declaration order; duplicates are kept.
//! - Tag prefixes are used verbatim (no separator is inserted).

use crate::config::{read_toml, ConfigError, ConfigResult};
use crate::model::entity::SearchField;
use crate::model::record::{Record, RecordError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a string value is derived from a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRule {
    /// Field value, verbatim.
    Field(String),
    /// Final `/`-separated segment of a path-valued field.
    Basename(String),
    /// Field values joined by `separator`, followed by `suffix`.
    Composite {
        fields: Vec<String>,
        #[serde(default)]
        separator: String,
        #[serde(default)]
        suffix: String,
    },
    /// Fixed text independent of the record.
    Constant(String),
}

impl ValueRule {
    pub fn resolve(&self, record: &Record) -> Result<String, RecordError> {
        match self {
            Self::Field(field) => Ok(record.require(field)?.to_string()),
            Self::Basename(field) => Ok(basename(record.require(field)?).to_string()),
            Self::Composite {
                fields,
                separator,
                suffix,
            } => {
                let parts = fields
                    .iter()
                    .map(|field| record.require(field))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("{}{suffix}", parts.join(separator)))
            }
            Self::Constant(text) => Ok(text.clone()),
        }
    }

    fn referenced_fields(&self) -> Vec<&str> {
        match self {
            Self::Field(field) | Self::Basename(field) => vec![field.as_str()],
            Self::Composite { fields, .. } => fields.iter().map(String::as_str).collect(),
            Self::Constant(_) => Vec::new(),
        }
    }
}

/// One `prefix + value` free-text tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub prefix: String,
    pub value: ValueRule,
}

impl TagRule {
    pub fn new(prefix: impl Into<String>, value: ValueRule) -> Self {
        Self {
            prefix: prefix.into(),
            value,
        }
    }

    pub fn render(&self, record: &Record) -> Result<String, RecordError> {
        Ok(format!("{}{}", self.prefix, self.value.resolve(record)?))
    }
}

/// Consent gate deciding whether real file metadata may be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentRule {
    pub field: String,
    /// Exact (case-sensitive) value meaning consent was granted.
    pub granted_value: String,
    /// Appended to the tracked name of entities created without consent.
    #[serde(default)]
    pub private_suffix: Option<String>,
}

/// Record fields carrying file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRule {
    pub local_file_field: String,
    pub md5_field: String,
    #[serde(default)]
    pub sha256_field: Option<String>,
    pub size_field: String,
    /// `None`: every record is treated as consented.
    #[serde(default)]
    pub consent: Option<ConsentRule>,
}

/// Constant attribute values shared by every entity of a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDefaults {
    pub study: String,
    pub sequence_type: String,
    pub format: String,
    pub format_doc: String,
}

/// Complete mapping for one node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeConfig {
    /// Label written to the tracking file, e.g. `MicrobTranscriptRawSeqs`.
    pub node_type: String,
    /// Repository node type name used for store lookups.
    pub entity_kind: String,
    pub parent_type: String,
    /// Record field carrying the parent's internal id.
    pub parent_id_field: String,
    pub search_field: SearchField,
    pub internal_id: ValueRule,
    /// Link relation name pointing at the parent, e.g. `sequenced_from`.
    pub link_relation: String,
    pub defaults: NodeDefaults,
    pub comment: ValueRule,
    pub seq_model_field: String,
    pub file: FileRule,
    #[serde(default)]
    pub tags: Vec<TagRule>,
}

impl NodeTypeConfig {
    /// Reads and validates a node type description from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let config: Self = read_toml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects empty labels and empty field references.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("node_type", &self.node_type),
            ("entity_kind", &self.entity_kind),
            ("parent_type", &self.parent_type),
            ("parent_id_field", &self.parent_id_field),
            ("link_relation", &self.link_relation),
            ("seq_model_field", &self.seq_model_field),
            ("file.local_file_field", &self.file.local_file_field),
            ("file.md5_field", &self.file.md5_field),
            ("file.size_field", &self.file.size_field),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("`{name}` cannot be empty")));
            }
        }

        if matches!(&self.file.sha256_field, Some(field) if field.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "`file.sha256_field` cannot be empty when set".to_string(),
            ));
        }
        if let Some(consent) = &self.file.consent {
            if consent.field.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "`file.consent.field` cannot be empty".to_string(),
                ));
            }
            // Private entities have no `local_file` to search on.
            if self.search_field == SearchField::LocalFile {
                return Err(ConfigError::Invalid(
                    "`search_field = local_file` cannot be combined with `file.consent`"
                        .to_string(),
                ));
            }
        }

        let mut rules = vec![("internal_id", &self.internal_id), ("comment", &self.comment)];
        rules.extend(self.tags.iter().map(|tag| ("tags", &tag.value)));
        for (name, rule) in rules {
            if let ValueRule::Composite { fields, .. } = rule {
                if fields.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "`{name}` composite rule needs at least one field"
                    )));
                }
            }
            if rule
                .referenced_fields()
                .iter()
                .any(|field| field.trim().is_empty())
            {
                return Err(ConfigError::Invalid(format!(
                    "`{name}` references an empty field name"
                )));
            }
        }

        Ok(())
    }
}

fn basename(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((_, name)) => name,
        None => path,
    }
}
