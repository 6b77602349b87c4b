//! Sequencing-artifact entity model.
//!
//! # Responsibility
//! - Define the node submitted to the scientific-data repository.
//! - Own the schema check run before every save.
//!
//! # Invariants
//! - `id == None` means the entity has never been persisted.
//! - A valid entity links to exactly one parent through one relation.
//! - Private entities never retain a local file path.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Opaque identifier assigned by the entity store on first save.
pub type ExternalId = String;

/// Checksum recorded when file consent is withheld.
pub const PRIVATE_MD5_SENTINEL: &str = "00000000000000000000000000000000";

const SEQUENCE_TYPES: &[&str] = &["nucleotide", "peptide"];
const FILE_FORMATS: &[&str] = &["fasta", "fastq", "sff", "bam", "sam"];

static MD5_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{32}$").expect("valid md5 regex"));
static SHA256_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{64}$").expect("valid sha256 regex"));
static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

/// Entity attribute used to detect an already-persisted entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Comment,
    LocalFile,
}

impl SearchField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::LocalFile => "local_file",
        }
    }
}

impl Display for SearchField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content hashes of the sequence file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    pub md5: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl Checksums {
    /// Placeholder checksum pair for files that must not be exposed.
    pub fn private_sentinel() -> Self {
        Self {
            md5: PRIVATE_MD5_SENTINEL.to_string(),
            sha256: None,
        }
    }
}

/// One schema violation reported by `SeqSetEntity::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Raw sequence set node (one sequencing output file and its metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeqSetEntity {
    /// Repository node type name, e.g. `MicrobTranscriptomicsRawSeqSet`.
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ExternalId>,
    pub comment: String,
    pub study: String,
    pub sequence_type: String,
    pub seq_model: String,
    pub format: String,
    pub format_doc: String,
    /// Always zero; not sourced from input.
    pub exp_length: u64,
    pub local_file: Option<String>,
    pub checksums: Checksums,
    pub size: u64,
    pub private_files: bool,
    /// Ordered free-text tags; duplicates are kept.
    pub tags: Vec<String>,
    /// Relation name -> linked external ids.
    pub links: BTreeMap<String, Vec<ExternalId>>,
}

impl SeqSetEntity {
    /// Creates an empty, never-persisted entity of `kind`.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            comment: String::new(),
            study: String::new(),
            sequence_type: String::new(),
            seq_model: String::new(),
            format: String::new(),
            format_doc: String::new(),
            exp_length: 0,
            local_file: None,
            checksums: Checksums::default(),
            size: 0,
            private_files: false,
            tags: Vec::new(),
            links: BTreeMap::new(),
        }
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Replaces all links with a single `relation -> [parent_id]` entry.
    pub fn set_parent_link(&mut self, relation: &str, parent_id: &str) {
        self.links.clear();
        self.links
            .insert(relation.to_string(), vec![parent_id.to_string()]);
    }

    /// Returns the current value of `field`, if set.
    pub fn search_value(&self, field: SearchField) -> Option<&str> {
        match field {
            SearchField::Comment => Some(self.comment.as_str()),
            SearchField::LocalFile => self.local_file.as_deref(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Checks the entity against the repository schema.
    ///
    /// Returns every violation found; an empty list means valid.
    pub fn validate(&self) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (field, value) in [
            ("kind", &self.kind),
            ("comment", &self.comment),
            ("study", &self.study),
            ("seq_model", &self.seq_model),
        ] {
            if value.trim().is_empty() {
                violations.push(Violation::new(field, "is required"));
            }
        }

        if !SEQUENCE_TYPES.contains(&self.sequence_type.as_str()) {
            violations.push(Violation::new(
                "sequence_type",
                format!(
                    "`{}` is not one of {}",
                    self.sequence_type,
                    SEQUENCE_TYPES.join("|")
                ),
            ));
        }
        if !FILE_FORMATS.contains(&self.format.as_str()) {
            violations.push(Violation::new(
                "format",
                format!("`{}` is not one of {}", self.format, FILE_FORMATS.join("|")),
            ));
        }
        if !URL_RE.is_match(&self.format_doc) {
            violations.push(Violation::new(
                "format_doc",
                format!("`{}` is not an http(s) url", self.format_doc),
            ));
        }

        if !MD5_RE.is_match(&self.checksums.md5) {
            violations.push(Violation::new(
                "checksums",
                format!("md5 `{}` is not 32 hex characters", self.checksums.md5),
            ));
        }
        if let Some(sha256) = &self.checksums.sha256 {
            if !SHA256_RE.is_match(sha256) {
                violations.push(Violation::new(
                    "checksums",
                    format!("sha256 `{sha256}` is not 64 hex characters"),
                ));
            }
        }

        if self.private_files {
            if self.local_file.is_some() {
                violations.push(Violation::new(
                    "local_file",
                    "must be unset for private files",
                ));
            }
        } else {
            if self.local_file.as_deref().map_or(true, |path| path.trim().is_empty()) {
                violations.push(Violation::new("local_file", "is required"));
            }
            if self.size == 0 {
                violations.push(Violation::new("size", "must be positive"));
            }
        }

        if self.tags.iter().any(|tag| tag.trim().is_empty()) {
            violations.push(Violation::new("tags", "must not contain empty tags"));
        }

        match self.links.iter().next() {
            Some((relation, ids)) if self.links.len() == 1 => {
                if ids.len() != 1 || ids[0].trim().is_empty() {
                    violations.push(Violation::new(
                        "links",
                        format!("`{relation}` must hold exactly one parent id"),
                    ));
                }
            }
            _ => violations.push(Violation::new(
                "links",
                format!(
                    "expected exactly one parent relation, found {}",
                    self.links.len()
                ),
            )),
        }

        violations
    }
}
