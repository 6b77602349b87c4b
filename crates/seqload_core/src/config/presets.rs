//! Built-in node type configurations.

use crate::config::node_type::{
    ConsentRule, FileRule, NodeDefaults, NodeTypeConfig, TagRule, ValueRule,
};
use crate::config::{ConfigError, ConfigResult};
use crate::model::entity::SearchField;

const STUDY: &str = "prediabetes";
const SEQUENCED_FROM: &str = "sequenced_from";

const PRESET_NAMES: &[&str] = &["MicrobTranscriptRawSeqs", "HostWgsRawSeqSet"];

/// Returns the node type labels accepted by `preset`.
pub fn preset_names() -> &'static [&'static str] {
    PRESET_NAMES
}

/// Looks a preset up by node type label, ignoring ASCII case.
pub fn preset(name: &str) -> ConfigResult<NodeTypeConfig> {
    let normalized = name.trim();
    if normalized.eq_ignore_ascii_case("MicrobTranscriptRawSeqs") {
        Ok(microb_transcriptomics_raw_seq_set())
    } else if normalized.eq_ignore_ascii_case("HostWgsRawSeqSet") {
        Ok(host_wgs_raw_seq_set())
    } else {
        Err(ConfigError::UnknownPreset(normalized.to_string()))
    }
}

/// Raw RNA-seq files sequenced from a WGS DNA prep, with per-file consent.
pub fn microb_transcriptomics_raw_seq_set() -> NodeTypeConfig {
    let file_name = ValueRule::Basename("local_file".to_string());
    NodeTypeConfig {
        node_type: "MicrobTranscriptRawSeqs".to_string(),
        entity_kind: "MicrobTranscriptomicsRawSeqSet".to_string(),
        parent_type: "WgsDnaPrep".to_string(),
        parent_id_field: "prep_id".to_string(),
        search_field: SearchField::Comment,
        internal_id: file_name.clone(),
        link_relation: SEQUENCED_FROM.to_string(),
        defaults: fastq_defaults(),
        comment: file_name.clone(),
        seq_model_field: "seq_model".to_string(),
        file: FileRule {
            local_file_field: "local_file".to_string(),
            md5_field: "md5".to_string(),
            sha256_field: Some("sha256".to_string()),
            size_field: "size".to_string(),
            consent: Some(ConsentRule {
                field: "consented".to_string(),
                granted_value: "YES".to_string(),
                private_suffix: Some("-private_file".to_string()),
            }),
        },
        tags: vec![
            TagRule::new("sequence type: ", ValueRule::Constant("RNAseq".to_string())),
            TagRule::new("jaxid (sample): ", field("jaxid_sample")),
            TagRule::new("sample name: ", field("sample_name_id")),
            TagRule::new("body site: ", field("body_site")),
            TagRule::new("subject id: ", field("rand_subject_id")),
            TagRule::new("study: ", ValueRule::Constant(STUDY.to_string())),
            TagRule::new("prep_id:", field("prep_id")),
            TagRule::new("file name: ", file_name),
        ],
    }
}

/// Host whole-genome raw sequence files sequenced from a host seq prep,
/// one entity per `file_name`.
pub fn host_wgs_raw_seq_set() -> NodeTypeConfig {
    NodeTypeConfig {
        node_type: "HostWgsRawSeqSet".to_string(),
        entity_kind: "HostWgsRawSeqSet".to_string(),
        parent_type: "HostSeqPrep".to_string(),
        parent_id_field: "prepared_from".to_string(),
        search_field: SearchField::Comment,
        internal_id: field("file_name"),
        link_relation: SEQUENCED_FROM.to_string(),
        defaults: fastq_defaults(),
        comment: field("file_name"),
        seq_model_field: "seq_model".to_string(),
        file: FileRule {
            local_file_field: "local_file".to_string(),
            md5_field: "md5".to_string(),
            sha256_field: Some("sha256".to_string()),
            size_field: "size".to_string(),
            consent: None,
        },
        tags: Vec::new(),
    }
}

fn fastq_defaults() -> NodeDefaults {
    NodeDefaults {
        study: STUDY.to_string(),
        sequence_type: "nucleotide".to_string(),
        format: "fastq".to_string(),
        format_doc: "https://en.wikipedia.org/wiki/FASTQ_format".to_string(),
    }
}

fn field(name: &str) -> ValueRule {
    ValueRule::Field(name.to_string())
}
