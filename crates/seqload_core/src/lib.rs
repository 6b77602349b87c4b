//! Core batch-loading logic for sequencing-artifact metadata.
//! This crate is the single source of truth for parent resolution, entity
//! mapping, validation and submission rules.

pub mod config;
pub mod db;
pub mod loader;
pub mod logging;
pub mod model;
pub mod store;
pub mod tabular;
pub mod tracking;

pub use config::node_type::{
    ConsentRule, FileRule, NodeDefaults, NodeTypeConfig, TagRule, ValueRule,
};
pub use config::presets::{
    host_wgs_raw_seq_set, microb_transcriptomics_raw_seq_set, preset, preset_names,
};
pub use config::settings::LoaderSettings;
pub use config::ConfigError;
pub use loader::mapping::apply_record;
pub use loader::{
    LoadReport, LoadSummary, LoaderError, LoaderResult, RecordLoader, RecordOutcome,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{
    Checksums, ExternalId, SearchField, SeqSetEntity, Violation, PRIVATE_MD5_SENTINEL,
};
pub use model::record::{Record, RecordError};
pub use model::tracking::{IdTrackingRecord, TRACKING_HEADER};
pub use store::sqlite::SqliteEntityStore;
pub use store::{EntityStore, StoreError, StoreResult};
pub use tabular::{
    header_fields, sink_path, CategorizedSinks, SinkCategory, TabularError, TabularResult,
    TabularSource,
};
pub use tracking::{IdTrackingTable, TrackingError, TrackingResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
