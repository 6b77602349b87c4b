//! Generic node-type batch loader.
//!
//! # Responsibility
//! - Drive one node type's load from tabular records to persisted entities:
//!   resolve parent, find-or-create, map, validate, save, track.
//! - Reduce each record to one `RecordOutcome` and route the raw record to
//!   the matching categorized output.
//!
//! # Invariants
//! - Records are processed once, in input order, one at a time.
//! - Parent-not-found, invalid and unsaved records are soft outcomes; every
//!   other failure aborts the batch.
//! - A tracking row is appended (and synced) for each newly created entity
//!   before its submitted output row is written and before the next record
//!   is read.
//! - Invalid output files hold the raw record under the source header; the
//!   violation list goes to the error log, one line per record.
//! - `summary.total()` equals the number of records consumed.

use crate::config::node_type::NodeTypeConfig;
use crate::config::ConfigError;
use crate::model::entity::{SeqSetEntity, Violation};
use crate::model::record::{Record, RecordError};
use crate::model::tracking::IdTrackingRecord;
use crate::store::{EntityStore, StoreError};
use crate::tabular::{
    CategorizedSinks, SinkCategory, TabularError, TabularResult, TabularSource,
};
use crate::tracking::{IdTrackingTable, TrackingError};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub mod mapping;

use mapping::apply_record;

pub type LoaderResult<T> = Result<T, LoaderError>;

/// Batch-aborting loader failure.
#[derive(Debug)]
pub enum LoaderError {
    Config(ConfigError),
    Record(RecordError),
    Tabular(TabularError),
    Tracking(TrackingError),
    Store(StoreError),
    /// Store reported a successful create without assigning an id.
    MissingExternalId { kind: String, internal_id: String },
    /// Failure while processing the record at zero-based `index`.
    AtRecord {
        index: usize,
        source: Box<LoaderError>,
    },
}

impl Display for LoaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Record(err) => write!(f, "{err}"),
            Self::Tabular(err) => write!(f, "{err}"),
            Self::Tracking(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::MissingExternalId { kind, internal_id } => write!(
                f,
                "store saved {kind} `{internal_id}` without assigning an external id"
            ),
            Self::AtRecord { index, source } => write!(f, "record #{index}: {source}"),
        }
    }
}

impl Error for LoaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Record(err) => Some(err),
            Self::Tabular(err) => Some(err),
            Self::Tracking(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::AtRecord { source, .. } => Some(source.as_ref()),
            Self::MissingExternalId { .. } => None,
        }
    }
}

impl From<ConfigError> for LoaderError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RecordError> for LoaderError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

impl From<TabularError> for LoaderError {
    fn from(value: TabularError) -> Self {
        Self::Tabular(value)
    }
}

impl From<TrackingError> for LoaderError {
    fn from(value: TrackingError) -> Self {
        Self::Tracking(value)
    }
}

impl From<StoreError> for LoaderError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Result of processing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Saved. `tracked` is set when the entity was newly created.
    Submitted { tracked: Option<IdTrackingRecord> },
    /// Parent internal id has no tracking row; record skipped.
    ParentUnresolved { parent_internal_id: String },
    /// Entity failed schema validation; record skipped.
    Invalid(Vec<Violation>),
    /// Store rejected the save; record skipped.
    SaveFailed,
}

/// Per-outcome record counts of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub submitted: usize,
    pub created: usize,
    pub updated: usize,
    pub invalid: usize,
    pub unsaved: usize,
    pub parent_unresolved: usize,
}

impl LoadSummary {
    /// Number of records consumed; every record lands in one bucket.
    pub fn total(&self) -> usize {
        self.submitted + self.invalid + self.unsaved + self.parent_unresolved
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Tracking rows created by this run, in input order.
    pub tracked: Vec<IdTrackingRecord>,
    pub summary: LoadSummary,
}

impl LoadReport {
    fn push(&mut self, outcome: RecordOutcome) {
        let summary = &mut self.summary;
        match outcome {
            RecordOutcome::Submitted { tracked } => {
                summary.submitted += 1;
                match tracked {
                    Some(row) => {
                        summary.created += 1;
                        self.tracked.push(row);
                    }
                    None => summary.updated += 1,
                }
            }
            RecordOutcome::ParentUnresolved { .. } => summary.parent_unresolved += 1,
            RecordOutcome::Invalid(_) => summary.invalid += 1,
            RecordOutcome::SaveFailed => summary.unsaved += 1,
        }
    }
}

/// Loads records of one node type into an entity store.
pub struct RecordLoader<S: EntityStore> {
    config: NodeTypeConfig,
    store: S,
}

impl<S: EntityStore> RecordLoader<S> {
    /// Creates a loader after validating `config`.
    pub fn new(config: NodeTypeConfig, store: S) -> LoaderResult<Self> {
        config.validate()?;
        Ok(Self { config, store })
    }

    pub fn config(&self) -> &NodeTypeConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Loads `data_file` using the tracking file at `tracking_file`.
    ///
    /// Categorized outputs are written beside the data file. Returns the
    /// tracking rows created by this run.
    pub fn submit(
        &mut self,
        data_file: impl AsRef<Path>,
        tracking_file: impl AsRef<Path>,
    ) -> LoaderResult<Vec<IdTrackingRecord>> {
        let mut tracking = IdTrackingTable::open(tracking_file)?;
        let report = self.load_file(data_file.as_ref(), &mut tracking, None)?;
        Ok(report.tracked)
    }

    /// Loads `data_file` against an already-open tracking table.
    pub fn load_file(
        &mut self,
        data_file: &Path,
        tracking: &mut IdTrackingTable,
        output_dir: Option<&Path>,
    ) -> LoaderResult<LoadReport> {
        let source = TabularSource::open(data_file)?;
        let mut sinks = CategorizedSinks::open(data_file, output_dir, source.header())?;
        self.run(source.records()?, &mut sinks, tracking)
    }

    /// Processes `records` in order, stopping at the first hard failure.
    pub fn run<I>(
        &mut self,
        records: I,
        sinks: &mut CategorizedSinks,
        tracking: &mut IdTrackingTable,
    ) -> LoaderResult<LoadReport>
    where
        I: IntoIterator<Item = TabularResult<Record>>,
    {
        info!(
            "event=batch_start module=loader status=start node_type={} parent_type={}",
            self.config.node_type, self.config.parent_type
        );

        let mut report = LoadReport::default();
        for (index, item) in records.into_iter().enumerate() {
            let outcome = item
                .map_err(LoaderError::from)
                .and_then(|record| self.process_record(&record, sinks, tracking))
                .map_err(|err| {
                    error!(
                        "event=record_process module=loader status=error node_type={} index={} error={}",
                        self.config.node_type, index, err
                    );
                    LoaderError::AtRecord {
                        index,
                        source: Box::new(err),
                    }
                })?;
            report.push(outcome);
        }

        let summary = &report.summary;
        info!(
            "event=batch_done module=loader status=ok node_type={} total={} submitted={} created={} updated={} invalid={} unsaved={} parent_unresolved={}",
            self.config.node_type,
            summary.total(),
            summary.submitted,
            summary.created,
            summary.updated,
            summary.invalid,
            summary.unsaved,
            summary.parent_unresolved
        );
        Ok(report)
    }

    /// Processes one record through resolve, map, validate and save.
    pub fn process_record(
        &mut self,
        record: &Record,
        sinks: &mut CategorizedSinks,
        tracking: &mut IdTrackingTable,
    ) -> LoaderResult<RecordOutcome> {
        let config = &self.config;
        debug!(
            "event=record_read module=loader node_type={} record={:?}",
            config.node_type, record
        );

        let parent_internal_id = record.require(&config.parent_id_field)?;
        let Some(parent_external_id) = tracking
            .lookup(&config.parent_type, parent_internal_id)
            .map(str::to_string)
        else {
            error!(
                "event=parent_lookup module=loader status=not_found node_type={} parent_type={} parent_internal_id={}",
                config.node_type, config.parent_type, parent_internal_id
            );
            return Ok(RecordOutcome::ParentUnresolved {
                parent_internal_id: parent_internal_id.to_string(),
            });
        };

        let internal_id = config.internal_id.resolve(record)?;
        let mut entity = self
            .store
            .find_one(&config.entity_kind, config.search_field, &internal_id)?
            .unwrap_or_else(|| SeqSetEntity::new(&config.entity_kind));
        let is_new = entity.is_new();
        debug!(
            "event=entity_lookup module=loader node_type={} internal_id={} is_new={}",
            config.node_type, internal_id, is_new
        );

        apply_record(config, record, &mut entity, &parent_external_id)?;

        let violations = self.store.validate(&entity);
        if !violations.is_empty() {
            sinks.write(SinkCategory::Invalid, record)?;
            let details = violations
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            error!(
                "event=entity_validate module=loader status=invalid node_type={} internal_id={} violations=[{}]",
                config.node_type, internal_id, details
            );
            return Ok(RecordOutcome::Invalid(violations));
        }

        if !self.store.save(&mut entity)? {
            sinks.write(SinkCategory::Unsaved, record)?;
            warn!(
                "event=entity_save module=loader status=unsaved node_type={} internal_id={}",
                config.node_type, internal_id
            );
            return Ok(RecordOutcome::SaveFailed);
        }

        if !is_new {
            sinks.write(SinkCategory::Submitted, record)?;
            info!(
                "event=entity_save module=loader status=updated node_type={} internal_id={}",
                config.node_type, internal_id
            );
            return Ok(RecordOutcome::Submitted { tracked: None });
        }

        let external_id = entity
            .id
            .clone()
            .ok_or_else(|| LoaderError::MissingExternalId {
                kind: config.entity_kind.clone(),
                internal_id: internal_id.clone(),
            })?;
        let mut saved_name = entity
            .search_value(config.search_field)
            .filter(|value| !value.is_empty())
            .unwrap_or(internal_id.as_str())
            .to_string();
        if entity.private_files {
            if let Some(suffix) = config
                .file
                .consent
                .as_ref()
                .and_then(|consent| consent.private_suffix.as_deref())
            {
                saved_name.push_str(suffix);
            }
        }
        let tracked = IdTrackingRecord::new(
            &config.node_type,
            saved_name,
            external_id,
            &config.parent_type,
            parent_internal_id,
            parent_external_id,
            Utc::now(),
        );
        tracking.append(tracked.clone())?;
        sinks.write(SinkCategory::Submitted, record)?;
        info!(
            "event=entity_save module=loader status=created node_type={} internal_id={} external_id={}",
            config.node_type, tracked.internal_id, tracked.external_id
        );

        Ok(RecordOutcome::Submitted {
            tracked: Some(tracked),
        })
    }
}
