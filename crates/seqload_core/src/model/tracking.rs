//! ID-tracking provenance row.
//!
//! One row is appended per newly created entity so later batches (for child
//! node types) can resolve their parent's external id without querying the
//! repository.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Column order of the ID-tracking file.
pub const TRACKING_HEADER: [&str; 7] = [
    "node_type",
    "internal_id",
    "external_id",
    "parent_node_type",
    "parent_internal_id",
    "parent_external_id",
    "created_at",
];

/// Provenance row linking an internal id to the store-assigned external id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdTrackingRecord {
    /// Lowercased node type label.
    pub node_type: String,
    pub internal_id: String,
    pub external_id: String,
    /// Lowercased parent node type label.
    pub parent_node_type: String,
    pub parent_internal_id: String,
    pub parent_external_id: String,
    /// RFC 3339 UTC timestamp, second precision.
    pub created_at: String,
}

impl IdTrackingRecord {
    /// Builds a row, normalizing type labels to lowercase.
    pub fn new(
        node_type: &str,
        internal_id: impl Into<String>,
        external_id: impl Into<String>,
        parent_node_type: &str,
        parent_internal_id: impl Into<String>,
        parent_external_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            node_type: node_type.to_lowercase(),
            internal_id: internal_id.into(),
            external_id: external_id.into(),
            parent_node_type: parent_node_type.to_lowercase(),
            parent_internal_id: parent_internal_id.into(),
            parent_external_id: parent_external_id.into(),
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Returns values in `TRACKING_HEADER` order.
    pub fn to_row(&self) -> [&str; 7] {
        [
            self.node_type.as_str(),
            self.internal_id.as_str(),
            self.external_id.as_str(),
            self.parent_node_type.as_str(),
            self.parent_internal_id.as_str(),
            self.parent_external_id.as_str(),
            self.created_at.as_str(),
        ]
    }

    /// Rebuilds a row read back from the tracking file.
    ///
    /// Returns `None` when the row does not have exactly seven columns.
    pub fn from_row<'a, I>(row: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut columns = row.into_iter();
        let record = Self {
            node_type: columns.next()?.to_string(),
            internal_id: columns.next()?.to_string(),
            external_id: columns.next()?.to_string(),
            parent_node_type: columns.next()?.to_string(),
            parent_internal_id: columns.next()?.to_string(),
            parent_external_id: columns.next()?.to_string(),
            created_at: columns.next()?.to_string(),
        };
        if columns.next().is_some() {
            return None;
        }
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::IdTrackingRecord;
    use chrono::{TimeZone, Utc};

    #[test]
    fn new_lowercases_types_and_formats_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let row = IdTrackingRecord::new(
            "MicrobTranscriptRawSeqs",
            "s1.fastq",
            "ext-1",
            "WgsDnaPrep",
            "P1",
            "ext-parent",
            at,
        );
        assert_eq!(row.node_type, "microbtranscriptrawseqs");
        assert_eq!(row.parent_node_type, "wgsdnaprep");
        assert_eq!(row.created_at, "2026-03-01T12:30:00Z");
    }

    #[test]
    fn from_row_rejects_wrong_width() {
        assert!(IdTrackingRecord::from_row(["a", "b", "c"]).is_none());
        assert!(IdTrackingRecord::from_row(["a", "b", "c", "d", "e", "f", "g", "h"]).is_none());
        let row = IdTrackingRecord::from_row(["a", "b", "c", "d", "e", "f", "g"]).unwrap();
        assert_eq!(row.to_row(), ["a", "b", "c", "d", "e", "f", "g"]);
    }
}
