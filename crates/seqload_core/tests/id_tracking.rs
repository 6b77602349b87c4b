use chrono::{TimeZone, Utc};
use seqload_core::{IdTrackingRecord, IdTrackingTable, TrackingError, TRACKING_HEADER};

fn row(internal_id: &str, external_id: &str) -> IdTrackingRecord {
    IdTrackingRecord::new(
        "HostSeqPrep",
        internal_id,
        external_id,
        "Sample",
        "S-1",
        "sample-ext-1",
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap(),
    )
}

#[test]
fn open_creates_file_with_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ids.csv");

    let table = IdTrackingTable::open(&path).unwrap();

    assert!(table.is_empty());
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        format!("{}\n", TRACKING_HEADER.join(","))
    );
}

#[test]
fn appended_rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.csv");

    {
        let mut table = IdTrackingTable::open(&path).unwrap();
        table.append(row("HSP-1", "ext-aaa")).unwrap();
        assert_eq!(table.lookup("hostseqprep", "HSP-1"), Some("ext-aaa"));
    }

    let table = IdTrackingTable::open(&path).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.lookup("HostSeqPrep", "HSP-1"), Some("ext-aaa"));
    assert_eq!(table.lookup("HOSTSEQPREP", "HSP-1"), Some("ext-aaa"));
    assert_eq!(table.lookup("HostSeqPrep", "hsp-1"), None);
    assert_eq!(table.lookup("Sample", "HSP-1"), None);

    let stored = &table.rows()[0];
    assert_eq!(stored.node_type, "hostseqprep");
    assert_eq!(stored.parent_node_type, "sample");
    assert_eq!(stored.created_at, "2024-03-01T12:30:05Z");
}

#[test]
fn appends_never_rewrite_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.csv");

    {
        let mut table = IdTrackingTable::open(&path).unwrap();
        for index in 1..=3 {
            table
                .append(row(&format!("HSP-{index}"), &format!("ext-{index}")))
                .unwrap();
        }
    }
    let before = std::fs::read_to_string(&path).unwrap();

    {
        let mut table = IdTrackingTable::open(&path).unwrap();
        table.append(row("HSP-4", "ext-4")).unwrap();
        table.append(row("HSP-5", "ext-5")).unwrap();
    }
    let after = std::fs::read_to_string(&path).unwrap();

    assert!(after.starts_with(&before));
    assert_eq!(after.lines().count(), 1 + 5);
    let table = IdTrackingTable::open(&path).unwrap();
    let ids: Vec<&str> = table
        .rows()
        .iter()
        .map(|row| row.external_id.as_str())
        .collect();
    assert_eq!(ids, vec!["ext-1", "ext-2", "ext-3", "ext-4", "ext-5"]);
}

#[test]
fn latest_row_wins_for_duplicate_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.csv");

    let mut table = IdTrackingTable::open(&path).unwrap();
    table.append(row("HSP-1", "ext-old")).unwrap();
    table.append(row("HSP-1", "ext-new")).unwrap();
    assert_eq!(table.lookup("HostSeqPrep", "HSP-1"), Some("ext-new"));
    drop(table);

    let table = IdTrackingTable::open(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup("HostSeqPrep", "HSP-1"), Some("ext-new"));
}

#[test]
fn foreign_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.csv");
    std::fs::write(&path, "type,id,ext\nx,y,z\n").unwrap();

    let err = IdTrackingTable::open(&path).err().unwrap();
    match err {
        TrackingError::UnexpectedHeader { found, .. } => {
            assert_eq!(found, vec!["type", "id", "ext"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn short_row_is_reported_with_its_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.csv");
    std::fs::write(
        &path,
        format!(
            "{}\nhostseqprep,HSP-1,ext-1,sample,S-1,sx,2024-03-01T12:30:05Z\nhostseqprep,HSP-2\n",
            TRACKING_HEADER.join(",")
        ),
    )
    .unwrap();

    let err = IdTrackingTable::open(&path).err().unwrap();
    assert!(matches!(err, TrackingError::MalformedRow { line: 3, .. }));
}
