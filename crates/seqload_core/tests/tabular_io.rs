use seqload_core::{
    header_fields, CategorizedSinks, Record, SinkCategory, TabularError, TabularSource,
};
use std::path::Path;

fn write(path: &Path, text: &str) {
    std::fs::write(path, text).unwrap();
}

#[test]
fn source_yields_records_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host_batch.csv");
    write(
        &path,
        "file_name,size,prepared_from\nr1.fastq,10,HSP-1\nr2.fastq,20,HSP-2\n",
    );

    let source = TabularSource::open(&path).unwrap();
    assert_eq!(source.header(), ["file_name", "size", "prepared_from"]);
    assert_eq!(source.logical_name(), "host_batch");

    let records: Vec<Record> = source.records().unwrap().map(Result::unwrap).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get("file_name"), Some("r1.fastq"));
    assert_eq!(records[1].require_u64("size").unwrap(), 20);
    assert_eq!(records[1].get("prepared_from"), Some("HSP-2"));
}

#[test]
fn records_can_be_read_again_from_the_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.csv");
    write(&path, "a,b\n1,2\n3,4\n");

    let source = TabularSource::open(&path).unwrap();
    let first: Vec<Record> = source.records().unwrap().map(Result::unwrap).collect();
    let second: Vec<Record> = source.records().unwrap().map(Result::unwrap).collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn ragged_row_is_reported_as_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    write(&path, "a,b,c\n1,2,3\n4,5\n");

    let source = TabularSource::open(&path).unwrap();
    let mut records = source.records().unwrap();
    assert!(records.next().unwrap().is_ok());
    assert!(matches!(
        records.next().unwrap().unwrap_err(),
        TabularError::Csv { .. }
    ));
}

#[test]
fn blank_header_field_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blank.csv");
    write(&path, "a,,c\n1,2,3\n");

    assert!(matches!(
        TabularSource::open(&path).unwrap_err(),
        TabularError::EmptyHeader(_)
    ));
}

#[test]
fn missing_source_is_a_csv_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = header_fields(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, TabularError::Csv { .. }));
}

#[test]
fn header_fields_returns_columns_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cols.csv");
    write(&path, "local_file,md5,size\n");

    assert_eq!(
        header_fields(&path).unwrap(),
        vec!["local_file", "md5", "size"]
    );
}

#[test]
fn sinks_keep_a_single_header_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let data_file = dir.path().join("batch.csv");
    let header = vec!["name".to_string(), "note".to_string()];
    let row = |name: &str, note: &str| Record::from_pairs([("name", name), ("note", note)]);

    {
        let mut sinks = CategorizedSinks::open(&data_file, None, &header).unwrap();
        sinks
            .write(SinkCategory::Submitted, &row("a", "plain"))
            .unwrap();
        assert_eq!(sinks.rows_written(SinkCategory::Submitted), 1);
        assert_eq!(sinks.rows_written(SinkCategory::Invalid), 0);
    }
    {
        let mut sinks = CategorizedSinks::open(&data_file, None, &header).unwrap();
        sinks
            .write(SinkCategory::Submitted, &row("b", "has, comma"))
            .unwrap();
    }

    let submitted = dir.path().join("batch_submitted.csv");
    assert_eq!(
        std::fs::read_to_string(&submitted).unwrap(),
        "name,note\na,plain\nb,\"has, comma\"\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("batch_invalid_records.csv")).unwrap(),
        "name,note\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("batch_unsaved_records.csv")).unwrap(),
        "name,note\n"
    );
}

#[test]
fn sinks_honor_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let data_file = dir.path().join("in").join("batch.csv");
    let out = dir.path().join("out");

    let sinks = CategorizedSinks::open(&data_file, Some(&out), &["x".to_string()]).unwrap();

    assert_eq!(
        sinks.path(SinkCategory::Unsaved),
        out.join("batch_unsaved_records.csv")
    );
    assert!(out.join("batch_invalid_records.csv").exists());
    assert!(!dir.path().join("in").exists());
}
