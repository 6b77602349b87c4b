use seqload_core::db::migrations::latest_version;
use seqload_core::db::{open_db, open_db_in_memory, DbError};
use seqload_core::{Checksums, EntityStore, SearchField, SeqSetEntity, SqliteEntityStore};

const KIND: &str = "HostWgsRawSeqSet";

fn entity(comment: &str) -> SeqSetEntity {
    let mut entity = SeqSetEntity::new(KIND);
    entity.comment = comment.to_string();
    entity.study = "prediabetes".to_string();
    entity.sequence_type = "nucleotide".to_string();
    entity.seq_model = "HiSeq 2500".to_string();
    entity.format = "fastq".to_string();
    entity.format_doc = "https://en.wikipedia.org/wiki/FASTQ_format".to_string();
    entity.local_file = Some(format!("/seq/host/{comment}"));
    entity.checksums = Checksums {
        md5: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
        sha256: None,
    };
    entity.size = 1024;
    entity.tags = vec!["lane: 1".to_string(), "lane: 1".to_string()];
    entity.set_parent_link("sequenced_from", "prep-ext-1");
    entity
}

#[test]
fn create_assigns_hex_id_and_entity_is_searchable() {
    let conn = open_db_in_memory().unwrap();
    let mut store = SqliteEntityStore::new(&conn);

    let mut created = entity("r1.fastq");
    assert!(store.save(&mut created).unwrap());

    let id = created.id.clone().unwrap();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));

    let by_comment = store
        .find_one(KIND, SearchField::Comment, "r1.fastq")
        .unwrap()
        .unwrap();
    assert_eq!(by_comment, created);

    let by_file = store
        .find_one(KIND, SearchField::LocalFile, "/seq/host/r1.fastq")
        .unwrap()
        .unwrap();
    assert_eq!(by_file.id.as_deref(), Some(id.as_str()));
    assert_eq!(by_file.tags, vec!["lane: 1", "lane: 1"]);

    assert!(store
        .find_one("MicrobTranscriptomicsRawSeqSet", SearchField::Comment, "r1.fastq")
        .unwrap()
        .is_none());
}

#[test]
fn update_overwrites_stored_document() {
    let conn = open_db_in_memory().unwrap();
    let mut store = SqliteEntityStore::new(&conn);

    let mut stored = entity("r1.fastq");
    store.save(&mut stored).unwrap();
    let id = stored.id.clone().unwrap();

    let mut found = store
        .find_one(KIND, SearchField::Comment, "r1.fastq")
        .unwrap()
        .unwrap();
    found.seq_model = "NovaSeq 6000".to_string();
    found.size = 2048;
    assert!(store.save(&mut found).unwrap());

    let reloaded = store.get(&id).unwrap().unwrap();
    assert_eq!(reloaded.seq_model, "NovaSeq 6000");
    assert_eq!(reloaded.size, 2048);
    assert_eq!(store.count(KIND).unwrap(), 1);
}

#[test]
fn duplicate_comment_create_is_rejected_softly() {
    let conn = open_db_in_memory().unwrap();
    let mut store = SqliteEntityStore::new(&conn);

    let mut first = entity("dup.fastq");
    let mut second = entity("dup.fastq");
    assert!(store.save(&mut first).unwrap());
    assert!(!store.save(&mut second).unwrap());

    assert!(second.id.is_none());
    assert_eq!(store.count(KIND).unwrap(), 1);
}

#[test]
fn update_of_unknown_id_is_rejected_softly() {
    let conn = open_db_in_memory().unwrap();
    let mut store = SqliteEntityStore::new(&conn);

    let mut ghost = entity("ghost.fastq");
    ghost.id = Some("0123456789abcdef0123456789abcdef".to_string());
    assert!(!store.save(&mut ghost).unwrap());
    assert_eq!(store.count(KIND).unwrap(), 0);
}

#[test]
fn invalid_entity_is_never_written() {
    let conn = open_db_in_memory().unwrap();
    let mut store = SqliteEntityStore::new(&conn);

    let mut invalid = entity("bad.fastq");
    invalid.checksums.md5 = "abc".to_string();
    assert!(!store.is_valid(&invalid));
    assert!(!store.save(&mut invalid).unwrap());

    assert!(invalid.id.is_none());
    assert_eq!(store.count(KIND).unwrap(), 0);
}

#[test]
fn store_used_through_mutable_reference() {
    fn save_via<S: EntityStore>(mut store: S, entity: &mut SeqSetEntity) -> bool {
        store.save(entity).unwrap()
    }

    let conn = open_db_in_memory().unwrap();
    let mut store = SqliteEntityStore::new(&conn);
    let mut created = entity("borrowed.fastq");

    assert!(save_via(&mut store, &mut created));
    assert_eq!(store.count(KIND).unwrap(), 1);
}

#[test]
fn open_db_applies_migrations_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        let mut store = SqliteEntityStore::new(&conn);
        store.save(&mut entity("r1.fastq")).unwrap();
    }

    let conn = open_db(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());
    assert_eq!(SqliteEntityStore::new(&conn).count(KIND).unwrap(), 1);
}

#[test]
fn newer_schema_version_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version() + 1))
            .unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion { db_version, latest_supported }
            if db_version == latest_version() + 1 && latest_supported == latest_version()
    ));
}
