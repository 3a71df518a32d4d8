use assocdb_core::db::open_db_in_memory;
use assocdb_core::{
    table_schema, EntityKind, EntityRepository, EntityService, LookupKey, RepoError,
    ServiceError, SqliteEntityRepository,
};
use rusqlite::Connection;

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn create_and_get_roundtrip_for_every_leaf_kind() {
    let conn = open_db_in_memory().unwrap();
    for kind in [
        EntityKind::Verb,
        EntityKind::Attribute,
        EntityKind::State,
        EntityKind::Routine,
    ] {
        let service = EntityService::new(SqliteEntityRepository::try_new(&conn, kind).unwrap());
        let created = service.create("  first ").unwrap();
        assert_eq!(created.name, "first");

        let loaded = service.get(created.id).unwrap();
        assert_eq!(loaded, created);
        assert_eq!(service.get_by_name("first").unwrap(), created);
    }
}

#[test]
fn list_returns_entities_in_insertion_order() {
    let conn = open_db_in_memory().unwrap();
    let service =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::State).unwrap());
    let names = ["red", "blue", "green"];
    for name in names {
        service.create(name).unwrap();
    }

    let listed = service.list().unwrap();
    let listed_names: Vec<&str> = listed.iter().map(|entity| entity.name.as_str()).collect();
    assert_eq!(listed_names, names);
    assert!(listed.windows(2).all(|pair| pair[0].id < pair[1].id));
}

#[test]
fn duplicate_name_is_conflict_and_creates_no_row() {
    let conn = open_db_in_memory().unwrap();
    let service =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::Verb).unwrap());
    service.create("open").unwrap();

    let err = service.create("open").unwrap_err();
    match err {
        ServiceError::Conflict { kind, name } => {
            assert_eq!(kind, EntityKind::Verb);
            assert_eq!(name, "open");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count_rows(&conn, "verbs"), 1);
}

#[test]
fn same_name_is_allowed_across_kinds() {
    let conn = open_db_in_memory().unwrap();
    let verbs =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::Verb).unwrap());
    let routines =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::Routine).unwrap());

    verbs.create("roll").unwrap();
    routines.create("roll").unwrap();
}

#[test]
fn blank_name_is_invalid_argument() {
    let conn = open_db_in_memory().unwrap();
    let service =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::Attribute).unwrap());

    let err = service.create("   ").unwrap_err();
    assert!(matches!(err, ServiceError::InvalidArgument(_)));
    assert_eq!(count_rows(&conn, "attributes"), 0);
}

#[test]
fn rename_updates_name_and_detects_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let service =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::Attribute).unwrap());
    let heavy = service.create("heavy").unwrap();
    let light = service.create("light").unwrap();

    let renamed = service.rename(heavy.id, "massive").unwrap();
    assert_eq!(renamed.id, heavy.id);
    assert_eq!(service.get(heavy.id).unwrap().name, "massive");

    let same = service.rename(light.id, "light").unwrap();
    assert_eq!(same, light);

    let err = service.rename(light.id, "massive").unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { .. }));
    assert_eq!(service.get(light.id).unwrap().name, "light");
}

#[test]
fn missing_ids_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::Routine).unwrap());

    for err in [
        service.get(42).unwrap_err(),
        service.rename(42, "anything").unwrap_err(),
        service.delete(42).unwrap_err(),
    ] {
        match err {
            ServiceError::NotFound { kind, key } => {
                assert_eq!(kind, EntityKind::Routine);
                assert_eq!(key, LookupKey::Id(42));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    let err = service.get_by_name("ghost").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            key: LookupKey::Name(_),
            ..
        }
    ));
}

#[test]
fn delete_removes_row() {
    let conn = open_db_in_memory().unwrap();
    let service =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::State).unwrap());
    let created = service.create("idle").unwrap();

    service.delete(created.id).unwrap();
    assert!(service.list().unwrap().is_empty());
    assert!(matches!(
        service.get(created.id).unwrap_err(),
        ServiceError::NotFound { .. }
    ));
}

#[test]
fn repository_rejects_connection_without_tables() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteEntityRepository::try_new(&conn, EntityKind::Verb)
        .err()
        .unwrap();
    assert!(matches!(err, RepoError::MissingRequiredTable("verbs")));
}

#[test]
fn repository_create_normalizes_name_directly() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntityRepository::try_new(&conn, EntityKind::Verb).unwrap();
    let created = repo.create_entity(" kick ").unwrap();
    assert_eq!(created.name, "kick");
    assert!(matches!(
        repo.create_entity(" ").unwrap_err(),
        RepoError::Validation(_)
    ));
}

#[test]
fn table_schema_reports_declared_column_types() {
    let conn = open_db_in_memory().unwrap();
    for kind in EntityKind::ALL {
        let schema = table_schema(&conn, kind).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.get("id").map(String::as_str), Some("INTEGER"));
        assert_eq!(schema.get("name").map(String::as_str), Some("VARCHAR(255)"));
    }
}
