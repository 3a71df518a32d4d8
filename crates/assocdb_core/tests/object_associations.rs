use assocdb_core::db::open_db_in_memory;
use assocdb_core::{
    AssociationKind, Entity, EntityId, EntityKind, EntityService, LookupKey, ObjectRecord,
    ObjectService, ServiceError, SqliteEntityRepository, SqliteObjectRepository,
};
use rusqlite::Connection;

fn create_entity(conn: &Connection, kind: EntityKind, name: &str) -> Entity {
    let service = EntityService::new(SqliteEntityRepository::try_new(conn, kind).unwrap());
    service.create(name).unwrap()
}

fn object_service(conn: &Connection) -> ObjectService<SqliteObjectRepository<'_>> {
    ObjectService::new(SqliteObjectRepository::try_new(conn).unwrap())
}

fn ids(entities: &[Entity]) -> Vec<EntityId> {
    entities.iter().map(|entity| entity.id).collect()
}

fn object_ids(records: &[ObjectRecord]) -> Vec<EntityId> {
    records.iter().map(|record| record.id).collect()
}

fn link_rows(conn: &Connection) -> i64 {
    AssociationKind::ALL
        .iter()
        .map(|kind| {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM {};", kind.link_table()),
                [],
                |row| row.get::<_, i64>(0),
            )
            .unwrap()
        })
        .sum()
}

#[test]
fn created_object_has_empty_association_sets() {
    let conn = open_db_in_memory().unwrap();
    let service = object_service(&conn);

    let ball = service.create_object("ball").unwrap();
    assert_eq!(ball.name, "ball");
    for kind in AssociationKind::ALL {
        assert!(ball.associations(kind).is_empty());
    }
    assert_eq!(service.get_object_by_name("ball").unwrap(), ball);
}

#[test]
fn add_then_remove_state_restores_prior_set() {
    let conn = open_db_in_memory().unwrap();
    let red = create_entity(&conn, EntityKind::State, "red");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();

    let linked = service
        .add_association(ball.id, AssociationKind::State, red.id)
        .unwrap();
    assert_eq!(linked.states, vec![red.clone()]);
    assert!(linked.verbs.is_empty());

    let unlinked = service
        .remove_association(ball.id, AssociationKind::State, red.id)
        .unwrap();
    assert_eq!(unlinked, ball);
}

#[test]
fn duplicate_add_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let roll = create_entity(&conn, EntityKind::Verb, "roll");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();

    let first = service
        .add_association(ball.id, AssociationKind::Verb, roll.id)
        .unwrap();
    let second = service
        .add_association(ball.id, AssociationKind::Verb, roll.id)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(ids(&second.verbs), vec![roll.id]);
    assert_eq!(link_rows(&conn), 1);
}

#[test]
fn added_object_is_returned_by_reverse_lookup_for_every_kind() {
    let conn = open_db_in_memory().unwrap();
    let targets: Vec<(AssociationKind, Entity)> = AssociationKind::ALL
        .into_iter()
        .map(|kind| (kind, create_entity(&conn, kind.entity_kind(), "shared")))
        .collect();
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();
    let cube = service.create_object("cube").unwrap();

    for (kind, target) in &targets {
        service.add_association(cube.id, *kind, target.id).unwrap();
        service.add_association(ball.id, *kind, target.id).unwrap();

        let found = service.query_by_association(*kind, target.id).unwrap();
        assert_eq!(object_ids(&found), vec![ball.id, cube.id]);
        assert!(found
            .iter()
            .all(|record| record.is_associated(*kind, target.id)));
    }
}

#[test]
fn reverse_lookup_is_scoped_to_kind() {
    let conn = open_db_in_memory().unwrap();
    let verb = create_entity(&conn, EntityKind::Verb, "roll");
    let state = create_entity(&conn, EntityKind::State, "red");
    assert_eq!(verb.id, state.id);

    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();
    service
        .add_association(ball.id, AssociationKind::Verb, verb.id)
        .unwrap();

    assert_eq!(
        object_ids(
            &service
                .query_by_association(AssociationKind::Verb, verb.id)
                .unwrap()
        ),
        vec![ball.id]
    );
    assert!(service
        .query_by_association(AssociationKind::State, state.id)
        .unwrap()
        .is_empty());
}

#[test]
fn reverse_lookup_for_unlinked_or_missing_target_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let idle = create_entity(&conn, EntityKind::Routine, "idle");
    let service = object_service(&conn);
    service.create_object("ball").unwrap();

    assert!(service
        .query_by_association(AssociationKind::Routine, idle.id)
        .unwrap()
        .is_empty());
    assert!(service
        .query_by_association(AssociationKind::Routine, 999)
        .unwrap()
        .is_empty());
}

#[test]
fn add_with_missing_object_or_target_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let heavy = create_entity(&conn, EntityKind::Attribute, "heavy");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();

    match service
        .add_association(77, AssociationKind::Attribute, heavy.id)
        .unwrap_err()
    {
        ServiceError::NotFound { kind, .. } => assert_eq!(kind, EntityKind::Object),
        other => panic!("unexpected error: {other}"),
    }

    match service
        .add_association(ball.id, AssociationKind::Attribute, 88)
        .unwrap_err()
    {
        ServiceError::NotFound { kind, .. } => assert_eq!(kind, EntityKind::Attribute),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(link_rows(&conn), 0);
}

#[test]
fn remove_of_unlinked_target_is_not_associated() {
    let conn = open_db_in_memory().unwrap();
    let red = create_entity(&conn, EntityKind::State, "red");
    let blue = create_entity(&conn, EntityKind::State, "blue");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();
    service
        .add_association(ball.id, AssociationKind::State, red.id)
        .unwrap();

    let err = service
        .remove_association(ball.id, AssociationKind::State, blue.id)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotAssociated { .. }));

    let err = service
        .remove_association(ball.id, AssociationKind::State, 999)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    assert_eq!(ids(&service.get_object(ball.id).unwrap().states), vec![red.id]);
}

#[test]
fn remove_from_missing_object_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let red = create_entity(&conn, EntityKind::State, "red");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();
    service
        .add_association(ball.id, AssociationKind::State, red.id)
        .unwrap();

    match service
        .remove_association(404, AssociationKind::State, red.id)
        .unwrap_err()
    {
        ServiceError::NotFound { kind, key } => {
            assert_eq!(kind, EntityKind::Object);
            assert_eq!(key, LookupKey::Id(404));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(link_rows(&conn), 1);
    assert_eq!(ids(&service.get_object(ball.id).unwrap().states), vec![red.id]);
}

#[test]
fn invalid_tag_is_invalid_argument_and_never_mutates() {
    let conn = open_db_in_memory().unwrap();
    let red = create_entity(&conn, EntityKind::State, "red");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();
    service
        .add_association(ball.id, AssociationKind::State, red.id)
        .unwrap();

    let results = [
        service
            .add_association_tagged(ball.id, "colour", red.id)
            .map(|_| ()),
        service
            .remove_association_tagged(ball.id, "States", red.id)
            .map(|_| ()),
        service.query_by_association_tagged("", red.id).map(|_| ()),
    ];
    for result in results {
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    }

    assert_eq!(link_rows(&conn), 1);
    assert_eq!(ids(&service.get_object(ball.id).unwrap().states), vec![red.id]);
}

#[test]
fn tagged_operations_dispatch_to_matching_kind() {
    let conn = open_db_in_memory().unwrap();
    let fetch = create_entity(&conn, EntityKind::Routine, "fetch");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();

    let linked = service
        .add_association_tagged(ball.id, "routine", fetch.id)
        .unwrap();
    assert_eq!(ids(&linked.routines), vec![fetch.id]);
    assert_eq!(
        object_ids(&service.query_by_association_tagged("routine", fetch.id).unwrap()),
        vec![ball.id]
    );
}

#[test]
fn deleting_object_clears_links_but_keeps_entities() {
    let conn = open_db_in_memory().unwrap();
    let roll = create_entity(&conn, EntityKind::Verb, "roll");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();
    service
        .add_association(ball.id, AssociationKind::Verb, roll.id)
        .unwrap();

    service.delete_object(ball.id).unwrap();
    assert_eq!(link_rows(&conn), 0);

    let verbs = EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::Verb).unwrap());
    assert_eq!(verbs.get(roll.id).unwrap(), roll);
}

#[test]
fn deleting_target_entity_clears_it_from_every_object() {
    let conn = open_db_in_memory().unwrap();
    let red = create_entity(&conn, EntityKind::State, "red");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();
    let cube = service.create_object("cube").unwrap();
    service
        .add_association(ball.id, AssociationKind::State, red.id)
        .unwrap();
    service
        .add_association(cube.id, AssociationKind::State, red.id)
        .unwrap();

    let states =
        EntityService::new(SqliteEntityRepository::try_new(&conn, EntityKind::State).unwrap());
    states.delete(red.id).unwrap();

    assert!(service.get_object(ball.id).unwrap().states.is_empty());
    assert!(service.get_object(cube.id).unwrap().states.is_empty());
    assert_eq!(link_rows(&conn), 0);
}

#[test]
fn rename_object_keeps_associations_and_detects_conflicts() {
    let conn = open_db_in_memory().unwrap();
    let heavy = create_entity(&conn, EntityKind::Attribute, "heavy");
    let service = object_service(&conn);
    let ball = service.create_object("ball").unwrap();
    service.create_object("cube").unwrap();
    service
        .add_association(ball.id, AssociationKind::Attribute, heavy.id)
        .unwrap();

    let renamed = service.rename_object(ball.id, "sphere").unwrap();
    assert_eq!(renamed.name, "sphere");
    assert_eq!(ids(&renamed.attributes), vec![heavy.id]);

    let err = service.rename_object(ball.id, "cube").unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { .. }));
    assert!(matches!(
        service.rename_object(404, "x").unwrap_err(),
        ServiceError::NotFound { .. }
    ));
}

#[test]
fn list_objects_includes_association_sets() {
    let conn = open_db_in_memory().unwrap();
    let open = create_entity(&conn, EntityKind::Verb, "open");
    let close = create_entity(&conn, EntityKind::Verb, "close");
    let service = object_service(&conn);
    let door = service.create_object("door").unwrap();
    service.create_object("window").unwrap();
    service
        .add_association(door.id, AssociationKind::Verb, close.id)
        .unwrap();
    service
        .add_association(door.id, AssociationKind::Verb, open.id)
        .unwrap();

    let listed = service.list_objects().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].name, "door");
    assert_eq!(ids(&listed[0].verbs), vec![open.id, close.id]);
    assert!(listed[1].verbs.is_empty());
}

#[test]
fn duplicate_object_name_is_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = object_service(&conn);
    service.create_object("ball").unwrap();

    assert!(matches!(
        service.create_object("ball").unwrap_err(),
        ServiceError::Conflict { .. }
    ));
    assert_eq!(service.list_objects().unwrap().len(), 1);
}
