//! HTTP routes for objects and their satellite collections.
//!
//! # Responsibility
//! - Map the REST surface onto core services.
//! - Keep request bodies and response shapes stable.
//!
//! # Invariants
//! - Handlers never touch SQLite directly; all store work goes through
//!   `AppState::run`.
//! - Verbs, attributes, states and routines share one handler set,
//!   parameterized by `EntityKind`.
//! - Malformed paths and bodies are answered with the same `{"error": ...}`
//!   envelope as service failures.

use crate::error::ApiError;
use crate::session::AppState;
use assocdb_core::{
    table_schema, Entity, EntityId, EntityKind, EntityService, ObjectRecord, ObjectService,
    ServiceResult, SqliteEntityRepository, SqliteObjectRepository,
};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Collections served with the plain entity handler set.
const LEAF_KINDS: [EntityKind; 4] = [
    EntityKind::Verb,
    EntityKind::Attribute,
    EntityKind::State,
    EntityKind::Routine,
];

/// Body of create/update requests.
#[derive(Debug, Deserialize)]
pub struct NameRequest {
    #[serde(default)]
    pub name: Option<String>,
}

/// Body of add/remove/query association requests.
#[derive(Debug, Deserialize)]
pub struct AssociationRequest {
    /// One of `verb|attribute|state|routine`.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub id: EntityId,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Clone)]
struct CollectionState {
    app: AppState,
    kind: EntityKind,
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .nest("/objects", object_routes(state.clone()));
    for kind in LEAF_KINDS {
        app = app.nest(
            &format!("/{}", kind.table()),
            entity_routes(state.clone(), kind),
        );
    }
    app
}

fn object_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_objects).post(create_object))
        .route("/schema", get(object_schema))
        .route("/query_by_association", post(query_by_association))
        .route(
            "/:id",
            get(get_object).put(rename_object).delete(delete_object),
        )
        .route("/:id/add_association", post(add_association))
        .route("/:id/remove_association", post(remove_association))
        .with_state(state)
}

fn entity_routes(app: AppState, kind: EntityKind) -> Router {
    Router::new()
        .route("/", get(list_entities).post(create_entity))
        .route("/schema", get(entity_schema))
        .route(
            "/:id",
            get(get_entity).put(rename_entity).delete(delete_entity),
        )
        .with_state(CollectionState { app, kind })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": assocdb_core::core_version() }))
}

fn objects(conn: &Connection) -> ServiceResult<ObjectService<SqliteObjectRepository<'_>>> {
    Ok(ObjectService::new(SqliteObjectRepository::try_new(conn)?))
}

fn entities(
    conn: &Connection,
    kind: EntityKind,
) -> ServiceResult<EntityService<SqliteEntityRepository<'_>>> {
    Ok(EntityService::new(SqliteEntityRepository::try_new(
        conn, kind,
    )?))
}

fn required_name(body: Result<Json<NameRequest>, JsonRejection>) -> Result<String, ApiError> {
    let Json(body) = body?;
    body.name
        .ok_or_else(|| ApiError::bad_request("name is required"))
}

fn deleted_message(kind: EntityKind) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("{} deleted", kind.label()),
    })
}

async fn list_objects(State(state): State<AppState>) -> Result<Json<Vec<ObjectRecord>>, ApiError> {
    let listed = state
        .run("objects.list", |conn| objects(conn)?.list_objects())
        .await?;
    Ok(Json(listed))
}

/// `GET /objects/{id}` for integer keys, lookup by name otherwise.
async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ObjectRecord>, ApiError> {
    let record = state
        .run("objects.get", move |conn| {
            let service = objects(conn)?;
            match key.parse::<EntityId>() {
                Ok(id) => service.get_object(id),
                Err(_) => service.get_object_by_name(&key),
            }
        })
        .await?;
    Ok(Json(record))
}

async fn create_object(
    State(state): State<AppState>,
    body: Result<Json<NameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ObjectRecord>), ApiError> {
    let name = required_name(body)?;
    let created = state
        .run("objects.create", move |conn| objects(conn)?.create_object(&name))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn rename_object(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
    body: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<ObjectRecord>, ApiError> {
    let Path(id) = id?;
    let name = required_name(body)?;
    let renamed = state
        .run("objects.update", move |conn| {
            objects(conn)?.rename_object(id, &name)
        })
        .await?;
    Ok(Json(renamed))
}

async fn delete_object(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;
    state
        .run("objects.delete", move |conn| objects(conn)?.delete_object(id))
        .await?;
    Ok(deleted_message(EntityKind::Object))
}

async fn object_schema(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let schema = state
        .run("objects.schema", |conn| {
            Ok(table_schema(conn, EntityKind::Object)?)
        })
        .await?;
    Ok(Json(schema))
}

async fn add_association(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
    body: Result<Json<AssociationRequest>, JsonRejection>,
) -> Result<Json<ObjectRecord>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let tag = body.kind.unwrap_or_default();
    let target_id = body.id;
    let record = state
        .run("objects.add_association", move |conn| {
            objects(conn)?.add_association_tagged(id, &tag, target_id)
        })
        .await?;
    Ok(Json(record))
}

async fn remove_association(
    State(state): State<AppState>,
    id: Result<Path<EntityId>, PathRejection>,
    body: Result<Json<AssociationRequest>, JsonRejection>,
) -> Result<Json<ObjectRecord>, ApiError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let tag = body.kind.unwrap_or_default();
    let target_id = body.id;
    let record = state
        .run("objects.remove_association", move |conn| {
            objects(conn)?.remove_association_tagged(id, &tag, target_id)
        })
        .await?;
    Ok(Json(record))
}

async fn query_by_association(
    State(state): State<AppState>,
    body: Result<Json<AssociationRequest>, JsonRejection>,
) -> Result<Json<Vec<ObjectRecord>>, ApiError> {
    let Json(body) = body?;
    let tag = body.kind.unwrap_or_default();
    let target_id = body.id;
    let found = state
        .run("objects.query_by_association", move |conn| {
            objects(conn)?.query_by_association_tagged(&tag, target_id)
        })
        .await?;
    Ok(Json(found))
}

async fn list_entities(
    State(collection): State<CollectionState>,
) -> Result<Json<Vec<Entity>>, ApiError> {
    let kind = collection.kind;
    let listed = collection
        .app
        .run("entities.list", move |conn| entities(conn, kind)?.list())
        .await?;
    Ok(Json(listed))
}

async fn get_entity(
    State(collection): State<CollectionState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<Entity>, ApiError> {
    let Path(id) = id?;
    let kind = collection.kind;
    let entity = collection
        .app
        .run("entities.get", move |conn| entities(conn, kind)?.get(id))
        .await?;
    Ok(Json(entity))
}

async fn create_entity(
    State(collection): State<CollectionState>,
    body: Result<Json<NameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Entity>), ApiError> {
    let kind = collection.kind;
    let name = required_name(body)?;
    let created = collection
        .app
        .run("entities.create", move |conn| {
            entities(conn, kind)?.create(&name)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn rename_entity(
    State(collection): State<CollectionState>,
    id: Result<Path<EntityId>, PathRejection>,
    body: Result<Json<NameRequest>, JsonRejection>,
) -> Result<Json<Entity>, ApiError> {
    let Path(id) = id?;
    let kind = collection.kind;
    let name = required_name(body)?;
    let renamed = collection
        .app
        .run("entities.update", move |conn| {
            entities(conn, kind)?.rename(id, &name)
        })
        .await?;
    Ok(Json(renamed))
}

async fn delete_entity(
    State(collection): State<CollectionState>,
    id: Result<Path<EntityId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;
    let kind = collection.kind;
    collection
        .app
        .run("entities.delete", move |conn| entities(conn, kind)?.delete(id))
        .await?;
    Ok(deleted_message(kind))
}

async fn entity_schema(
    State(collection): State<CollectionState>,
) -> Result<Json<BTreeMap<String, String>>, ApiError> {
    let kind = collection.kind;
    let schema = collection
        .app
        .run("entities.schema", move |conn| Ok(table_schema(conn, kind)?))
        .await?;
    Ok(Json(schema))
}
