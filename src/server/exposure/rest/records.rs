//! Generic collection handlers for the admin console
//!
//! List, create, read, update and delete for every collection that is edited
//! through a plain form modal. Lists are read from the live feed and run
//! through the list view engine, so a REST page and a live view page over the
//! same snapshot are identical.

use crate::config::{CollectionConfig, collections};
use crate::core::error::{PortalError, PortalResult};
use crate::core::query::{ListQuery, PaginatedResponse};
use crate::core::record::Record;
use crate::core::schedule::display_fields;
use crate::core::validation::{ModalMode, validate_payload};
use crate::server::host::ServerHost;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Configuration of a collection editable through the generic routes
///
/// Paper questions live under their paper and profiles belong to the auth
/// routes; neither is reachable here.
pub fn admin_collection<'a>(host: &'a ServerHost, name: &str) -> PortalResult<&'a CollectionConfig> {
    if name == collections::QUESTIONS || name == collections::USERS {
        return Err(PortalError::UnknownCollection(name.to_string()));
    }
    host.collection(name)
}

/// Singular noun used in user-facing failure messages
pub fn noun(collection: &str) -> &str {
    match collection {
        collections::EXAMS => "exam",
        collections::NOTES => "note",
        collections::IMPORTANT_DATES => "important date",
        collections::PAPERS => "paper",
        collections::OLD_PAPERS | collections::QUESTIONS => "question",
        collections::BANNERS => "banner",
        collections::SAMPLE_PAPERS => "sample paper",
        other => other,
    }
}

pub fn save_failure(collection: &str) -> String {
    format!("Failed to save {}.", noun(collection))
}

pub fn delete_failure(collection: &str) -> String {
    format!("Failed to delete {}", noun(collection))
}

/// Record as sent to clients, with derived date labels
pub fn present(collection: &str, record: &Record) -> Value {
    let mut value = record.to_json();
    if let Value::Object(map) = &mut value {
        map.extend(display_fields(collection, record, Utc::now()));
    }
    value
}

/// Render one page of a collection from its current snapshot
///
/// `path` is where the records are stored (paper questions are stored per
/// paper); `keep` drops records the caller may not see before the engine runs.
pub fn list_page(
    host: &ServerHost,
    config: &CollectionConfig,
    path: &str,
    query: &ListQuery,
    keep: impl Fn(&Record) -> bool,
) -> PaginatedResponse<Value> {
    let snapshot = host.store.subscribe(path, &config.order_field).current();
    let visible: Vec<Record> = snapshot.iter().filter(|r| keep(r)).cloned().collect();

    let state = query.view_state(&host.config.pagination, config);
    let page = state.view(&visible, &config.list_fields());

    tracing::debug!(
        collection = %path,
        total = page.pagination.total,
        page = page.pagination.page,
        "List rendered"
    );

    PaginatedResponse {
        data: page
            .data
            .iter()
            .map(|record| present(&config.name, record))
            .collect(),
        pagination: page.pagination,
    }
}

/// Load a record or fail with not found
pub async fn fetch(host: &ServerHost, collection: &str, id: Uuid) -> PortalResult<Record> {
    host.store
        .get(collection, &id)
        .await
        .map_err(|e| PortalError::storage("Failed to load record.", e))?
        .ok_or_else(|| PortalError::not_found(collection, id))
}

/// GET /api/{collection}
pub async fn list_records(
    State(host): State<Arc<ServerHost>>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> PortalResult<Json<PaginatedResponse<Value>>> {
    let config = admin_collection(&host, &collection)?;
    Ok(Json(list_page(&host, config, &collection, &query, |_| true)))
}

/// POST /api/{collection}
pub async fn create_record(
    State(host): State<Arc<ServerHost>>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> PortalResult<(StatusCode, Json<Value>)> {
    admin_collection(&host, &collection)?;
    let fields = validate_payload(&collection, ModalMode::Create, body)?;

    let record = host
        .store
        .create(&collection, fields)
        .await
        .map_err(|e| PortalError::storage(&save_failure(&collection), e))?;

    tracing::info!(collection = %collection, record_id = %record.id, "Record created");
    Ok((StatusCode::CREATED, Json(present(&collection, &record))))
}

/// GET /api/{collection}/{id}
pub async fn get_record(
    State(host): State<Arc<ServerHost>>,
    Path((collection, id)): Path<(String, Uuid)>,
) -> PortalResult<Json<Value>> {
    admin_collection(&host, &collection)?;
    let record = fetch(&host, &collection, id).await?;
    Ok(Json(present(&collection, &record)))
}

/// PUT /api/{collection}/{id}
pub async fn update_record(
    State(host): State<Arc<ServerHost>>,
    Path((collection, id)): Path<(String, Uuid)>,
    Json(body): Json<Value>,
) -> PortalResult<Json<Value>> {
    admin_collection(&host, &collection)?;
    fetch(&host, &collection, id).await?;
    let fields = validate_payload(&collection, ModalMode::Edit, body)?;

    let record = host
        .store
        .update(&collection, &id, fields)
        .await
        .map_err(|e| PortalError::storage(&save_failure(&collection), e))?;

    tracing::info!(collection = %collection, record_id = %id, "Record updated");
    Ok(Json(present(&collection, &record)))
}

/// DELETE /api/{collection}/{id}
///
/// Deleting a paper also deletes its questions.
pub async fn delete_record(
    State(host): State<Arc<ServerHost>>,
    Path((collection, id)): Path<(String, Uuid)>,
) -> PortalResult<StatusCode> {
    admin_collection(&host, &collection)?;

    if collection == collections::PAPERS {
        let questions = collections::questions_of(&id);
        let removed = host
            .store
            .drop_collection(&questions)
            .await
            .map_err(|e| PortalError::storage(&delete_failure(&collection), e))?;
        tracing::debug!(paper_id = %id, questions = removed, "Paper questions deleted");
    }

    host.store
        .delete(&collection, &id)
        .await
        .map_err(|e| PortalError::storage(&delete_failure(&collection), e))?;

    tracing::info!(collection = %collection, record_id = %id, "Record deleted");
    Ok(StatusCode::NO_CONTENT)
}
