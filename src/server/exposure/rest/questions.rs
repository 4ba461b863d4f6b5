//! Questions of a question paper
//!
//! Questions are stored per paper under `papers/{paper_id}/questions` and
//! share the `questions` list configuration.

use super::records::{delete_failure, fetch, list_page, present, save_failure};
use crate::config::collections::{self, PAPERS, QUESTIONS};
use crate::core::error::{PortalError, PortalResult};
use crate::core::query::{ListQuery, PaginatedResponse};
use crate::core::validation::{ModalMode, QuestionForm, parse_form};
use crate::server::host::ServerHost;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// Storage path of a paper's questions, failing if the paper does not exist
async fn paper_questions(host: &ServerHost, paper_id: Uuid) -> PortalResult<String> {
    fetch(host, PAPERS, paper_id).await?;
    Ok(collections::questions_of(&paper_id))
}

/// GET /api/papers/{paper_id}/questions
pub async fn list_questions(
    State(host): State<Arc<ServerHost>>,
    Path(paper_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> PortalResult<Json<PaginatedResponse<Value>>> {
    let path = paper_questions(&host, paper_id).await?;
    let config = host.collection(QUESTIONS)?;
    Ok(Json(list_page(&host, config, &path, &query, |_| true)))
}

/// POST /api/papers/{paper_id}/questions
pub async fn create_question(
    State(host): State<Arc<ServerHost>>,
    Path(paper_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> PortalResult<(StatusCode, Json<Value>)> {
    let path = paper_questions(&host, paper_id).await?;
    let fields = parse_form::<QuestionForm>(body, ModalMode::Create)?;

    let record = host
        .store
        .create(&path, fields)
        .await
        .map_err(|e| PortalError::storage(&save_failure(QUESTIONS), e))?;

    tracing::info!(paper_id = %paper_id, record_id = %record.id, "Question created");
    Ok((StatusCode::CREATED, Json(present(QUESTIONS, &record))))
}

/// GET /api/papers/{paper_id}/questions/{id}
pub async fn get_question(
    State(host): State<Arc<ServerHost>>,
    Path((paper_id, id)): Path<(Uuid, Uuid)>,
) -> PortalResult<Json<Value>> {
    let path = paper_questions(&host, paper_id).await?;
    let record = fetch(&host, &path, id).await?;
    Ok(Json(present(QUESTIONS, &record)))
}

/// PUT /api/papers/{paper_id}/questions/{id}
pub async fn update_question(
    State(host): State<Arc<ServerHost>>,
    Path((paper_id, id)): Path<(Uuid, Uuid)>,
    Json(body): Json<Value>,
) -> PortalResult<Json<Value>> {
    let path = paper_questions(&host, paper_id).await?;
    fetch(&host, &path, id).await?;
    let fields = parse_form::<QuestionForm>(body, ModalMode::Edit)?;

    let record = host
        .store
        .update(&path, &id, fields)
        .await
        .map_err(|e| PortalError::storage(&save_failure(QUESTIONS), e))?;

    tracing::info!(paper_id = %paper_id, record_id = %id, "Question updated");
    Ok(Json(present(QUESTIONS, &record)))
}

/// DELETE /api/papers/{paper_id}/questions/{id}
pub async fn delete_question(
    State(host): State<Arc<ServerHost>>,
    Path((paper_id, id)): Path<(Uuid, Uuid)>,
) -> PortalResult<StatusCode> {
    let path = paper_questions(&host, paper_id).await?;

    host.store
        .delete(&path, &id)
        .await
        .map_err(|e| PortalError::storage(&delete_failure(QUESTIONS), e))?;

    tracing::info!(paper_id = %paper_id, record_id = %id, "Question deleted");
    Ok(StatusCode::NO_CONTENT)
}
