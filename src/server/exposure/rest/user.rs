//! Read-only views of the user dashboard

use super::records::{list_page, present};
use crate::config::collections::{SAMPLE_PAPERS, USERS};
use crate::core::auth::AuthContext;
use crate::core::error::{PortalError, PortalResult};
use crate::core::query::{ListQuery, PaginatedResponse};
use crate::core::record::Record;
use crate::server::host::ServerHost;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde_json::Value;
use std::sync::Arc;

/// Whether a signed-in user may see a record
fn published(collection: &str, record: &Record) -> bool {
    collection != SAMPLE_PAPERS || record.text("status") == "published"
}

/// GET /dashboard/{collection}
pub async fn list_visible(
    State(host): State<Arc<ServerHost>>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> PortalResult<Json<PaginatedResponse<Value>>> {
    let config = host
        .collection(&collection)
        .ok()
        .filter(|config| config.user_visible)
        .ok_or_else(|| PortalError::UnknownCollection(collection.clone()))?;

    Ok(Json(list_page(&host, config, &collection, &query, |record| {
        published(&collection, record)
    })))
}

/// GET /dashboard/profile
pub async fn profile(
    State(host): State<Arc<ServerHost>>,
    Extension(context): Extension<AuthContext>,
) -> PortalResult<Json<Value>> {
    let user_id = context
        .user_id()
        .ok_or_else(|| PortalError::Internal("guarded route without a session".to_string()))?;

    let profile = host
        .profile(&user_id)
        .await?
        .ok_or_else(|| PortalError::not_found(USERS, user_id))?;
    Ok(Json(present(USERS, &profile)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_only_published_sample_papers_visible() {
        let draft = Record::new(json!({"status": "draft"}).as_object().cloned().unwrap());
        let live = Record::new(json!({"status": "published"}).as_object().cloned().unwrap());

        assert!(!published(SAMPLE_PAPERS, &draft));
        assert!(published(SAMPLE_PAPERS, &live));
        assert!(published("exams", &draft));
    }
}
