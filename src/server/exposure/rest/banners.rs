//! Banner activation toggle

use super::records::{fetch, present, save_failure};
use crate::config::collections::BANNERS;
use crate::core::error::{PortalError, PortalResult};
use crate::core::record::Fields;
use crate::server::host::ServerHost;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// POST /api/banners/{id}/toggle
pub async fn toggle_banner(
    State(host): State<Arc<ServerHost>>,
    Path(id): Path<Uuid>,
) -> PortalResult<Json<Value>> {
    let banner = fetch(&host, BANNERS, id).await?;
    let active = !banner.flag("isActive");

    let mut fields = Fields::new();
    fields.insert("isActive".to_string(), json!(active));
    let record = host
        .store
        .update(BANNERS, &id, fields)
        .await
        .map_err(|e| PortalError::storage(&save_failure(BANNERS), e))?;

    tracing::info!(record_id = %id, active, "Banner toggled");
    Ok(Json(present(BANNERS, &record)))
}
