//! Admin dashboard summary

use super::records::present;
use crate::config::collections::{IMPORTANT_DATES, QUESTIONS, USERS};
use crate::core::error::{PortalError, PortalResult};
use crate::core::field;
use crate::core::schedule::{WindowStatus, window_status};
use crate::server::host::ServerHost;
use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Important dates shown on the dashboard
const UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Serialize)]
pub struct CollectionCount {
    pub collection: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub counts: Vec<CollectionCount>,
    pub users: usize,
    /// Upcoming and ongoing important dates, soonest first
    pub upcoming: Vec<Value>,
}

/// GET /api/dashboard
pub async fn summary(State(host): State<Arc<ServerHost>>) -> PortalResult<Json<DashboardSummary>> {
    let mut counts = Vec::new();
    for config in &host.config.collections {
        if config.name == QUESTIONS {
            continue;
        }
        let snapshot = host.store.subscribe(&config.name, &config.order_field).current();
        counts.push(CollectionCount {
            collection: config.name.clone(),
            label: config.display_name().to_string(),
            count: snapshot.len(),
        });
    }

    let users = host
        .store
        .list(USERS)
        .await
        .map_err(|e| PortalError::storage("Failed to load dashboard.", e))?
        .len();

    let now = Utc::now();
    let mut dates = host
        .store
        .list(IMPORTANT_DATES)
        .await
        .map_err(|e| PortalError::storage("Failed to load dashboard.", e))?;
    dates.retain(|record| {
        matches!(
            window_status(record.get("startDate"), record.get("endDate"), now),
            Some(WindowStatus::Upcoming | WindowStatus::Ongoing)
        )
    });
    dates.sort_by_key(|record| field::epoch_millis(record.get("startDate")));

    let upcoming = dates
        .iter()
        .take(UPCOMING_LIMIT)
        .map(|record| present(IMPORTANT_DATES, record))
        .collect();

    Ok(Json(DashboardSummary {
        counts,
        users,
        upcoming,
    }))
}
