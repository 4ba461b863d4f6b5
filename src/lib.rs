//! # Exam Portal
//!
//! Admin console and user dashboard API of an exam-preparation portal.
//!
//! ## Features
//!
//! - **Live List Views**: every admin list is a filtered, sorted and paginated
//!   view over the latest snapshot of its collection, pushed over WebSocket
//! - **One Engine**: a single list view engine parameterised by the fields a
//!   collection searches and sorts on
//! - **Validated Forms**: typed create/edit forms per collection, checked
//!   before anything is written
//! - **Route Guards**: explicit per-request auth context with admin and user
//!   route classes
//! - **Configuration-Based**: collections, page sizes and seeded admins via YAML
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use exam_portal::prelude::*;
//!
//! let config = PortalConfig::from_yaml_file("portal.yaml")?;
//!
//! ServerBuilder::new()
//!     .with_config(config)
//!     .in_memory()
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```
//!
//! The engine can also be used on its own:
//!
//! ```rust,ignore
//! let exams = config.collection("exams").unwrap();
//! let mut view = ViewState::new(10);
//! view.set_filter("physics");
//! let page = view.render(&snapshot, &exams.list_fields());
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthContext, GuardDecision, IdentityProvider, Role, RouteGuard, Session},
        blob::{BlobStore, UploadProgress, UploadTask},
        error::{PortalError, PortalResult},
        events::{EventBus, RecordEvent},
        feed::{FeedHub, Snapshot, Subscription},
        query::{ListQuery, PaginatedResponse, PaginationMeta},
        record::{Fields, Record},
        store::RecordStore,
        validation::ModalMode,
        view::{FlagFilter, ListFields, SortKey, ViewState},
    };

    // === Storage ===
    pub use crate::storage::{InMemoryBlobStore, InMemoryIdentityProvider, InMemoryRecordStore};

    // === Config ===
    pub use crate::config::{CollectionConfig, PaginationConfig, PortalConfig};

    // === Server ===
    pub use crate::server::{RestExposure, ServerBuilder, ServerHost, WebSocketExposure};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
