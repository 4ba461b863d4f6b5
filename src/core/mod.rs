//! Core module containing the domain types and collaborator contracts

pub mod auth;
pub mod blob;
pub mod error;
pub mod events;
pub mod feed;
pub mod field;
pub mod query;
pub mod record;
pub mod schedule;
pub mod store;
pub mod validation;
pub mod view;

pub use auth::{AuthContext, AuthError, GuardDecision, IdentityProvider, Role, RouteGuard, Session};
pub use blob::{BlobStore, UploadProgress, UploadTask};
pub use error::{PortalError, PortalResult};
pub use events::{EventBus, EventEnvelope, RecordEvent};
pub use feed::{FeedHub, Snapshot, Subscription};
pub use field::FieldFormat;
pub use query::{ListQuery, PaginatedResponse, PaginationMeta};
pub use record::{Fields, Record};
pub use store::RecordStore;
pub use validation::ModalMode;
pub use view::{FlagFilter, ListFields, SortKey, ViewState};
