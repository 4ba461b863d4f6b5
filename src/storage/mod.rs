//! In-memory collaborators: record store, blob store and identity provider

pub mod blob;
pub mod identity;
pub mod in_memory;

pub use blob::InMemoryBlobStore;
pub use identity::InMemoryIdentityProvider;
pub use in_memory::InMemoryRecordStore;
