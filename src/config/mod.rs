//! Configuration loading and management
//!
//! The portal is configured from a YAML file:
//!
//! ```yaml
//! server:
//!   host: 0.0.0.0
//!   port: 3000
//!   max_upload_bytes: 52428800
//! pagination:
//!   default_page_size: 10
//!   allowed_page_sizes: [10, 25, 30]
//! collections:
//!   - name: exams
//!     search_fields: [title, description]
//!     title_field: title
//!     date_field: examDate
//!     sort_keys: [newest, oldest, dateAsc, dateDesc, titleAsc, titleDesc]
//! admins:
//!   - email: admin@example.com
//!     password: change-me
//! ```
//!
//! Every section is optional; [`PortalConfig::default_config`] describes the
//! collections of the exam portal.

use crate::core::view::{ListFields, SortKey};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Collection names used by the portal
pub mod collections {
    pub const EXAMS: &str = "exams";
    pub const NOTES: &str = "notes";
    pub const IMPORTANT_DATES: &str = "importantDates";
    pub const PAPERS: &str = "papers";
    pub const OLD_PAPERS: &str = "oldPapers";
    /// Per-paper question sub-collection, stored as `papers/{id}/questions`
    pub const QUESTIONS: &str = "questions";
    pub const BANNERS: &str = "banners";
    pub const SAMPLE_PAPERS: &str = "samplePapers";
    pub const USERS: &str = "users";

    /// Store path of a paper's question sub-collection
    pub fn questions_of(paper_id: &uuid::Uuid) -> String {
        format!("{}/{}/{}", PAPERS, paper_id, QUESTIONS)
    }
}

/// Complete configuration of the portal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub feed: FeedConfig,

    /// Collections served by the portal; defaults to the built-in set
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionConfig>,

    /// Admin accounts created at startup
    #[serde(default)]
    pub admins: Vec<SeedAdmin>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted file note upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    /// Address to bind, `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Page size settings shared by every list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    #[serde(default = "default_allowed_page_sizes")]
    pub allowed_page_sizes: Vec<usize>,
}

fn default_page_size() -> usize {
    10
}

fn default_allowed_page_sizes() -> Vec<usize> {
    vec![10, 25, 30]
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            allowed_page_sizes: default_allowed_page_sizes(),
        }
    }
}

impl PaginationConfig {
    /// Requested page size if allowed, the default otherwise
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(size) if self.allowed_page_sizes.contains(&size) => size,
            _ => self.default_page_size,
        }
    }

    pub fn is_allowed(&self, size: usize) -> bool {
        self.allowed_page_sizes.contains(&size)
    }
}

/// Event bus settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Events buffered for a lagging event bus subscriber
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
        }
    }
}

/// How one collection is listed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,

    /// Human-readable name used in dashboard counts
    #[serde(default)]
    pub label: Option<String>,

    /// Fields searched by the free-text filter
    #[serde(default)]
    pub search_fields: Vec<String>,

    /// Field compared by the title sort keys
    #[serde(default)]
    pub title_field: Option<String>,

    /// Field compared by the date sort keys
    #[serde(default)]
    pub date_field: Option<String>,

    /// Boolean field used by the active/inactive filter
    #[serde(default)]
    pub flag_field: Option<String>,

    /// Field the feed orders snapshots by (descending)
    #[serde(default = "default_order_field")]
    pub order_field: String,

    /// Sort keys offered for this collection
    #[serde(default = "default_sort_keys")]
    pub sort_keys: Vec<SortKey>,

    /// Whether signed-in users can read this collection from their dashboard
    #[serde(default)]
    pub user_visible: bool,
}

fn default_order_field() -> String {
    crate::core::record::CREATED_AT.to_string()
}

fn default_sort_keys() -> Vec<SortKey> {
    vec![SortKey::Newest, SortKey::Oldest]
}

impl CollectionConfig {
    /// Collection with the default settings and the given search fields
    pub fn new(name: &str, search_fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: None,
            search_fields: search_fields.iter().map(|s| s.to_string()).collect(),
            title_field: None,
            date_field: None,
            flag_field: None,
            order_field: default_order_field(),
            sort_keys: default_sort_keys(),
            user_visible: false,
        }
    }

    fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    fn title(mut self, field: &str) -> Self {
        self.title_field = Some(field.to_string());
        self
    }

    fn date(mut self, field: &str) -> Self {
        self.date_field = Some(field.to_string());
        self
    }

    fn flag(mut self, field: &str) -> Self {
        self.flag_field = Some(field.to_string());
        self
    }

    fn sorts(mut self, keys: &[SortKey]) -> Self {
        self.sort_keys = keys.to_vec();
        self
    }

    fn visible(mut self) -> Self {
        self.user_visible = true;
        self
    }

    /// Fields the list view engine searches and sorts on
    pub fn list_fields(&self) -> ListFields {
        ListFields {
            search: self.search_fields.clone(),
            title: self.title_field.clone(),
            date: self.date_field.clone(),
            flag: self.flag_field.clone(),
        }
    }

    /// The sort key to use when `requested` is asked for
    ///
    /// Keys the collection does not offer fall back to its first key.
    pub fn offered_sort(&self, requested: SortKey) -> SortKey {
        if self.sort_keys.contains(&requested) {
            requested
        } else {
            self.sort_keys.first().copied().unwrap_or_default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

/// Admin account seeded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_collections() -> Vec<CollectionConfig> {
    use collections::*;

    vec![
        CollectionConfig::new(EXAMS, &["title", "description"])
            .label("Exams")
            .title("title")
            .date("examDate")
            .sorts(&SortKey::ALL)
            .visible(),
        CollectionConfig::new(NOTES, &["title", "fileName", "url"])
            .label("Notes")
            .title("title")
            .visible(),
        CollectionConfig::new(IMPORTANT_DATES, &["title", "eligibility"])
            .label("Important Dates")
            .title("title")
            .date("startDate")
            .visible(),
        CollectionConfig::new(PAPERS, &["title", "description"])
            .label("Papers")
            .title("title")
            .visible(),
        CollectionConfig::new(OLD_PAPERS, &["question", "explanation"])
            .label("Old Paper Questions")
            .title("question"),
        CollectionConfig::new(QUESTIONS, &["question", "explanation"])
            .label("Paper Questions")
            .title("question"),
        CollectionConfig::new(BANNERS, &["title", "description"])
            .label("Banners")
            .title("title")
            .flag("isActive")
            .sorts(&[SortKey::Newest, SortKey::Oldest, SortKey::TitleAsc]),
        CollectionConfig::new(SAMPLE_PAPERS, &["title", "subject"])
            .label("Sample Papers")
            .title("title")
            .sorts(&[
                SortKey::Newest,
                SortKey::Oldest,
                SortKey::TitleAsc,
                SortKey::TitleDesc,
            ])
            .visible(),
    ]
}

impl PortalConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in configuration of the exam portal
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            pagination: PaginationConfig::default(),
            feed: FeedConfig::default(),
            collections: default_collections(),
            admins: Vec::new(),
        }
    }

    /// Find a collection by name
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.server.max_upload_bytes == 0 {
            bail!("server.max_upload_bytes must be greater than 0");
        }

        let pagination = &self.pagination;
        if pagination.allowed_page_sizes.is_empty() {
            bail!("pagination.allowed_page_sizes must not be empty");
        }
        if pagination.allowed_page_sizes.contains(&0) {
            bail!("pagination.allowed_page_sizes must not contain 0");
        }
        if !pagination.is_allowed(pagination.default_page_size) {
            bail!(
                "pagination.default_page_size {} is not one of {:?}",
                pagination.default_page_size,
                pagination.allowed_page_sizes
            );
        }

        let mut seen = HashSet::new();
        for collection in &self.collections {
            if !seen.insert(collection.name.as_str()) {
                bail!("collection '{}' is configured twice", collection.name);
            }
            if collection.sort_keys.is_empty() {
                bail!("collection '{}' offers no sort keys", collection.name);
            }
        }

        for admin in &self.admins {
            if admin.password.chars().count() < crate::core::auth::MIN_PASSWORD_LEN {
                bail!("admin '{}' has a password shorter than 6 characters", admin.email);
            }
        }
        Ok(())
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PortalConfig::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.collections.len(), 8);
        assert_eq!(config.pagination.default_page_size, 10);
        assert_eq!(config.server.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_exams_offer_every_sort() {
        let config = PortalConfig::default_config();
        let exams = config.collection("exams").unwrap();
        assert_eq!(exams.sort_keys.len(), 6);
        assert_eq!(exams.offered_sort(SortKey::DateDesc), SortKey::DateDesc);

        let fields = exams.list_fields();
        assert_eq!(fields.date.as_deref(), Some("examDate"));
        assert_eq!(fields.search, vec!["title", "description"]);
    }

    #[test]
    fn test_offered_sort_fallback() {
        let config = PortalConfig::default_config();
        let notes = config.collection("notes").unwrap();
        assert_eq!(notes.offered_sort(SortKey::TitleAsc), SortKey::Newest);
        assert_eq!(notes.offered_sort(SortKey::Oldest), SortKey::Oldest);
    }

    #[test]
    fn test_resolve_page_size() {
        let pagination = PaginationConfig::default();
        assert_eq!(pagination.resolve(Some(25)), 25);
        assert_eq!(pagination.resolve(Some(7)), 10);
        assert_eq!(pagination.resolve(None), 10);
    }

    #[test]
    fn test_yaml_sections_optional() {
        let config = PortalConfig::from_yaml_str("server:\n  port: 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.collections.len(), 8);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = PortalConfig::default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed = PortalConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.collections.len(), config.collections.len());
        assert_eq!(
            parsed.collection("banners").unwrap().flag_field.as_deref(),
            Some("isActive")
        );
    }

    #[test]
    fn test_invalid_default_page_size() {
        let yaml = "pagination:\n  default_page_size: 15\n";
        let err = PortalConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("default_page_size"));
    }

    #[test]
    fn test_duplicate_collection() {
        let yaml = "collections:\n  - name: exams\n  - name: exams\n";
        assert!(PortalConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_weak_admin_password() {
        let yaml = "admins:\n  - email: admin@example.com\n    password: abc\n";
        assert!(PortalConfig::from_yaml_str(yaml).is_err());
    }
}
