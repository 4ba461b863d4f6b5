//! Integration tests for YAML configuration loading

use exam_portal::prelude::*;
use std::io::Write;

#[test]
fn test_empty_yaml_uses_defaults() {
    let config = PortalConfig::from_yaml_str("{}").unwrap();

    assert_eq!(config.server.address(), "127.0.0.1:3000");
    assert_eq!(config.server.max_upload_bytes, 50 * 1024 * 1024);
    assert_eq!(config.pagination.default_page_size, 10);
    assert_eq!(config.pagination.allowed_page_sizes, vec![10, 25, 30]);
    assert_eq!(config.feed.event_capacity, 1024);
    assert_eq!(config.collections.len(), 8);
    assert!(config.admins.is_empty());
}

#[test]
fn test_builtin_collections() {
    let config = PortalConfig::default_config();

    let banners = config.collection("banners").unwrap();
    assert_eq!(banners.flag_field.as_deref(), Some("isActive"));
    assert!(!banners.user_visible);
    assert_eq!(banners.display_name(), "Banners");

    let exams = config.collection("exams").unwrap();
    assert_eq!(exams.order_field, "createdAt");
    assert_eq!(exams.date_field.as_deref(), Some("examDate"));
    assert!(exams.user_visible);

    assert!(config.collection("users").is_none());
}

#[test]
fn test_custom_collection() {
    let yaml = r#"
pagination:
  default_page_size: 5
  allowed_page_sizes: [5, 50]
collections:
  - name: announcements
    search_fields: [title, body]
    title_field: title
    sort_keys: [newest, titleAsc]
"#;
    let config = PortalConfig::from_yaml_str(yaml).unwrap();

    assert_eq!(config.collections.len(), 1);
    let announcements = config.collection("announcements").unwrap();
    assert_eq!(announcements.display_name(), "announcements");
    assert_eq!(announcements.order_field, "createdAt");
    assert_eq!(announcements.offered_sort(SortKey::TitleAsc), SortKey::TitleAsc);
    assert_eq!(announcements.offered_sort(SortKey::DateAsc), SortKey::Newest);

    let fields = announcements.list_fields();
    assert_eq!(fields.search, vec!["title", "body"]);
    assert_eq!(fields.title.as_deref(), Some("title"));
    assert!(fields.date.is_none());

    assert_eq!(config.pagination.resolve(Some(50)), 50);
    assert_eq!(config.pagination.resolve(Some(10)), 5);
    assert_eq!(config.pagination.resolve(None), 5);
}

#[test]
fn test_default_sort_keys() {
    let yaml = r#"
collections:
  - name: announcements
"#;
    let config = PortalConfig::from_yaml_str(yaml).unwrap();
    let announcements = config.collection("announcements").unwrap();
    assert_eq!(announcements.sort_keys, vec![SortKey::Newest, SortKey::Oldest]);
    assert!(announcements.search_fields.is_empty());
}

#[test]
fn test_default_page_size_must_be_allowed() {
    let yaml = r#"
pagination:
  default_page_size: 7
"#;
    let err = PortalConfig::from_yaml_str(yaml).unwrap_err();
    assert!(err.to_string().contains("default_page_size 7"));
}

#[test]
fn test_zero_upload_limit_rejected() {
    let yaml = r#"
server:
  max_upload_bytes: 0
"#;
    let err = PortalConfig::from_yaml_str(yaml).unwrap_err();
    assert!(err.to_string().contains("max_upload_bytes"));
}

#[test]
fn test_empty_page_sizes_rejected() {
    let yaml = r#"
pagination:
  allowed_page_sizes: []
"#;
    assert!(PortalConfig::from_yaml_str(yaml).is_err());
}

#[test]
fn test_duplicate_collection_rejected() {
    let yaml = r#"
collections:
  - name: exams
  - name: exams
"#;
    let err = PortalConfig::from_yaml_str(yaml).unwrap_err();
    assert!(err.to_string().contains("configured twice"));
}

#[test]
fn test_collection_without_sort_keys_rejected() {
    let yaml = r#"
collections:
  - name: exams
    sort_keys: []
"#;
    assert!(PortalConfig::from_yaml_str(yaml).is_err());
}

#[test]
fn test_weak_admin_password_rejected() {
    let yaml = r#"
admins:
  - email: admin@example.com
    password: "123"
"#;
    let err = PortalConfig::from_yaml_str(yaml).unwrap_err();
    assert!(err.to_string().contains("admin@example.com"));
}

#[test]
fn test_unknown_sort_key_is_a_parse_error() {
    let yaml = r#"
collections:
  - name: exams
    sort_keys: [sideways]
"#;
    assert!(PortalConfig::from_yaml_str(yaml).is_err());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
server:
  host: 0.0.0.0
  port: 8080
admins:
  - email: admin@example.com
    password: change-me
    display_name: Admin
"#
    )
    .unwrap();

    let config = PortalConfig::from_yaml_file(file.path()).unwrap();
    assert_eq!(config.server.address(), "0.0.0.0:8080");
    assert_eq!(config.admins.len(), 1);
    assert_eq!(config.admins[0].display_name.as_deref(), Some("Admin"));
    assert_eq!(config.collections.len(), 8);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PortalConfig::from_yaml_file(dir.path().join("missing.yaml")).is_err());
}
