//! Shared test harness: an in-memory portal with one admin and one user

#![allow(dead_code)]

use axum::http::StatusCode;
use axum_test::TestServer;
use exam_portal::config::{PortalConfig, SeedAdmin};
use exam_portal::server::{ServerBuilder, ServerHost};
use serde_json::{Value, json};
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-secret";
pub const USER_EMAIL: &str = "student@example.com";
pub const USER_PASSWORD: &str = "student-secret";

pub struct Portal {
    pub server: TestServer,
    pub host: Arc<ServerHost>,
    pub admin: String,
    pub user: String,
}

pub fn test_config() -> PortalConfig {
    let mut config = PortalConfig::default_config();
    config.admins.push(SeedAdmin {
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
        display_name: Some("Admin".to_string()),
    });
    config
}

/// Build the host with the seeded admin account
pub async fn build_host() -> Arc<ServerHost> {
    build_host_with(test_config()).await
}

pub async fn build_host_with(config: PortalConfig) -> Arc<ServerHost> {
    let host = ServerBuilder::new()
        .with_config(config)
        .in_memory()
        .build_host()
        .expect("Failed to build host");
    let host = Arc::new(host);
    host.seed_admins().await.expect("Failed to seed admins");
    host
}

/// Portal with a signed-in admin and a signed-up user
pub async fn portal() -> Portal {
    portal_with(test_config()).await
}

/// Same as [`portal`] over a custom configuration
pub async fn portal_with(config: PortalConfig) -> Portal {
    let host = build_host_with(config).await;
    let app = ServerBuilder::router(host.clone(), vec![]).expect("Failed to build app");
    let server = TestServer::try_new(app).expect("Failed to create test server");

    let admin = login(&server, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = server
        .post("/auth/signup")
        .json(&json!({
            "email": USER_EMAIL,
            "password": USER_PASSWORD,
            "confirmPassword": USER_PASSWORD,
            "displayName": "Student"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let user = response.json::<Value>()["token"]
        .as_str()
        .expect("signup token")
        .to_string();

    Portal {
        server,
        host,
        admin,
        user,
    }
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": password }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"]
        .as_str()
        .expect("login token")
        .to_string()
}

pub fn exam(title: &str, date: &str) -> Value {
    json!({
        "title": title,
        "description": format!("{} description", title),
        "examDate": date,
    })
}
