//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses carry a stable code and the details clients act on
//! - Identity provider failures convert into the right error

use axum::http::StatusCode;
use axum::response::IntoResponse;
use exam_portal::core::auth::AuthError;
use exam_portal::core::error::FieldError;
use exam_portal::prelude::*;

fn unauthorized() -> PortalError {
    PortalError::Unauthorized {
        message: "Please sign in.".to_string(),
        redirect: "/login",
    }
}

fn forbidden() -> PortalError {
    PortalError::Forbidden {
        message: "You do not have access to this page.".to_string(),
        redirect: "/dashboard",
    }
}

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_validation_returns_400() {
        let err = PortalError::invalid("title", "All fields are required.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_record_returns_404() {
        let err = PortalError::not_found("exams", Uuid::new_v4());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = PortalError::UnknownCollection("unicorns".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_guard_errors() {
        assert_eq!(unauthorized().status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden().status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_conflict_returns_409() {
        let err = PortalError::Conflict("Email is already in use".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_server_side_failures_return_500() {
        for err in [
            PortalError::Storage("Failed to save exam.".to_string()),
            PortalError::Config("bad yaml".to_string()),
            PortalError::Internal("oops".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let cases = [
            (PortalError::invalid("title", "x"), "VALIDATION_ERROR"),
            (PortalError::not_found("exams", Uuid::new_v4()), "NOT_FOUND"),
            (
                PortalError::UnknownCollection("unicorns".to_string()),
                "UNKNOWN_COLLECTION",
            ),
            (unauthorized(), "UNAUTHORIZED"),
            (forbidden(), "FORBIDDEN"),
            (PortalError::Conflict("x".to_string()), "CONFLICT"),
            (PortalError::Storage("x".to_string()), "STORAGE_ERROR"),
            (PortalError::Config("x".to_string()), "CONFIG_ERROR"),
            (PortalError::Internal("x".to_string()), "INTERNAL_ERROR"),
        ];
        for (err, code) in cases {
            assert_eq!(err.error_code(), code);
        }
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[test]
    fn test_validation_response_lists_fields() {
        let err = PortalError::invalid_fields(
            &["title", "startDate", "endDate"],
            "Title, Start Date and End Date are required.",
        );
        let response = err.to_response();

        assert_eq!(response.code, "VALIDATION_ERROR");
        assert_eq!(response.message, "Title, Start Date and End Date are required.");
        let fields = response.details.unwrap()["fields"].clone();
        assert_eq!(fields.as_array().unwrap().len(), 3);
        assert_eq!(fields[1]["field"], "startDate");
    }

    #[test]
    fn test_validation_without_fields_has_no_details() {
        let err = PortalError::Validation {
            message: "Invalid".to_string(),
            fields: Vec::<FieldError>::new(),
        };
        assert!(err.to_response().details.is_none());
    }

    #[test]
    fn test_not_found_response() {
        let id = Uuid::new_v4();
        let response = PortalError::not_found("notes", id).to_response();

        assert_eq!(response.message, format!("notes {} not found", id));
        let details = response.details.unwrap();
        assert_eq!(details["collection"], "notes");
        assert_eq!(details["id"], id.to_string());
    }

    #[test]
    fn test_guard_responses_carry_redirect() {
        assert_eq!(unauthorized().to_response().details.unwrap()["redirect"], "/login");
        assert_eq!(forbidden().to_response().details.unwrap()["redirect"], "/dashboard");
    }

    #[test]
    fn test_storage_message_is_user_facing() {
        let err = PortalError::storage("Failed to save exam.", anyhow::anyhow!("disk full"));
        let response = err.to_response();
        assert_eq!(response.message, "Failed to save exam.");
        assert!(response.details.is_none());
    }

    #[test]
    fn test_response_serialization_skips_empty_details() {
        let json = serde_json::to_value(PortalError::Conflict("taken".to_string()).to_response())
            .unwrap();
        assert_eq!(json["code"], "CONFLICT");
        assert!(json.get("details").is_none());
    }
}

// =============================================================================
// Error Conversion Tests
// =============================================================================

mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_email_in_use_is_conflict() {
        let err: PortalError = AuthError::EmailInUse.into();
        assert!(matches!(err, PortalError::Conflict(_)));
        assert_eq!(err.to_string(), "Email is already in use");
    }

    #[test]
    fn test_invalid_credentials_redirect_to_login() {
        let err: PortalError = AuthError::InvalidCredentials.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_response().details.unwrap()["redirect"], "/login");
    }

    #[test]
    fn test_weak_password_and_email_are_field_errors() {
        let err: PortalError = AuthError::WeakPassword.into();
        match err {
            PortalError::Validation { fields, .. } => assert_eq!(fields[0].field, "password"),
            other => panic!("Expected validation error, got {:?}", other),
        }

        let err: PortalError = AuthError::InvalidEmail.into();
        match err {
            PortalError::Validation { fields, .. } => assert_eq!(fields[0].field, "email"),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_yaml_error_is_config_error() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let err: PortalError = yaml_err.into();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}

// =============================================================================
// IntoResponse Tests
// =============================================================================

mod into_response_tests {
    use super::*;

    #[test]
    fn test_into_response_status() {
        let cases = [
            (PortalError::invalid("title", "x"), StatusCode::BAD_REQUEST),
            (unauthorized(), StatusCode::UNAUTHORIZED),
            (forbidden(), StatusCode::FORBIDDEN),
            (
                PortalError::UnknownCollection("x".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                PortalError::Storage("x".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = PortalError::invalid("examDate", "All fields are required.").into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "All fields are required.");
        assert_eq!(json["details"]["fields"][0]["field"], "examDate");
    }
}
