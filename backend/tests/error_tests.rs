//! Error mapping tests: HTTP status, JSON body and CLI exit codes

use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use cafe_backend::error::{AppError, FieldCheck};
use rust_decimal::Decimal;
use serde_json::Value;
use shared::{validate_name, ClockError, ScheduleError};

async fn body_json(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_validation_error_names_the_field() {
    let err = validate_name("   ").for_field("name").unwrap_err();
    let (status, body) = body_json(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["field"], "name");
}

#[tokio::test]
async fn test_insufficient_stock_body() {
    let err = AppError::InsufficientStock {
        supply: "Coffee beans".to_string(),
        required: Decimal::from(504),
        available: Decimal::from(500),
    };
    let (status, body) = body_json(err).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "INSUFFICIENT_STOCK");
    assert_eq!(body["error"]["field"], "Coffee beans");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("504"));
    assert!(message.contains("500"));
}

#[test]
fn test_not_found_has_no_field() {
    let (status, body) = tokio_test::block_on(body_json(AppError::NotFound("Employee".to_string())));

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Employee not found");
    assert!(body["error"].get("field").is_none());
}

#[tokio::test]
async fn test_internal_errors_hide_details() {
    let (status, body) = body_json(AppError::InternalError(anyhow::anyhow!("secret detail"))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"]["message"].as_str().unwrap().contains("secret"));
}

#[test]
fn test_domain_errors_convert() {
    let schedule = AppError::from(ScheduleError::OutOfRange(chrono::NaiveDate::MAX));
    assert_eq!(schedule.code(), "INVALID_DATE");

    let clock = AppError::from(ClockError::AlreadyClockedIn);
    assert_eq!(clock.status(), StatusCode::CONFLICT);
}

#[test]
fn test_exit_codes() {
    assert_eq!(AppError::InvalidDate("x".to_string()).exit_code(), 2);
    assert_eq!(AppError::ValidationError("x".to_string()).exit_code(), 2);
    assert_eq!(AppError::DuplicateEntry("email".to_string()).exit_code(), 2);
    assert_eq!(AppError::NotFound("Employee".to_string()).exit_code(), 3);
    assert_eq!(AppError::Internal("x".to_string()).exit_code(), 1);
    assert_eq!(AppError::Configuration("x".to_string()).exit_code(), 1);
}
