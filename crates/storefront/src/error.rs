//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; domain-rule violations come back as structured
//! JSON, persistence failures as a redacted 500.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::domain::checkout::CheckoutRejected;
use crate::domain::{CartError, InvalidTransition, ShipmentError};
use crate::services::{CheckoutFailure, FulfillmentError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Checkout was rejected with a violation set.
    #[error("Checkout rejected")]
    CheckoutRejected(CheckoutRejected),

    /// A non-checkout payload failed field validation.
    #[error("Validation failed")]
    Validation(Vec<crate::domain::checkout::Violation>),

    /// An order transition outside the lifecycle graph.
    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] InvalidTransition),

    /// A shipment rule was violated.
    #[error("Shipment error: {0}")]
    Shipment(#[from] ShipmentError),

    /// A cart mutation was rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// A concurrent writer won; the client should re-read and retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CheckoutFailure> for AppError {
    fn from(e: CheckoutFailure) -> Self {
        match e {
            CheckoutFailure::Rejected(rejected) => Self::CheckoutRejected(rejected),
            CheckoutFailure::Repository(err) => Self::Database(err),
        }
    }
}

impl From<FulfillmentError> for AppError {
    fn from(e: FulfillmentError) -> Self {
        match e {
            FulfillmentError::NotFound => Self::NotFound("order or shipment".to_owned()),
            FulfillmentError::InvalidTransition(err) => Self::InvalidTransition(err),
            FulfillmentError::Shipment(err) => Self::Shipment(err),
            FulfillmentError::Conflict(message) => Self::Conflict(message),
            FulfillmentError::Repository(err) => Self::Database(err),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {e}"))
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::CheckoutRejected(_) | Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidTransition(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Shipment(err) => match err {
                ShipmentError::InvalidTransition { .. } => StatusCode::CONFLICT,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Cart(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Database(RepositoryError::NotFound) => json!({ "error": "not found" }),
            Self::Database(RepositoryError::Conflict(message)) => json!({ "error": message }),
            Self::Database(_) | Self::Internal(_) => {
                json!({ "error": "internal server error" })
            }
            Self::CheckoutRejected(rejected) => json!({
                "error": "checkout rejected",
                "violations": rejected.violations,
            }),
            Self::Validation(violations) => json!({
                "error": "validation failed",
                "violations": violations,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use madrona_core::{OrderStatus, ShipmentStatus};

    use crate::domain::checkout::Violation;
    use crate::domain::OrderTransition;

    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_owned());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_owned());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("x".to_owned()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("x".to_owned()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".to_owned()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::InvalidTransition(InvalidTransition {
                from: OrderStatus::Delivered,
                transition: OrderTransition::Refund,
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Shipment(ShipmentError::TrackingNumberTooShort { len: 9 }).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Shipment(ShipmentError::InvalidTransition {
                from: ShipmentStatus::Delivered,
                to: ShipmentStatus::Preparing,
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Database(RepositoryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Internal("x".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn checkout_rejection_serializes_its_violations() {
        let err = AppError::CheckoutRejected(CheckoutRejected {
            violations: vec![Violation::InsufficientStock {
                path: "items[0]".to_owned(),
                title: "Linen Shirt".to_owned(),
                requested: 3,
                available: 2,
                shortfall: 1,
            }],
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
