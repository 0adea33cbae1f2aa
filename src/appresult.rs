use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

/// Failures the caller can act on. Anything else surfaces as a 500.
#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("{0}")]
    Invalid(String),
    #[error("not signed in")]
    SignedOut,
    #[error("no active account")]
    NoAccount,
    #[error("{0}")]
    Forbidden(String),
    #[error("application was already reviewed")]
    AlreadyReviewed,
    #[error("{0} not found")]
    NotFound(String),
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    fn status(&self) -> StatusCode {
        use DomainError::*;
        match self {
            Invalid(_) => StatusCode::BAD_REQUEST,
            SignedOut | NoAccount => StatusCode::UNAUTHORIZED,
            Forbidden(_) => StatusCode::FORBIDDEN,
            AlreadyReviewed => StatusCode::CONFLICT,
            NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl AppError {
    pub fn domain(&self) -> Option<&DomainError> {
        self.0.downcast_ref::<DomainError>()
    }

    fn status(&self) -> StatusCode {
        if let Some(err) = self.domain() {
            return err.status();
        }
        match self.0.downcast_ref::<StoreError>() {
            Some(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, backtrace = %self.0.backtrace(), "request failed");
            return (status, Json(json!({ "error": "internal error" }))).into_response();
        }

        tracing::debug!(%status, error = %self.0, "request rejected");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        Self(anyhow::Error::msg(err))
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($($E:ty),* $(,)?) => {
        $(
            impl From<$E> for AppError {
                fn from(err: $E) -> Self {
                    Self(anyhow::Error::from(err))
                }
            }
        )*
    };
}

apperr_impl!(
    DomainError,
    StoreError,
    serde_json::Error,
    sqlx::Error,
    tower_sessions::session::Error,
    axum::Error,
    reqwest::Error,
);
