use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shuxue_algo::{AlgoError, CatalogError, RecordError, SessionError};

use crate::services::ServiceError;

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<SuccessResponse<T>> {
    Json(SuccessResponse {
        success: true,
        data,
    })
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

/// Machine-readable failure class carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    code: ErrorCode,
    message: String,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

fn classify(err: &AlgoError) -> ErrorCode {
    match err {
        AlgoError::Record(RecordError::UserMismatch { .. }) => ErrorCode::Forbidden,
        AlgoError::Record(_) => ErrorCode::Validation,
        AlgoError::Catalog(
            CatalogError::UnknownTopic(_)
            | CatalogError::UnknownQuestion(_)
            | CatalogError::UnknownLevel(_),
        ) => ErrorCode::NotFound,
        // 题库在加载时已校验，运行中出现其余错误说明数据不一致
        AlgoError::Catalog(_) => ErrorCode::Internal,
        AlgoError::Session(SessionError::Locked(_)) => ErrorCode::Forbidden,
        AlgoError::Session(
            SessionError::EmptyLevel(_) | SessionError::OutcomeMismatch { .. },
        ) => ErrorCode::Validation,
        AlgoError::Session(_) => ErrorCode::Conflict,
    }
}

impl From<AlgoError> for AppError {
    fn from(err: AlgoError) -> Self {
        Self::new(classify(&err), err.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AlgoError::from(err).into()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AlgoError::from(err).into()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Algo(err) => err.into(),
            ServiceError::SessionNotFound(id) => Self::not_found(format!("session not found: {id}")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.code == ErrorCode::Internal {
            tracing::error!(error = %self.message, "request failed");
            "internal server error".to_string()
        } else {
            self.message
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code.as_str(),
        };

        (self.code.status(), Json(body)).into_response()
    }
}
