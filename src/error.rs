//! Unified application error model and mapping helpers.
//! One error enum shared by the session store, catalog stores and the REST client,
//! plus the `ApiResponse` envelope used to surface results to a presentation layer.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    Validation {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        errors: BTreeMap<String, String>,
    },
    DuplicateEmail { code: String, message: String },
    InvalidCredentials { code: String, message: String },
    Unauthorized { code: String, message: String },
    NotFound { code: String, message: String },
    StorageUnavailable { code: String, message: String },
    MalformedToken { code: String, message: String },
    Network { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::DuplicateEmail { code, .. }
            | AppError::InvalidCredentials { code, .. }
            | AppError::Unauthorized { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::StorageUnavailable { code, .. }
            | AppError::MalformedToken { code, .. }
            | AppError::Network { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::DuplicateEmail { message, .. }
            | AppError::InvalidCredentials { message, .. }
            | AppError::Unauthorized { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::StorageUnavailable { message, .. }
            | AppError::MalformedToken { message, .. }
            | AppError::Network { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    /// Field-level messages, only ever populated for validation failures.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            AppError::Validation { errors, .. } if !errors.is_empty() => Some(errors),
            _ => None,
        }
    }

    pub fn validation<S: Into<String>>(code: S, msg: S) -> Self { AppError::Validation { code: code.into(), message: msg.into(), errors: BTreeMap::new() } }
    pub fn validation_fields<S: Into<String>>(msg: S, errors: BTreeMap<String, String>) -> Self { AppError::Validation { code: "validation_error".into(), message: msg.into(), errors } }
    pub fn duplicate_email<S: Into<String>>(code: S, msg: S) -> Self { AppError::DuplicateEmail { code: code.into(), message: msg.into() } }
    pub fn invalid_credentials<S: Into<String>>(code: S, msg: S) -> Self { AppError::InvalidCredentials { code: code.into(), message: msg.into() } }
    pub fn unauthorized<S: Into<String>>(code: S, msg: S) -> Self { AppError::Unauthorized { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn storage_unavailable<S: Into<String>>(code: S, msg: S) -> Self { AppError::StorageUnavailable { code: code.into(), message: msg.into() } }
    pub fn malformed_token<S: Into<String>>(code: S, msg: S) -> Self { AppError::MalformedToken { code: code.into(), message: msg.into() } }
    pub fn network<S: Into<String>>(code: S, msg: S) -> Self { AppError::Network { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to the HTTP status the REST backend uses for the same condition.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::Validation { .. } => 422,
            AppError::DuplicateEmail { .. } => 409,
            AppError::InvalidCredentials { .. } => 401,
            AppError::Unauthorized { .. } => 401,
            AppError::NotFound { .. } => 404,
            AppError::StorageUnavailable { .. } => 503,
            AppError::MalformedToken { .. } => 400,
            AppError::Network { .. } => 502,
            AppError::Internal { .. } => 500,
        }
    }

    /// True for errors the user can fix by changing input (surfaced in forms).
    pub fn is_user_facing(&self) -> bool {
        matches!(self, AppError::Validation { .. } | AppError::DuplicateEmail { .. } | AppError::InvalidCredentials { .. } | AppError::NotFound { .. })
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Default mapping: treat as Internal unless downcasted elsewhere
        if let Some(app) = err.downcast_ref::<AppError>() { return app.clone(); }
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

/// Response envelope handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self { Self { success: true, data: Some(data), message: None, errors: None, status: None } }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self { success: true, data: Some(data), message: Some(message.into()), errors: None, status: None }
    }

    pub fn from_result(res: AppResult<T>) -> Self {
        match res {
            Ok(data) => Self::ok(data),
            Err(e) => e.into(),
        }
    }
}

impl<T> From<AppError> for ApiResponse<T> {
    fn from(e: AppError) -> Self {
        let errors = e.field_errors().map(|m| m.iter().map(|(k, v)| (k.clone(), vec![v.clone()])).collect());
        ApiResponse { success: false, data: None, message: Some(e.message().to_string()), errors, status: Some(e.http_status()) }
    }
}

/// Error body returned by the REST backend: `{message, errors}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<BTreeMap<String, serde_json::Value>>,
}

/// Flatten a backend error body into an `AppError`, keeping the first message per field.
pub fn handle_api_error(status: u16, body: &BackendErrorBody) -> AppError {
    let mut fields = BTreeMap::new();
    if let Some(errs) = &body.errors {
        for (field, v) in errs.iter() {
            let first = match v {
                serde_json::Value::Array(arr) => arr.first().and_then(|x| x.as_str()).unwrap_or("").to_string(),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            fields.insert(field.clone(), first);
        }
    }
    if !fields.is_empty() {
        let msg = body.message.clone().unwrap_or_else(|| "Please fix the errors above".to_string());
        return AppError::validation_fields(msg, fields);
    }
    let msg = body.message.clone().unwrap_or_else(|| default_message_for_status(status).to_string());
    match status {
        401 => AppError::unauthorized("unauthorized".to_string(), msg),
        404 => AppError::not_found("not_found".to_string(), msg),
        409 => AppError::duplicate_email("duplicate_email".to_string(), msg),
        422 => AppError::validation("validation_error".to_string(), msg),
        s if s >= 500 => AppError::network("server_error".to_string(), msg),
        _ => AppError::internal("http_error".to_string(), msg),
    }
}

pub fn default_message_for_status(status: u16) -> &'static str {
    match status {
        401 => "Your session has expired. Please login again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        422 => "Please check the form for errors.",
        s if s >= 500 => "Server error. Please try again later.",
        _ => "An unexpected error occurred. Please try again.",
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
