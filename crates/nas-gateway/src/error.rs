//! Error taxonomy and the JSON error envelope

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nas_accounts::{StoreError, UserId};
use nas_token::TokenError;
use nas_vfs::VfsError;
use serde::Serialize;
use thiserror::Error;

/// Failure domains reported in the envelope's `domain` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDomain {
    Disk,
    File,
    Vfs,
    Storage,
    Json,
    Validation,
    Unauthorized,
    Credentials,
    Authorization,
    Server,
    Unknown,
}

impl ErrorDomain {
    /// Get the domain string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disk => "Disk",
            Self::File => "File",
            Self::Vfs => "VFS",
            Self::Storage => "Storage",
            Self::Json => "JSON",
            Self::Validation => "Validation",
            Self::Unauthorized => "Unauthorized",
            Self::Credentials => "Credentials",
            Self::Authorization => "Authorization",
            Self::Server => "Server",
            Self::Unknown => "Unknown",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Disk | Self::File | Self::Vfs | Self::Storage | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Json | Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::Credentials => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::Server => StatusCode::NOT_FOUND,
        }
    }
}

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error(transparent)]
    Store(StoreError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("{0}")]
    Unauthorized(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("Resource Not Found")]
    RouteNotFound { path: String },

    #[error("User not found")]
    UserNotFound(UserId),

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoSuchUser(id) => Self::UserNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(_) | TokenError::KeyLoad { .. } | TokenError::InvalidKey(_) => {
                Self::Internal(err.to_string())
            }
            _ => Self::Unauthorized(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify the error.
    ///
    /// Disk and file failures refine the generic VFS domain, so they are
    /// matched first.
    pub fn domain(&self) -> ErrorDomain {
        match self {
            Self::Vfs(VfsError::Disk(_)) => ErrorDomain::Disk,
            Self::Vfs(VfsError::File(_)) => ErrorDomain::File,
            Self::Vfs(_) => ErrorDomain::Vfs,
            Self::Store(_) => ErrorDomain::Storage,
            Self::Json(_) => ErrorDomain::Json,
            Self::Validation(_) | Self::BodyTooLarge { .. } => ErrorDomain::Validation,
            Self::Unauthorized(_) => ErrorDomain::Unauthorized,
            Self::InvalidCredentials => ErrorDomain::Credentials,
            Self::Forbidden(_) => ErrorDomain::Authorization,
            Self::RouteNotFound { .. } | Self::UserNotFound(_) => ErrorDomain::Server,
            Self::Internal(_) => ErrorDomain::Unknown,
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => self.domain().status_code(),
        }
    }

    /// Where the failure happened, if it names something
    pub fn location(&self) -> Option<(Location, &'static str)> {
        match self {
            Self::Vfs(VfsError::Disk(e)) => e
                .mount_point
                .clone()
                .map(|mount| (Location::Text(mount), "Disk Mount Point")),
            Self::Vfs(VfsError::File(e)) => e.file_id.map(|id| (Location::Id(id), "File ID")),
            Self::RouteNotFound { path } => Some((Location::Text(path.clone()), "Request URI")),
            Self::UserNotFound(id) => Some((Location::Id(*id), "User ID")),
            _ => None,
        }
    }

    /// Render the wire envelope
    pub fn envelope(&self) -> ErrorEnvelope {
        let domain = self.domain();
        let (location, location_type) = match self.location() {
            Some((location, kind)) => (Some(location), Some(kind)),
            None => (None, None),
        };

        ErrorEnvelope {
            error: ErrorBody {
                code: self.status_code().as_u16(),
                domain: domain.as_str(),
                message: self.to_string(),
                location,
                location_type,
            },
        }
    }
}

/// Value of the envelope's `location` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Location {
    Text(String),
    Id(i64),
}

/// `{"error": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: u16,
    pub domain: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let envelope = self.envelope();

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                domain = envelope.error.domain,
                message = %envelope.error.message,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = status.as_u16(),
                domain = envelope.error.domain,
                message = %envelope.error.message,
                "Request rejected"
            );
        }

        (status, Json(envelope)).into_response()
    }
}
