//! REST API request handlers

pub mod files;
pub mod login;
pub mod users;

pub use files::*;
pub use login::*;
pub use users::*;

use crate::ApiError;
use serde::{de::DeserializeOwned, Serialize};

/// `{"data": ...}` success body
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| ApiError::validation(format!("Missing {field} field in request body")))
}
