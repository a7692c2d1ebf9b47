//! Per-request state shared between the data and completion phases

use crate::upload::UploadState;
use crate::ApiError;
use axum::{
    extract::Query,
    http::{header, request::Parts, Method},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

/// Slot bridging a data phase and the later completion phase.
///
/// Holds at most one reply and hands it out at most once.
#[derive(Debug, Default)]
pub struct PendingResponse {
    slot: Option<Response>,
}

impl PendingResponse {
    /// Store the reply of a successful data phase
    pub fn fill(&mut self, response: Response) -> Result<(), ApiError> {
        if self.slot.is_some() {
            return Err(ApiError::internal("a pending response is already stored"));
        }
        self.slot = Some(response);
        Ok(())
    }

    /// Store the rendered failure of a data phase, superseding any stored reply
    pub fn fail(&mut self, error: ApiError) {
        self.slot = Some(error.into_response());
    }

    /// Take the stored reply, leaving the slot empty
    pub fn take(&mut self) -> Option<Response> {
        self.slot.take()
    }

    pub fn is_filled(&self) -> bool {
        self.slot.is_some()
    }
}

/// Transient state of one inbound request
#[derive(Debug)]
pub struct RequestContext {
    method: Method,
    path: String,
    item_param: Option<String>,
    authorization: Option<String>,
    query: HashMap<String, String>,
    /// Reply produced by a data phase, consumed by the completion handler
    pub pending: PendingResponse,
    /// Upload progress, for upload routes
    pub upload: UploadState,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            item_param: None,
            authorization: None,
            query: HashMap::new(),
            pending: PendingResponse::default(),
            upload: UploadState::default(),
        }
    }

    /// Capture what the handlers need from the request head
    pub fn from_parts(parts: &Parts) -> Self {
        let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();
        let authorization = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Self {
            authorization,
            query,
            ..Self::new(parts.method.clone(), parts.uri.path())
        }
    }

    pub fn with_item_param(mut self, param: impl Into<String>) -> Self {
        self.item_param = Some(param.into());
        self
    }

    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub(crate) fn set_item_param(&mut self, param: Option<String>) {
        self.item_param = param;
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// The numeric id captured from the route pattern
    pub fn item_id(&self) -> Result<i64, ApiError> {
        let raw = self
            .item_param
            .as_deref()
            .ok_or_else(|| ApiError::validation("Route does not capture an item id"))?;
        raw.parse()
            .map_err(|_| ApiError::validation(format!("Invalid item id: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::{Request, StatusCode}};

    #[test]
    fn test_pending_slot_is_taken_once() {
        let mut pending = PendingResponse::default();
        assert!(pending.take().is_none());

        pending.fill(StatusCode::OK.into_response()).unwrap();
        assert!(pending.is_filled());
        assert!(pending.fill(StatusCode::OK.into_response()).is_err());

        assert_eq!(pending.take().unwrap().status(), StatusCode::OK);
        assert!(pending.take().is_none());
    }

    #[test]
    fn test_failure_supersedes_pending_reply() {
        let mut pending = PendingResponse::default();
        pending.fill(StatusCode::OK.into_response()).unwrap();
        pending.fail(ApiError::validation("late failure"));

        assert_eq!(pending.take().unwrap().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_from_parts() {
        let (parts, _) = Request::builder()
            .method(Method::PUT)
            .uri("/api/files/3?size=12&x=y")
            .header("Authorization", "Bearer abc")
            .body(Body::empty())
            .unwrap()
            .into_parts();

        let ctx = RequestContext::from_parts(&parts);
        assert_eq!(ctx.method(), Method::PUT);
        assert_eq!(ctx.path(), "/api/files/3");
        assert_eq!(ctx.query_param("size"), Some("12"));
        assert_eq!(ctx.authorization(), Some("Bearer abc"));
    }

    #[test]
    fn test_item_id() {
        let ctx = RequestContext::new(Method::GET, "/x");
        assert!(matches!(ctx.item_id(), Err(ApiError::Validation(_))));

        let ctx = ctx.with_item_param("17");
        assert_eq!(ctx.item_id().unwrap(), 17);

        let ctx = RequestContext::new(Method::GET, "/x").with_item_param("99999999999999999999");
        assert!(matches!(ctx.item_id(), Err(ApiError::Validation(_))));
    }
}
