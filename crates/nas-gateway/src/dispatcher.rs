//! Route table and request dispatch
//!
//! Every request goes through two phases. The data phase feeds the body to
//! the route's body handler (buffered) or upload handler (streamed, one call
//! per multipart chunk). The completion phase then runs the route's request
//! handler, which produces the single response for the request.

use crate::upload::UploadChunk;
use crate::{ApiError, AppState, RequestContext};
use axum::{
    body::Body,
    extract::{multipart::MultipartError, FromRequest, Multipart},
    http::{Method, Request},
    response::{IntoResponse, Response},
};
use bytes::BytesMut;
use futures::StreamExt;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Completion phase handler
pub trait RequestHandler: Send + Sync {
    /// Produce the response, or `None` when the request carried nothing to
    /// answer.
    fn handle(&self, state: &AppState, ctx: &mut RequestContext) -> Result<Option<Response>, ApiError>;
}

/// Receives the fully buffered request body
pub trait BodyHandler: Send + Sync {
    fn on_body(&self, state: &AppState, ctx: &mut RequestContext, body: &[u8]) -> Result<(), ApiError>;
}

/// Receives uploaded file data chunk by chunk
pub trait UploadHandler: Send + Sync {
    fn on_chunk(
        &self,
        state: &AppState,
        ctx: &mut RequestContext,
        chunk: UploadChunk<'_>,
    ) -> Result<(), ApiError>;
}

/// Completion for body routes: send what the body handler left in the
/// pending slot.
pub struct SendPending;

impl RequestHandler for SendPending {
    fn handle(&self, _state: &AppState, ctx: &mut RequestContext) -> Result<Option<Response>, ApiError> {
        ctx.pending
            .take()
            .map(Some)
            .ok_or_else(|| ApiError::validation("Missing request body"))
    }
}

/// Completion for upload routes
pub struct UploadEnd;

impl RequestHandler for UploadEnd {
    fn handle(&self, _state: &AppState, ctx: &mut RequestContext) -> Result<Option<Response>, ApiError> {
        Ok(ctx.pending.take())
    }
}

/// Path pattern of a route.
///
/// Patterns starting with `^` are regular expressions whose first capture
/// group becomes the item parameter. Anything else matches literally.
#[derive(Debug)]
enum RoutePattern {
    Literal(String),
    Regex(Regex),
}

impl RoutePattern {
    fn compile(pattern: &str) -> Result<Self, regex::Error> {
        if pattern.starts_with('^') {
            Ok(Self::Regex(Regex::new(pattern)?))
        } else {
            Ok(Self::Literal(pattern.to_string()))
        }
    }

    /// `None` if the path does not match, otherwise the captured parameter
    fn matches(&self, path: &str) -> Option<Option<String>> {
        match self {
            Self::Literal(literal) => (literal == path).then_some(None),
            Self::Regex(regex) => regex
                .captures(path)
                .map(|caps| caps.get(1).map(|m| m.as_str().to_string())),
        }
    }
}

/// A route table entry
#[derive(Clone)]
pub struct Route {
    pattern: String,
    method: Method,
    handler: Arc<dyn RequestHandler>,
    body: Option<Arc<dyn BodyHandler>>,
    upload: Option<Arc<dyn UploadHandler>>,
}

impl Route {
    /// A route answered from the request line and headers alone
    pub fn request(pattern: impl Into<String>, method: Method, handler: impl RequestHandler + 'static) -> Self {
        Self {
            pattern: pattern.into(),
            method,
            handler: Arc::new(handler),
            body: None,
            upload: None,
        }
    }

    /// A route whose JSON body is handled by `handler`
    pub fn body(pattern: impl Into<String>, method: Method, handler: impl BodyHandler + 'static) -> Self {
        Self {
            body: Some(Arc::new(handler)),
            ..Self::request(pattern, method, SendPending)
        }
    }

    /// A route accepting a multipart file upload
    pub fn upload(pattern: impl Into<String>, method: Method, handler: impl UploadHandler + 'static) -> Self {
        Self {
            upload: Some(Arc::new(handler)),
            ..Self::request(pattern, method, UploadEnd)
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    fn kind(&self) -> &'static str {
        if self.upload.is_some() {
            "upload"
        } else if self.body.is_some() {
            "body"
        } else {
            "request"
        }
    }
}

/// Summary of a registered route
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: Method,
    pub pattern: String,
    pub kind: &'static str,
}

/// Matches requests against an ordered route table
pub struct Dispatcher {
    routes: Vec<(RoutePattern, Route)>,
    max_body_size: usize,
}

impl Dispatcher {
    /// Compile the route table. Earlier routes win.
    pub fn new(routes: Vec<Route>, max_body_size: usize) -> Result<Self, regex::Error> {
        let routes = routes
            .into_iter()
            .map(|route| Ok((RoutePattern::compile(&route.pattern)?, route)))
            .collect::<Result<Vec<_>, regex::Error>>()?;

        Ok(Self { routes, max_body_size })
    }

    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .map(|(_, route)| RouteInfo {
                method: route.method.clone(),
                pattern: route.pattern.clone(),
                kind: route.kind(),
            })
            .collect()
    }

    /// First route whose method and pattern match, with its captured parameter
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, Option<String>)> {
        self.routes
            .iter()
            .filter(|(_, route)| route.method == *method)
            .find_map(|(pattern, route)| pattern.matches(path).map(|param| (route, param)))
    }

    /// Run a request through both phases and produce its only response
    pub async fn dispatch(&self, state: &AppState, request: Request<Body>) -> Response {
        let (parts, body) = request.into_parts();

        let Some((route, item_param)) = self.find(&parts.method, parts.uri.path()) else {
            return ApiError::RouteNotFound {
                path: parts.uri.path().to_string(),
            }
            .into_response();
        };
        debug!(method = %parts.method, pattern = %route.pattern, "Matched route");

        let mut ctx = RequestContext::from_parts(&parts);
        ctx.set_item_param(item_param);

        let data_phase = if let Some(upload) = &route.upload {
            feed_upload(upload.as_ref(), state, &mut ctx, Request::from_parts(parts, body)).await
        } else if let Some(handler) = &route.body {
            feed_body(handler.as_ref(), state, &mut ctx, body, self.max_body_size).await
        } else {
            Ok(())
        };
        if let Err(err) = data_phase {
            ctx.pending.fail(err);
        }

        match route.handler.handle(state, &mut ctx) {
            Ok(Some(response)) => response,
            Ok(None) => ApiError::validation("Missing request body").into_response(),
            Err(err) => err.into_response(),
        }
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::validation(format!("Malformed upload body: {}", err.body_text()))
}

/// Stream the first file part to `handler`.
///
/// Later file parts are skipped unread. After the first handler failure the
/// rest of the body is still read, but no further chunks are delivered.
async fn feed_upload(
    handler: &dyn UploadHandler,
    state: &AppState,
    ctx: &mut RequestContext,
    request: Request<Body>,
) -> Result<(), ApiError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?;
    let mut failure: Option<ApiError> = None;
    let mut delivered = false;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(failure.unwrap_or_else(|| multipart_error(e))),
        };
        let Some(filename) = field.file_name().map(str::to_owned) else {
            continue;
        };
        if delivered {
            debug!(filename = %filename, "Skipping extra file part");
            continue;
        }
        delivered = true;

        let mut offset = 0u64;
        loop {
            let data = match field.chunk().await {
                Ok(Some(data)) => data,
                Ok(None) => break,
                Err(e) => return Err(failure.unwrap_or_else(|| multipart_error(e))),
            };
            if data.is_empty() || failure.is_some() {
                continue;
            }
            let chunk = UploadChunk {
                filename: &filename,
                offset,
                data: &data,
                is_final: false,
            };
            offset += data.len() as u64;
            if let Err(e) = handler.on_chunk(state, ctx, chunk) {
                failure = Some(e);
            }
        }

        if failure.is_none() {
            let last = UploadChunk {
                filename: &filename,
                offset,
                data: &[],
                is_final: true,
            };
            if let Err(e) = handler.on_chunk(state, ctx, last) {
                failure = Some(e);
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Buffer the body up to `limit` bytes and hand it to `handler`.
///
/// Reading stops as soon as the limit is crossed. An empty body is not
/// delivered.
async fn feed_body(
    handler: &dyn BodyHandler,
    state: &AppState,
    ctx: &mut RequestContext,
    body: Body,
    limit: usize,
) -> Result<(), ApiError> {
    let mut stream = body.into_data_stream();
    let mut buffer = BytesMut::new();

    while let Some(frame) = stream.next().await {
        let data = frame.map_err(|e| ApiError::validation(format!("Failed to read request body: {e}")))?;
        if buffer.len() + data.len() > limit {
            warn!(limit, "Request body too large");
            return Err(ApiError::BodyTooLarge { limit });
        }
        buffer.extend_from_slice(&data);
    }
    if buffer.is_empty() {
        return Ok(());
    }
    handler.on_body(state, ctx, &buffer)
}
