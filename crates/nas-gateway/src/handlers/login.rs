//! Login

use super::{parse_json, required};
use crate::dispatcher::BodyHandler;
use crate::{ApiError, AppState, RequestContext};
use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

/// POST /api/login - exchange credentials for a bearer token
pub struct Login;

impl BodyHandler for Login {
    fn on_body(&self, state: &AppState, ctx: &mut RequestContext, body: &[u8]) -> Result<(), ApiError> {
        let request: LoginRequest = parse_json(body)?;
        let username = required(request.username, "username")?;
        let password = required(request.password, "password")?;

        let token = state.auth.login(state.accounts.as_ref(), &username, &password)?;

        ctx.pending.fill(
            (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], token).into_response(),
        )
    }
}
