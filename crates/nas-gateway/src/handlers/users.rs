//! User account operations
//!
//! A caller may only read or change their own account.

use super::{parse_json, required, Data};
use crate::dispatcher::{BodyHandler, RequestHandler};
use crate::{ApiError, AppState, RequestContext};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use nas_accounts::UserId;
use serde::Deserialize;
use tracing::info;

/// Resolve the target user and check that the caller is that user
fn own_account(state: &AppState, ctx: &RequestContext, action: &str) -> Result<UserId, ApiError> {
    let id = ctx.item_id()?;
    let caller = state.auth.authenticate_request(ctx.authorization())?;
    if caller != id {
        return Err(ApiError::forbidden(format!("Cannot {action} another user")));
    }
    Ok(id)
}

#[derive(Deserialize)]
struct NewUser {
    username: Option<String>,
    password: Option<String>,
}

/// POST /api/users
pub struct CreateUser;

impl BodyHandler for CreateUser {
    fn on_body(&self, state: &AppState, ctx: &mut RequestContext, body: &[u8]) -> Result<(), ApiError> {
        let request: NewUser = parse_json(body)?;
        let username = required(request.username, "username")?;
        let password = required(request.password, "password")?;
        if username.is_empty() {
            return Err(ApiError::validation("Username must not be empty"));
        }

        let user = state.accounts.create_user(&username, &password)?;
        info!(user_id = user.id, username = %user.username, "Created user");
        ctx.pending.fill(StatusCode::OK.into_response())
    }
}

/// GET /api/users/{id}
pub struct GetUser;

impl RequestHandler for GetUser {
    fn handle(&self, state: &AppState, ctx: &mut RequestContext) -> Result<Option<Response>, ApiError> {
        let id = own_account(state, ctx, "get")?;
        let user = state
            .accounts
            .get_user(id)?
            .ok_or(ApiError::UserNotFound(id))?;

        Ok(Some(Json(Data { data: user }).into_response()))
    }
}

/// DELETE /api/users/{id}
pub struct DeleteUser;

impl RequestHandler for DeleteUser {
    fn handle(&self, state: &AppState, ctx: &mut RequestContext) -> Result<Option<Response>, ApiError> {
        let id = own_account(state, ctx, "delete")?;
        state.accounts.delete_user(id)?;
        info!(user_id = id, "Deleted user");

        Ok(Some(StatusCode::OK.into_response()))
    }
}

#[derive(Deserialize)]
struct UserChanges {
    username: Option<String>,
    password: Option<String>,
}

/// PATCH /api/users/{id} - change username and/or password
pub struct UpdateUser;

impl BodyHandler for UpdateUser {
    fn on_body(&self, state: &AppState, ctx: &mut RequestContext, body: &[u8]) -> Result<(), ApiError> {
        let id = own_account(state, ctx, "update")?;
        let changes: UserChanges = parse_json(body)?;

        if let Some(username) = changes.username {
            if username.is_empty() {
                return Err(ApiError::validation("Username must not be empty"));
            }
            state.accounts.update_username(id, &username)?;
        }
        if let Some(password) = changes.password {
            state.accounts.update_password(id, &password)?;
        }

        ctx.pending.fill(StatusCode::OK.into_response())
    }
}
