//! File and directory operations

use super::{parse_json, required, Data};
use crate::dispatcher::{BodyHandler, RequestHandler};
use crate::{ApiError, AppState, RequestContext};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use nas_vfs::{FileId, FileMetadata, OwnerId};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Directory listing entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: FileId,
    pub name: String,
    pub is_directory: bool,
    #[serde(rename = "ownerID")]
    pub owner_id: OwnerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<i64>,
}

impl From<FileMetadata> for DirectoryEntry {
    fn from(meta: FileMetadata) -> Self {
        let (size, last_modified) = if meta.is_directory {
            (None, None)
        } else {
            (Some(meta.size), Some(meta.last_modified))
        };
        Self {
            id: meta.file_id,
            name: meta.name,
            is_directory: meta.is_directory,
            owner_id: meta.owner_id,
            size,
            last_modified,
        }
    }
}

/// GET /api/files/{id} - list a directory or download a file
pub struct GetFile;

impl RequestHandler for GetFile {
    fn handle(&self, state: &AppState, ctx: &mut RequestContext) -> Result<Option<Response>, ApiError> {
        let id = ctx.item_id()?;
        state.auth.authenticate_request(ctx.authorization())?;

        if state.vfs.is_directory(id)? {
            let data: Vec<DirectoryEntry> = state
                .vfs
                .list_directory(id)?
                .into_iter()
                .map(DirectoryEntry::from)
                .collect();
            return Ok(Some(Json(Data { data }).into_response()));
        }

        let meta = state.vfs.metadata(id)?;
        let content = state.vfs.read_file(id)?;
        let content_type = mime_guess::from_path(&meta.name)
            .first_or_octet_stream()
            .to_string();

        Ok(Some(
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type)],
                content,
            )
                .into_response(),
        ))
    }
}

/// DELETE /api/files/{id} - remove a file or directory tree
pub struct DeleteFile;

impl RequestHandler for DeleteFile {
    fn handle(&self, state: &AppState, ctx: &mut RequestContext) -> Result<Option<Response>, ApiError> {
        let id = ctx.item_id()?;
        let user = state.auth.authenticate_request(ctx.authorization())?;

        state.vfs.remove_entry(id, user)?;
        info!(file_id = id, user_id = user, "Removed entry");
        Ok(Some(StatusCode::OK.into_response()))
    }
}

#[derive(Deserialize)]
struct NewDirectory {
    name: Option<String>,
}

/// POST /api/files/{parent} - create a directory
pub struct CreateDirectory;

impl BodyHandler for CreateDirectory {
    fn on_body(&self, state: &AppState, ctx: &mut RequestContext, body: &[u8]) -> Result<(), ApiError> {
        let request: NewDirectory = parse_json(body)?;
        let name = required(request.name, "name")?;
        let parent = ctx.item_id()?;
        let user = state.auth.authenticate_request(ctx.authorization())?;

        let id = state.vfs.create_directory(parent, &name, user)?;
        info!(file_id = id, parent, name = %name, "Created directory");
        ctx.pending.fill(StatusCode::OK.into_response())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Rename {
    new_name: Option<String>,
}

/// PATCH /api/files/{id} - rename an entry
pub struct RenameFile;

impl BodyHandler for RenameFile {
    fn on_body(&self, state: &AppState, ctx: &mut RequestContext, body: &[u8]) -> Result<(), ApiError> {
        let request: Rename = parse_json(body)?;
        let new_name = required(request.new_name, "newName")?;
        let id = ctx.item_id()?;
        let user = state.auth.authenticate_request(ctx.authorization())?;

        state.vfs.rename_entry(id, &new_name, user)?;
        ctx.pending.fill(StatusCode::OK.into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{bearer_for, store_file, test_state};
    use crate::ErrorDomain;
    use axum::http::Method;
    use nas_vfs::{Filesystem, ROOT_DIRECTORY_ID};

    fn ctx(state: &AppState, method: Method, id: FileId) -> RequestContext {
        RequestContext::new(method, format!("/api/files/{id}"))
            .with_item_param(id.to_string())
            .with_authorization(bearer_for(state, 1))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_directory_entry_json() {
        let dir = DirectoryEntry::from(FileMetadata {
            file_id: 3,
            parent_id: Some(0),
            name: "docs".into(),
            is_directory: true,
            owner_id: 1,
            size: 0,
            last_modified: 0,
        });
        assert_eq!(
            serde_json::to_value(dir).unwrap(),
            serde_json::json!({"id": 3, "name": "docs", "isDirectory": true, "ownerID": 1})
        );

        let file = DirectoryEntry::from(FileMetadata {
            file_id: 4,
            parent_id: Some(3),
            name: "a.txt".into(),
            is_directory: false,
            owner_id: 1,
            size: 12,
            last_modified: 1_700_000_000,
        });
        let json = serde_json::to_value(file).unwrap();
        assert_eq!(json["size"], 12);
        assert_eq!(json["lastModified"], 1_700_000_000);
    }

    #[tokio::test]
    async fn test_list_and_download() {
        let (state, fs) = test_state();
        let id = store_file(&fs, ROOT_DIRECTORY_ID, "notes.txt", b"hello", 1);

        let listing = GetFile
            .handle(&state, &mut ctx(&state, Method::GET, ROOT_DIRECTORY_ID))
            .unwrap()
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body_bytes(listing).await).unwrap();
        assert_eq!(json["data"][0]["name"], "notes.txt");
        assert_eq!(json["data"][0]["size"], 5);

        let download = GetFile.handle(&state, &mut ctx(&state, Method::GET, id)).unwrap().unwrap();
        assert_eq!(download.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(body_bytes(download).await, b"hello");
    }

    #[test]
    fn test_read_requires_token() {
        let (state, _) = test_state();
        let mut ctx = RequestContext::new(Method::GET, "/api/files/0").with_item_param("0");
        let err = GetFile.handle(&state, &mut ctx).unwrap_err();
        assert_eq!(err.domain(), ErrorDomain::Unauthorized);
    }

    #[test]
    fn test_missing_entry_is_file_error() {
        let (state, _) = test_state();
        let err = GetFile.handle(&state, &mut ctx(&state, Method::GET, 999)).unwrap_err();
        assert_eq!(err.domain(), ErrorDomain::File);
    }

    #[test]
    fn test_create_rename_delete() {
        let (state, fs) = test_state();

        let mut create = ctx(&state, Method::POST, ROOT_DIRECTORY_ID);
        CreateDirectory.on_body(&state, &mut create, br#"{"name":"photos"}"#).unwrap();
        assert!(create.pending.is_filled());
        let dir = fs.list_directory(ROOT_DIRECTORY_ID).unwrap()[0].file_id;

        let mut rename = ctx(&state, Method::PATCH, dir);
        RenameFile.on_body(&state, &mut rename, br#"{"newName":"pictures"}"#).unwrap();
        assert_eq!(fs.metadata(dir).unwrap().name, "pictures");

        DeleteFile.handle(&state, &mut ctx(&state, Method::DELETE, dir)).unwrap();
        assert!(fs.list_directory(ROOT_DIRECTORY_ID).unwrap().is_empty());
    }

    #[test]
    fn test_rename_requires_new_name() {
        let (state, _) = test_state();
        let mut rename = ctx(&state, Method::PATCH, 1);
        let err = RenameFile.on_body(&state, &mut rename, br#"{"name":"x"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Missing newName field in request body");
    }

    #[test]
    fn test_delete_root_is_vfs_error() {
        let (state, _) = test_state();
        let err = DeleteFile
            .handle(&state, &mut ctx(&state, Method::DELETE, ROOT_DIRECTORY_ID))
            .unwrap_err();
        assert_eq!(err.domain(), ErrorDomain::Vfs);
    }
}
