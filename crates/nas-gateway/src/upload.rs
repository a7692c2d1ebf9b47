//! Chunked upload state machine
//!
//! An upload moves `Init → Receiving → Finalized` as chunks arrive. The first
//! chunk (offset 0) declares the file and reserves its space, every non-empty
//! chunk is appended in delivery order, and the final chunk closes the file
//! and parks a `200 OK` in the request's pending slot. The reply is only sent
//! by the completion handler once the whole request has been read.

use crate::dispatcher::UploadHandler;
use crate::{ApiError, AppState, RequestContext};
use axum::{http::StatusCode, response::IntoResponse};
use nas_vfs::{FileHandle, FileId, FileMetadata, Filesystem, OwnerId};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// One delivery from the transport
#[derive(Clone, Copy, Debug)]
pub struct UploadChunk<'a> {
    pub filename: &'a str,
    /// Offset of `data` within the file
    pub offset: u64,
    pub data: &'a [u8],
    /// Set on the last delivery of the file
    pub is_final: bool,
}

/// Where and for whom a new file is declared
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadTarget {
    pub parent_id: FileId,
    pub owner_id: OwnerId,
    pub declared_size: u64,
}

/// An open file being filled by one request.
///
/// Dropping a session that was never finished discards the partial file.
pub struct UploadSession {
    vfs: Arc<dyn Filesystem>,
    handle: FileHandle,
    finished: bool,
}

impl UploadSession {
    fn open(vfs: Arc<dyn Filesystem>, filename: &str, target: UploadTarget) -> Result<Self, ApiError> {
        let handle = vfs.open_file(
            target.parent_id,
            filename,
            target.declared_size,
            target.owner_id,
        )?;
        Ok(Self {
            vfs,
            handle,
            finished: false,
        })
    }

    pub fn file_id(&self) -> FileId {
        self.handle.file_id()
    }

    pub fn bytes_written(&self) -> u64 {
        self.handle.written()
    }

    fn append(&mut self, data: &[u8]) -> Result<(), ApiError> {
        self.vfs.write_file(&mut self.handle, data)?;
        Ok(())
    }

    fn finish(mut self) -> Result<FileMetadata, ApiError> {
        let metadata = self.vfs.close_file(&self.handle)?;
        self.finished = true;
        Ok(metadata)
    }
}

impl Drop for UploadSession {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(
            file_id = self.handle.file_id(),
            written = self.handle.written(),
            declared = self.handle.declared_size(),
            "Upload did not complete, discarding partial file"
        );
        if let Err(e) = self.vfs.discard_file(&self.handle) {
            warn!(error = %e, "Failed to discard partial file");
        }
    }
}

impl fmt::Debug for UploadSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSession")
            .field("handle", &self.handle)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Upload progress of a request
#[derive(Debug, Default)]
pub enum UploadState {
    #[default]
    Init,
    Receiving(UploadSession),
    Finalized(FileMetadata),
}

impl UploadState {
    /// `Init → Receiving`: declare the file.
    ///
    /// A request opens at most one file.
    pub fn open(
        &mut self,
        vfs: Arc<dyn Filesystem>,
        filename: &str,
        target: UploadTarget,
    ) -> Result<(), ApiError> {
        if !matches!(self, Self::Init) {
            return Err(ApiError::validation("Only one file can be uploaded per request"));
        }
        *self = Self::Receiving(UploadSession::open(vfs, filename, target)?);
        Ok(())
    }

    /// Append data to the open file
    pub fn append(&mut self, data: &[u8]) -> Result<(), ApiError> {
        match self {
            Self::Receiving(session) => session.append(data),
            _ => Err(ApiError::validation("No upload in progress")),
        }
    }

    /// `Receiving → Finalized`: close the file
    pub fn finalize(&mut self) -> Result<FileMetadata, ApiError> {
        match std::mem::take(self) {
            Self::Receiving(session) => {
                let metadata = session.finish()?;
                *self = Self::Finalized(metadata.clone());
                Ok(metadata)
            }
            other => {
                *self = other;
                Err(ApiError::validation("No upload in progress"))
            }
        }
    }

    pub fn is_receiving(&self) -> bool {
        matches!(self, Self::Receiving(_))
    }

    pub fn session(&self) -> Option<&UploadSession> {
        match self {
            Self::Receiving(session) => Some(session),
            _ => None,
        }
    }
}

/// PUT /api/files/{parent} - chunked file upload
pub struct UploadFile;

impl UploadFile {
    fn declared_size(ctx: &RequestContext) -> Result<u64, ApiError> {
        let raw = ctx
            .query_param("size")
            .ok_or_else(|| ApiError::validation("Missing size parameter"))?;
        raw.parse()
            .map_err(|_| ApiError::validation(format!("Invalid size parameter: {raw}")))
    }
}

impl UploadHandler for UploadFile {
    fn on_chunk(
        &self,
        state: &AppState,
        ctx: &mut RequestContext,
        chunk: UploadChunk<'_>,
    ) -> Result<(), ApiError> {
        if chunk.offset == 0 {
            let declared_size = Self::declared_size(ctx)?;
            let parent_id = ctx.item_id()?;
            let owner_id = state.auth.authenticate_request(ctx.authorization())?;

            ctx.upload.open(
                Arc::clone(&state.vfs),
                chunk.filename,
                UploadTarget {
                    parent_id,
                    owner_id,
                    declared_size,
                },
            )?;
            info!(parent_id, owner_id, declared_size, filename = chunk.filename, "Upload started");
        }

        if !chunk.data.is_empty() {
            ctx.upload.append(chunk.data)?;
        }

        if chunk.is_final {
            let metadata = ctx.upload.finalize()?;
            info!(file_id = metadata.file_id, size = metadata.size, "Upload finished");
            ctx.pending.fill(StatusCode::OK.into_response())?;
        }

        Ok(())
    }
}
