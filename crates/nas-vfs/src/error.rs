//! Error types for the nas-vfs crate

use crate::{DiskId, FileId, OwnerId};
use thiserror::Error;

/// Result type alias using `VfsError`
pub type Result<T> = std::result::Result<T, VfsError>;

/// Failure of a storage medium
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DiskError {
    pub message: String,
    /// Mount point of the failing disk, when one is known
    pub mount_point: Option<String>,
}

impl DiskError {
    /// Failure not tied to a single disk
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            mount_point: None,
        }
    }

    /// Failure of a specific disk
    pub fn on_disk(message: impl Into<String>, mount_point: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            mount_point: Some(mount_point.into()),
        }
    }
}

/// Failure concerning a particular file or directory entry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FileError {
    pub message: String,
    pub file_id: Option<FileId>,
}

impl FileError {
    pub fn new(message: impl Into<String>, file_id: FileId) -> Self {
        Self {
            message: message.into(),
            file_id: Some(file_id),
        }
    }

    pub fn not_found(file_id: FileId) -> Self {
        Self::new(format!("no such file or directory: {file_id}"), file_id)
    }
}

/// Errors that can occur in filesystem operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    /// Storage medium failure
    #[error(transparent)]
    Disk(#[from] DiskError),

    /// Failure naming a specific entry
    #[error(transparent)]
    File(#[from] FileError),

    /// Another entry in the directory already has this name
    #[error("name already taken in directory {parent}: {name}")]
    NameTaken { parent: FileId, name: String },

    /// Entry name is not a valid path component
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    /// Caller does not own the entry
    #[error("permission denied: user {user} does not own entry {id}")]
    PermissionDenied { id: FileId, user: OwnerId },

    /// The root directory cannot be renamed or removed
    #[error("the root directory cannot be modified")]
    RootImmutable,

    /// Configured disk set is unusable
    #[error("invalid disk configuration: {0}")]
    Configuration(String),

    /// Referenced disk is unknown
    #[error("unknown disk: {0}")]
    UnknownDisk(DiskId),
}
