//! # NAS VFS
//!
//! Virtual filesystem layer unifying several physical disks under integer
//! file and directory identifiers.
//!
//! This crate provides:
//! - **Filesystem trait**: the operations the gateway needs from storage
//! - **Disks**: capacity accounting and online/offline state per volume
//! - **Memory backend**: a complete in-memory implementation
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             NAS Gateway                 │
//! ├─────────────────────────────────────────┤
//! │           Filesystem Trait              │
//! ├─────────────────────────────────────────┤
//! │   Directory tree   │   Open handles     │
//! ├─────────────┬──────┴──────┬─────────────┤
//! │   Disk 0    │   Disk 1    │   Disk N    │
//! └─────────────┴─────────────┴─────────────┘
//! ```

pub mod disk;
pub mod error;
pub mod memory;

pub use disk::{Disk, DiskId, DiskInfo};
pub use error::{DiskError, FileError, Result, VfsError};
pub use memory::MemoryFilesystem;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Identifier of a file or directory entry
pub type FileId = i64;

/// Identifier of the user owning an entry
pub type OwnerId = i64;

/// The root directory always exists and has this id
pub const ROOT_DIRECTORY_ID: FileId = 0;

/// Metadata of a directory entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_id: FileId,
    pub parent_id: Option<FileId>,
    pub name: String,
    pub is_directory: bool,
    pub owner_id: OwnerId,
    /// Size in bytes (zero for directories)
    pub size: u64,
    /// Unix timestamp in seconds
    pub last_modified: i64,
}

/// An open, partially written file.
///
/// The entry does not show up in listings until the handle is closed.
#[derive(Debug, PartialEq, Eq)]
pub struct FileHandle {
    file_id: FileId,
    disk_id: DiskId,
    declared_size: u64,
    written: u64,
}

impl FileHandle {
    pub(crate) fn new(file_id: FileId, disk_id: DiskId, declared_size: u64) -> Self {
        Self {
            file_id,
            disk_id,
            declared_size,
            written: 0,
        }
    }

    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    pub fn disk_id(&self) -> DiskId {
        self.disk_id
    }

    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

/// Operations the gateway needs from the virtual filesystem.
///
/// Implementations serialize their own metadata updates; callers may share a
/// single instance across concurrent requests.
pub trait Filesystem: Send + Sync {
    /// Whether `id` names a directory
    fn is_directory(&self, id: FileId) -> Result<bool>;

    /// Metadata of a single entry
    fn metadata(&self, id: FileId) -> Result<FileMetadata>;

    /// Completed children of a directory
    fn list_directory(&self, id: FileId) -> Result<Vec<FileMetadata>>;

    /// Full contents of a completed file
    fn read_file(&self, id: FileId) -> Result<Bytes>;

    /// Declare a new file of `size` bytes under `parent` and reserve its space
    fn open_file(&self, parent: FileId, name: &str, size: u64, owner: OwnerId) -> Result<FileHandle>;

    /// Append `data` to an open file
    fn write_file(&self, handle: &mut FileHandle, data: &[u8]) -> Result<()>;

    /// Complete an open file; fails if fewer or more bytes than declared were written
    fn close_file(&self, handle: &FileHandle) -> Result<FileMetadata>;

    /// Drop an open file and release its reservation
    fn discard_file(&self, handle: &FileHandle) -> Result<()>;

    /// Create a directory, returning its id
    fn create_directory(&self, parent: FileId, name: &str, owner: OwnerId) -> Result<FileId>;

    /// Rename an entry owned by `user`
    fn rename_entry(&self, id: FileId, new_name: &str, user: OwnerId) -> Result<()>;

    /// Remove an entry (recursively for directories) owned by `user`
    fn remove_entry(&self, id: FileId, user: OwnerId) -> Result<()>;

    /// Snapshot of every disk
    fn disks(&self) -> Vec<DiskInfo>;
}

/// Reject names that cannot be stored as a single path component
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(VfsError::InvalidName(name.to_string()));
    }
    Ok(())
}
