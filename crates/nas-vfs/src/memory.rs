//! In-memory multi-disk filesystem

use crate::{
    validate_name, Disk, DiskError, DiskId, DiskInfo, FileError, FileHandle, FileId,
    FileMetadata, Filesystem, OwnerId, Result, VfsError, ROOT_DIRECTORY_ID,
};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

struct Entry {
    meta: FileMetadata,
    disk_id: Option<DiskId>,
    complete: bool,
}

struct Inner {
    entries: BTreeMap<FileId, Entry>,
    contents: HashMap<FileId, Vec<u8>>,
    disks: Vec<Disk>,
    next_id: FileId,
}

impl Inner {
    fn entry(&self, id: FileId) -> Result<&Entry> {
        self.entries
            .get(&id)
            .filter(|e| e.complete)
            .ok_or_else(|| FileError::not_found(id).into())
    }

    fn directory(&self, id: FileId) -> Result<&Entry> {
        let entry = self.entry(id)?;
        if !entry.meta.is_directory {
            return Err(FileError::new(format!("not a directory: {id}"), id).into());
        }
        Ok(entry)
    }

    fn online_disk(&self, disk_id: DiskId) -> Result<&Disk> {
        let disk = self
            .disks
            .iter()
            .find(|d| d.id() == disk_id)
            .ok_or(VfsError::UnknownDisk(disk_id))?;
        if !disk.is_online() {
            return Err(DiskError::on_disk(
                format!("disk {disk_id} is offline"),
                disk.mount_point(),
            )
            .into());
        }
        Ok(disk)
    }

    fn release(&mut self, disk_id: DiskId, bytes: u64) {
        if let Some(disk) = self.disks.iter_mut().find(|d| d.id() == disk_id) {
            disk.release(bytes);
        }
    }

    fn name_taken(&self, parent: FileId, name: &str) -> bool {
        self.entries
            .values()
            .any(|e| e.meta.parent_id == Some(parent) && e.meta.name == name)
    }

    fn open_entry(&self, handle: &FileHandle) -> Result<&Entry> {
        self.entries
            .get(&handle.file_id)
            .filter(|e| !e.complete)
            .ok_or_else(|| {
                FileError::new("file is not open for writing", handle.file_id).into()
            })
    }

    fn remove_open(&mut self, handle: &FileHandle) {
        let is_open = self
            .entries
            .get(&handle.file_id)
            .is_some_and(|e| !e.complete);
        if is_open {
            self.entries.remove(&handle.file_id);
            self.contents.remove(&handle.file_id);
            self.release(handle.disk_id, handle.declared_size);
        }
    }

    fn subtree(&self, root: FileId) -> Vec<FileId> {
        let mut ids = vec![root];
        let mut seen: HashSet<FileId> = HashSet::from([root]);
        let mut cursor = 0;
        while cursor < ids.len() {
            let parent = ids[cursor];
            for (id, entry) in &self.entries {
                if entry.meta.parent_id == Some(parent) && seen.insert(*id) {
                    ids.push(*id);
                }
            }
            cursor += 1;
        }
        ids
    }

    fn check_owner(&self, id: FileId, user: OwnerId) -> Result<()> {
        if id == ROOT_DIRECTORY_ID {
            return Err(VfsError::RootImmutable);
        }
        if self.entry(id)?.meta.owner_id != user {
            return Err(VfsError::PermissionDenied { id, user });
        }
        Ok(())
    }
}

/// A complete [`Filesystem`] kept in memory.
///
/// Each new file is placed on the online disk with the most free space.
/// Contents do not survive a restart.
pub struct MemoryFilesystem {
    inner: RwLock<Inner>,
}

impl MemoryFilesystem {
    /// Create a filesystem over `disks` with an empty root directory
    pub fn new(disks: Vec<Disk>) -> Result<Self> {
        if disks.is_empty() {
            return Err(VfsError::Configuration("at least one disk is required".to_string()));
        }
        let mut ids = HashSet::new();
        for disk in &disks {
            if !ids.insert(disk.id()) {
                return Err(VfsError::Configuration(format!("duplicate disk id {}", disk.id())));
            }
        }

        let root = Entry {
            meta: FileMetadata {
                file_id: ROOT_DIRECTORY_ID,
                parent_id: None,
                name: String::new(),
                is_directory: true,
                owner_id: 0,
                size: 0,
                last_modified: now(),
            },
            disk_id: None,
            complete: true,
        };

        Ok(Self {
            inner: RwLock::new(Inner {
                entries: BTreeMap::from([(ROOT_DIRECTORY_ID, root)]),
                contents: HashMap::new(),
                disks,
                next_id: ROOT_DIRECTORY_ID + 1,
            }),
        })
    }

    /// Mark a disk online or offline
    pub fn set_disk_online(&self, disk_id: DiskId, online: bool) -> Result<()> {
        let mut inner = self.inner.write();
        let disk = inner
            .disks
            .iter_mut()
            .find(|d| d.id() == disk_id)
            .ok_or(VfsError::UnknownDisk(disk_id))?;
        disk.set_online(online);
        debug!(disk_id, online, "Disk state changed");
        Ok(())
    }

    /// Number of entries, including the root and open files
    pub fn entry_count(&self) -> usize {
        self.inner.read().entries.len()
    }
}

impl Filesystem for MemoryFilesystem {
    fn is_directory(&self, id: FileId) -> Result<bool> {
        Ok(self.inner.read().entry(id)?.meta.is_directory)
    }

    fn metadata(&self, id: FileId) -> Result<FileMetadata> {
        Ok(self.inner.read().entry(id)?.meta.clone())
    }

    fn list_directory(&self, id: FileId) -> Result<Vec<FileMetadata>> {
        let inner = self.inner.read();
        inner.directory(id)?;
        Ok(inner
            .entries
            .values()
            .filter(|e| e.complete && e.meta.parent_id == Some(id))
            .map(|e| e.meta.clone())
            .collect())
    }

    fn read_file(&self, id: FileId) -> Result<Bytes> {
        let inner = self.inner.read();
        let entry = inner.entry(id)?;
        let Some(disk_id) = entry.disk_id else {
            return Err(FileError::new(format!("is a directory: {id}"), id).into());
        };
        inner.online_disk(disk_id)?;
        Ok(inner
            .contents
            .get(&id)
            .map(|data| Bytes::copy_from_slice(data))
            .unwrap_or_default())
    }

    fn open_file(&self, parent: FileId, name: &str, size: u64, owner: OwnerId) -> Result<FileHandle> {
        validate_name(name)?;
        let mut inner = self.inner.write();
        inner.directory(parent)?;
        if inner.name_taken(parent, name) {
            return Err(VfsError::NameTaken {
                parent,
                name: name.to_string(),
            });
        }

        let disk = inner
            .disks
            .iter_mut()
            .filter(|d| d.is_online() && d.free() >= size)
            .max_by_key(|d| d.free())
            .ok_or_else(|| DiskError::new(format!("not enough free space for {size} bytes")))?;
        disk.reserve(size);
        let disk_id = disk.id();

        let file_id = inner.next_id;
        inner.next_id += 1;
        inner.entries.insert(
            file_id,
            Entry {
                meta: FileMetadata {
                    file_id,
                    parent_id: Some(parent),
                    name: name.to_string(),
                    is_directory: false,
                    owner_id: owner,
                    size,
                    last_modified: now(),
                },
                disk_id: Some(disk_id),
                complete: false,
            },
        );
        inner.contents.insert(file_id, Vec::new());

        debug!(file_id, parent, disk_id, size, "Opened file");
        Ok(FileHandle::new(file_id, disk_id, size))
    }

    fn write_file(&self, handle: &mut FileHandle, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.write();
        inner.open_entry(handle)?;
        inner.online_disk(handle.disk_id)?;

        let len = data.len() as u64;
        if handle.written + len > handle.declared_size {
            return Err(FileError::new(
                format!(
                    "write of {len} bytes at offset {} exceeds declared size {}",
                    handle.written, handle.declared_size
                ),
                handle.file_id,
            )
            .into());
        }

        inner
            .contents
            .entry(handle.file_id)
            .or_default()
            .extend_from_slice(data);
        handle.written += len;
        Ok(())
    }

    fn close_file(&self, handle: &FileHandle) -> Result<FileMetadata> {
        let mut inner = self.inner.write();
        inner.open_entry(handle)?;

        if handle.written != handle.declared_size {
            inner.remove_open(handle);
            return Err(FileError::new(
                format!(
                    "file closed after {} of {} declared bytes",
                    handle.written, handle.declared_size
                ),
                handle.file_id,
            )
            .into());
        }

        let entry = inner
            .entries
            .get_mut(&handle.file_id)
            .ok_or_else(|| FileError::not_found(handle.file_id))?;
        entry.complete = true;
        entry.meta.last_modified = now();
        debug!(file_id = handle.file_id, size = handle.written, "Closed file");
        Ok(entry.meta.clone())
    }

    fn discard_file(&self, handle: &FileHandle) -> Result<()> {
        self.inner.write().remove_open(handle);
        debug!(file_id = handle.file_id, written = handle.written, "Discarded partial file");
        Ok(())
    }

    fn create_directory(&self, parent: FileId, name: &str, owner: OwnerId) -> Result<FileId> {
        validate_name(name)?;
        let mut inner = self.inner.write();
        inner.directory(parent)?;
        if inner.name_taken(parent, name) {
            return Err(VfsError::NameTaken {
                parent,
                name: name.to_string(),
            });
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.insert(
            id,
            Entry {
                meta: FileMetadata {
                    file_id: id,
                    parent_id: Some(parent),
                    name: name.to_string(),
                    is_directory: true,
                    owner_id: owner,
                    size: 0,
                    last_modified: now(),
                },
                disk_id: None,
                complete: true,
            },
        );
        debug!(id, parent, "Created directory");
        Ok(id)
    }

    fn rename_entry(&self, id: FileId, new_name: &str, user: OwnerId) -> Result<()> {
        validate_name(new_name)?;
        let mut inner = self.inner.write();
        inner.check_owner(id, user)?;

        let entry = inner.entry(id)?;
        if entry.meta.name == new_name {
            return Ok(());
        }
        let parent = entry.meta.parent_id.unwrap_or(ROOT_DIRECTORY_ID);
        if inner.name_taken(parent, new_name) {
            return Err(VfsError::NameTaken {
                parent,
                name: new_name.to_string(),
            });
        }

        if let Some(entry) = inner.entries.get_mut(&id) {
            entry.meta.name = new_name.to_string();
            entry.meta.last_modified = now();
        }
        Ok(())
    }

    fn remove_entry(&self, id: FileId, user: OwnerId) -> Result<()> {
        let mut inner = self.inner.write();
        inner.check_owner(id, user)?;

        let ids = inner.subtree(id);
        for disk_id in ids
            .iter()
            .filter_map(|i| inner.entries.get(i).and_then(|e| e.disk_id))
        {
            inner.online_disk(disk_id)?;
        }

        for removed in &ids {
            if let Some(entry) = inner.entries.remove(removed) {
                inner.contents.remove(removed);
                if let Some(disk_id) = entry.disk_id {
                    inner.release(disk_id, entry.meta.size);
                }
            }
        }
        debug!(id, removed = ids.len(), "Removed entry");
        Ok(())
    }

    fn disks(&self) -> Vec<DiskInfo> {
        self.inner.read().disks.iter().map(Disk::info).collect()
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
