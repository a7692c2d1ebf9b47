//! Physical storage volumes

use serde::{Deserialize, Serialize};

/// Identifier of a physical disk
pub type DiskId = u32;

/// A physical volume and its space accounting
#[derive(Clone, Debug)]
pub struct Disk {
    id: DiskId,
    mount_point: String,
    capacity: u64,
    used: u64,
    online: bool,
}

impl Disk {
    pub fn new(id: DiskId, mount_point: impl Into<String>, capacity: u64) -> Self {
        Self {
            id,
            mount_point: mount_point.into(),
            capacity,
            used: 0,
            online: true,
        }
    }

    pub fn id(&self) -> DiskId {
        self.id
    }

    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Bytes not yet used or reserved
    pub fn free(&self) -> u64 {
        self.capacity.saturating_sub(self.used)
    }

    /// Reserve `bytes`; returns false when there is not enough room
    pub fn reserve(&mut self, bytes: u64) -> bool {
        if bytes > self.free() {
            return false;
        }
        self.used += bytes;
        true
    }

    pub fn release(&mut self, bytes: u64) {
        self.used = self.used.saturating_sub(bytes);
    }

    pub fn info(&self) -> DiskInfo {
        DiskInfo {
            id: self.id,
            mount_point: self.mount_point.clone(),
            capacity: self.capacity,
            used: self.used,
            online: self.online,
        }
    }
}

/// Read-only snapshot of a disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub id: DiskId,
    pub mount_point: String,
    pub capacity: u64,
    pub used: u64,
    pub online: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reservation_accounting() {
        let mut disk = Disk::new(0, "/sd", 100);
        assert!(disk.reserve(60));
        assert!(!disk.reserve(41));
        assert_eq!(disk.free(), 40);

        disk.release(60);
        assert_eq!(disk.free(), 100);
    }

    #[test]
    fn test_release_never_underflows() {
        let mut disk = Disk::new(0, "/sd", 10);
        disk.release(5);
        assert_eq!(disk.info().used, 0);
    }
}
