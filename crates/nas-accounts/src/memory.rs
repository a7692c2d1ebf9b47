//! In-memory credential store

use crate::password::PasswordHash;
use crate::{CredentialStore, Result, StoreError, UserData, UserId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

struct Account {
    username: String,
    password: PasswordHash,
}

struct Inner {
    accounts: BTreeMap<UserId, Account>,
    next_id: UserId,
}

impl Inner {
    fn username_taken(&self, username: &str, except: Option<UserId>) -> bool {
        self.accounts
            .iter()
            .any(|(id, a)| a.username == username && Some(*id) != except)
    }

    fn account_mut(&mut self, id: UserId) -> Result<&mut Account> {
        self.accounts.get_mut(&id).ok_or(StoreError::NoSuchUser(id))
    }
}

/// Accounts kept in memory; ids start at 1
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                accounts: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn authenticate(&self, username: &str, password: &str) -> Result<Option<UserData>> {
        let inner = self.inner.read();
        Ok(inner
            .accounts
            .iter()
            .find(|(_, a)| a.username == username)
            .filter(|(_, a)| a.password.verify(password))
            .map(|(id, a)| UserData {
                id: *id,
                username: a.username.clone(),
            }))
    }

    fn get_user(&self, id: UserId) -> Result<Option<UserData>> {
        Ok(self.inner.read().accounts.get(&id).map(|a| UserData {
            id,
            username: a.username.clone(),
        }))
    }

    fn create_user(&self, username: &str, password: &str) -> Result<UserData> {
        let mut inner = self.inner.write();
        if inner.username_taken(username, None) {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.accounts.insert(
            id,
            Account {
                username: username.to_string(),
                password: PasswordHash::new(password),
            },
        );
        debug!(user_id = id, "Created user");
        Ok(UserData {
            id,
            username: username.to_string(),
        })
    }

    fn delete_user(&self, id: UserId) -> Result<()> {
        if self.inner.write().accounts.remove(&id).is_none() {
            return Err(StoreError::NoSuchUser(id));
        }
        debug!(user_id = id, "Deleted user");
        Ok(())
    }

    fn update_username(&self, id: UserId, username: &str) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.username_taken(username, Some(id)) {
            return Err(StoreError::UsernameTaken(username.to_string()));
        }
        inner.account_mut(id)?.username = username.to_string();
        Ok(())
    }

    fn update_password(&self, id: UserId, password: &str) -> Result<()> {
        self.inner.write().account_mut(id)?.password = PasswordHash::new(password);
        Ok(())
    }
}
