//! Application state

use crate::auth::AuthGateway;
use crate::config::GatewayConfig;
use crate::dispatcher::Dispatcher;
use crate::routes;
use nas_accounts::{CredentialStore, MemoryCredentialStore};
use nas_token::{KeySource, SignatureEngine};
use nas_vfs::{Disk, Filesystem, MemoryFilesystem};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Virtual filesystem spanning the configured disks
    pub vfs: Arc<dyn Filesystem>,
    /// User accounts
    pub accounts: Arc<dyn CredentialStore>,
    /// Token issuance and verification
    pub auth: AuthGateway,
    /// Route table
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// Fails if either key cannot be loaded.
    pub fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let engine = SignatureEngine::from_sources(
            &KeySource::file(&config.private_key_path),
            &KeySource::file(&config.public_key_path),
        )?;
        info!(
            private_key = %config.private_key_path.display(),
            public_key = %config.public_key_path.display(),
            "Loaded signing keys"
        );

        let disks = config
            .disks
            .iter()
            .map(|disk| Disk::new(disk.id, disk.mount_point.clone(), disk.capacity))
            .collect();
        let vfs = MemoryFilesystem::new(disks)?;
        warn!("Using in-memory filesystem (data will not persist)");

        Self::with_collaborators(
            config,
            Arc::new(vfs),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(engine),
        )
    }

    /// Assemble the state around existing collaborators
    pub fn with_collaborators(
        config: GatewayConfig,
        vfs: Arc<dyn Filesystem>,
        accounts: Arc<dyn CredentialStore>,
        engine: Arc<SignatureEngine>,
    ) -> anyhow::Result<Self> {
        if let Some(seed) = &config.seed_user {
            let user = accounts.create_user(&seed.username, &seed.password)?;
            info!(user_id = user.id, username = %user.username, "Created initial user");
        }

        let dispatcher = Dispatcher::new(routes::api_routes(), config.max_body_size)?;
        for route in dispatcher.routes() {
            info!(method = %route.method, pattern = %route.pattern, kind = route.kind, "Registered route");
        }

        Ok(Self {
            config,
            vfs,
            accounts,
            auth: AuthGateway::new(engine),
            dispatcher,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::SeedUser;
    use nas_token::TokenClaims;
    use nas_vfs::{FileId, OwnerId};

    pub(crate) const PRIVATE_PEM: &[u8] = include_bytes!("../tests/fixtures/private.pem");
    pub(crate) const PUBLIC_PEM: &[u8] = include_bytes!("../tests/fixtures/public.pem");

    /// State with one 1 MB disk and the account `admin`/`secret` (id 1)
    pub(crate) fn test_state() -> (Arc<AppState>, Arc<MemoryFilesystem>) {
        let fs = Arc::new(MemoryFilesystem::new(vec![Disk::new(0, "/sd", 1024 * 1024)]).unwrap());
        let config = GatewayConfig {
            seed_user: Some(SeedUser {
                username: "admin".to_string(),
                password: "secret".to_string(),
            }),
            ..Default::default()
        };
        let state = AppState::with_collaborators(
            config,
            Arc::clone(&fs) as Arc<dyn Filesystem>,
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(SignatureEngine::from_pem(PRIVATE_PEM, PUBLIC_PEM).unwrap()),
        )
        .unwrap();
        (Arc::new(state), fs)
    }

    pub(crate) fn bearer_for(state: &AppState, id: i64) -> String {
        let token = state.auth.issue_token(&TokenClaims::new(id, "test")).unwrap();
        format!("Bearer {token}")
    }

    pub(crate) fn store_file(
        fs: &MemoryFilesystem,
        parent: FileId,
        name: &str,
        data: &[u8],
        owner: OwnerId,
    ) -> FileId {
        let mut handle = fs.open_file(parent, name, data.len() as u64, owner).unwrap();
        fs.write_file(&mut handle, data).unwrap();
        fs.close_file(&handle).unwrap().file_id
    }
}
