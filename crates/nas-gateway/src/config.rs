//! Gateway configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One physical disk exposed through the VFS
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskConfig {
    pub id: u32,
    pub mount_point: String,
    /// Capacity in bytes
    pub capacity: u64,
}

/// Account created at startup when the store has none by that name
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
}

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// PEM private key used to sign tokens
    pub private_key_path: PathBuf,
    /// PEM public key used to verify tokens
    pub public_key_path: PathBuf,
    /// Maximum JSON request body size (bytes)
    pub max_body_size: usize,
    /// Maximum upload request size (bytes)
    pub max_upload_size: u64,
    /// Disks managed by the VFS
    pub disks: Vec<DiskConfig>,
    /// Optional initial account
    pub seed_user: Option<SeedUser>,
    /// Enable CORS
    pub cors_enabled: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 80,
            private_key_path: PathBuf::from("/etc/nas/private.pem"),
            public_key_path: PathBuf::from("/etc/nas/public.pem"),
            max_body_size: 16 * 1024, // 16 KB
            max_upload_size: 4 * 1024 * 1024 * 1024, // 4 GB
            disks: vec![DiskConfig {
                id: 0,
                mount_point: "/sd".to_string(),
                capacity: 32 * 1024 * 1024 * 1024, // 32 GB
            }],
            seed_user: None,
            cors_enabled: true,
        }
    }
}

impl GatewayConfig {
    /// Layer defaults, an optional config file and `NAS_*` environment variables
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("NAS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Upload limit as a body limit for the HTTP layer
    pub fn upload_limit(&self) -> usize {
        usize::try_from(self.max_upload_size).unwrap_or(usize::MAX)
    }
}
