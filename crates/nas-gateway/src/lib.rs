//! # NAS Gateway
//!
//! REST API of a network attached storage device with several disks.
//!
//! This crate provides:
//! - **Accounts**: login with username and password, user management
//! - **Authentication**: RS256-signed bearer tokens
//! - **Files**: directory listing, download, chunked multipart upload
//! - **Errors**: one JSON envelope with a domain for every failure
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                    NAS Gateway                      │
//! ├─────────────────────────────────────────────────────┤
//! │  Request ID │ Logging │ CORS │ Body Limit           │
//! ├─────────────────────────────────────────────────────┤
//! │  Dispatcher: data phase → completion phase          │
//! ├─────────────────┬─────────────────┬─────────────────┤
//! │  Auth Gateway   │  Upload Machine │  Error Domains  │
//! ├─────────────────┼─────────────────┼─────────────────┤
//! │  nas-token      │  nas-vfs        │  nas-accounts   │
//! └─────────────────┴─────────────────┴─────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod upload;

pub use config::GatewayConfig;
pub use context::{PendingResponse, RequestContext};
pub use error::{ApiError, ErrorDomain};
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
