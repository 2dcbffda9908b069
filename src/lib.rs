pub mod config;
pub mod storage;
pub mod task;
pub mod web;

use std::sync::Arc;

use config::ServerConfig;
use storage::Storage;
use web::csrf::TokenSigner;

/// Shared application state passed to every request handler.
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Storage,
    /// Signs and verifies the per-action anti-forgery tokens.
    pub signer: TokenSigner,
    pub started_at: std::time::Instant,
}

impl AppContext {
    pub fn new(config: Arc<ServerConfig>, storage: Storage, signer: TokenSigner) -> Self {
        Self {
            config,
            storage,
            signer,
            started_at: std::time::Instant::now(),
        }
    }
}
