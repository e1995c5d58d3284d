pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod db;

pub use db::DbPool;

use anyhow::Result;
use config::Config;

use crate::auth::SessionIssuer;
use crate::db::{UserStore, WordRepository};

/// Shared server state, handed to every handler behind an `Arc`
pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub users: UserStore,
    pub words: WordRepository,
    pub tokens: SessionIssuer,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Result<Self> {
        let tokens = SessionIssuer::new(&config.auth.signing_secret(), config.auth.token_ttl()?);
        Ok(Self::with_issuer(config, db, tokens))
    }

    /// Build state around an existing token issuer
    pub fn with_issuer(config: Config, db: DbPool, tokens: SessionIssuer) -> Self {
        Self {
            users: UserStore::new(db.clone()),
            words: WordRepository::new(db.clone()),
            config,
            db,
            tokens,
        }
    }
}
