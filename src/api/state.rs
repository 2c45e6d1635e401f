use std::sync::Arc;

use crate::aptos::{ChainReader, ChainSubmitter, LocalAccount};
use crate::config::{Config, ConfigError, Network};
use crate::pool::PrivacyPool;

/// Shared, read-only service state. Nothing here is mutated after startup,
/// so requests never contend on it.
pub struct AppState {
    pub pool: PrivacyPool,
    pub network: Network,
    /// `None` when no relayer key is provisioned
    pub relayer: Option<LocalAccount>,
    pub submitter: Arc<dyn ChainSubmitter>,
    pub reader: Arc<dyn ChainReader>,
}

impl AppState {
    /// Wire the service from configuration and one chain backend
    pub fn from_config<C>(config: &Config, chain: Arc<C>) -> Result<Self, ConfigError>
    where
        C: ChainSubmitter + ChainReader + 'static,
    {
        Ok(Self {
            pool: PrivacyPool::new(config.module_address.clone()),
            network: config.network,
            relayer: config.relayer_account()?,
            submitter: chain.clone(),
            reader: chain,
        })
    }

    pub fn has_relayer(&self) -> bool {
        self.relayer.is_some()
    }
}
