//! Configuration model loaded from external sources.

use serde::Deserialize;

use crate::db::PoolSettings;
use crate::list::cache::DEFAULT_PAGES_PER_QUERY;

#[derive(Clone, Debug, Deserialize)]
/// Settings shared across handlers.
pub struct ServerConfig {
    pub domain: String,
    pub address: String,
    pub port: u16,
    pub database_url: String,
    pub templates_dir: String,
    pub secret: String,
    pub auth_service_url: String,
    #[serde(default)]
    pub database: PoolSettings,
    /// Pages each list keeps in the shared query cache.
    #[serde(default = "default_cache_pages")]
    pub cache_pages_per_list: usize,
}

fn default_cache_pages() -> usize {
    DEFAULT_PAGES_PER_QUERY
}
