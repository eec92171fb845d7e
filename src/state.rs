use std::sync::Arc;
use std::time::Duration;

use pubdisk_api::client::DiskClient;

use crate::cache::{FileCache, MemoryCache};
use crate::config;
use crate::error;
use crate::template::Templates;

#[derive(Debug)]
pub struct Shared {
    templates: Templates,
    disk: DiskClient,
    cache: Arc<dyn FileCache>,
    cache_ttl: Duration,
    download_concurrency: usize,
    request_timeout: Duration,
}

pub type ArcShared = Arc<Shared>;

impl Shared {
    pub fn new(templates: Templates, disk: DiskClient, cache: Arc<dyn FileCache>) -> Self {
        Shared {
            templates,
            disk,
            cache,
            cache_ttl: Duration::from_secs(300),
            download_concurrency: 4,
            request_timeout: Duration::from_secs(90),
        }
    }

    pub fn from_config(config: &config::Config) -> error::Result<Shared> {
        tracing::debug!("creating Shared state");

        let settings = &config.settings;
        let disk = DiskClient::builder()
            .base(settings.disk.api_base.clone())
            .timeout(settings.disk.timeout)
            .connect_timeout(settings.disk.connect_timeout)
            .user_agent(settings.disk.user_agent.clone())
            .limit(settings.disk.limit)
            .build()?;
        let cache = Arc::new(MemoryCache::new(settings.cache.max_capacity));

        Ok(Shared::new(Templates::from_config(config)?, disk, cache)
            .with_cache_ttl(settings.cache.ttl)
            .with_download_concurrency(settings.download.concurrency)
            .with_request_timeout(settings.request_timeout))
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_download_concurrency(mut self, concurrency: usize) -> Self {
        self.download_concurrency = concurrency;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn templates(&self) -> &Templates {
        &self.templates
    }

    pub fn disk(&self) -> &DiskClient {
        &self.disk
    }

    pub fn cache(&self) -> &dyn FileCache {
        self.cache.as_ref()
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    pub fn download_concurrency(&self) -> usize {
        self.download_concurrency
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}
