use std::sync::Arc;
use std::time::Duration;

use pubdisk_api::client::DiskClient;
use pubdisk_api::error::{ApiError, DiskKind};
use pubdisk_lib::filter::{self, FilterSelector};

use crate::cache::{CacheKey, FileCache, Records};
use crate::net::error::client_api_error;

/// outcome of a listing, always carrying what was asked for so the page can
/// show it back
#[derive(Debug)]
pub enum RenderResult {
    Files {
        public_link: String,
        selector: FilterSelector,
        records: Records,
        cached: bool,
    },
    Failed {
        public_link: String,
        selector: FilterSelector,
        error: ApiError,
    }
}

impl RenderResult {
    pub fn public_link(&self) -> &str {
        match self {
            RenderResult::Files { public_link, .. } |
            RenderResult::Failed { public_link, .. } => public_link,
        }
    }

    pub fn selector(&self) -> &FilterSelector {
        match self {
            RenderResult::Files { selector, .. } |
            RenderResult::Failed { selector, .. } => selector,
        }
    }
}

/// lists the files at a public link filtered by the selector. a cached
/// listing is used while it is still valid, otherwise the filtered result of
/// a fresh upstream call is stored. failures are never cached
pub async fn list_files(
    client: &DiskClient,
    cache: &dyn FileCache,
    public_link: &str,
    selector: FilterSelector,
    ttl: Duration,
) -> RenderResult {
    let key = CacheKey::new(public_link, &selector);

    if let Some(records) = cache.get(&key) {
        tracing::debug!(key = %key, count = records.len(), "listing cache hit");

        return RenderResult::Files {
            public_link: public_link.to_owned(),
            selector,
            records,
            cached: true,
        };
    }

    tracing::debug!(key = %key, "listing cache miss");

    match client.list_resources(public_link).await {
        Ok(list) => {
            let records: Records = Arc::new(filter::filter(list, &selector));

            cache.put(key, records.clone(), ttl);

            RenderResult::Files {
                public_link: public_link.to_owned(),
                selector,
                records,
                cached: false,
            }
        }
        Err(err) => {
            tracing::warn!(
                status = ?err.upstream_status(),
                timeout = err.is_timeout(),
                "listing failed for public link: {err}"
            );

            RenderResult::Failed {
                public_link: public_link.to_owned(),
                selector,
                error: client_api_error(&err, DiskKind::ListFailed),
            }
        }
    }
}
