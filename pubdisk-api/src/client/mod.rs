use std::time::Duration;

use bytes::Bytes;
use pubdisk_lib::fs::FileRecord;
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;

pub mod error;

use error::ClientError;

pub const DEFAULT_API_BASE: &str = "https://cloud-api.yandex.net/v1/disk/public/resources";

#[derive(Deserialize)]
struct ResourceListing {
    #[serde(rename = "_embedded")]
    embedded: Option<Embedded>,
}

#[derive(Deserialize)]
struct Embedded {
    #[serde(default)]
    items: Vec<FileRecord>,
}

#[derive(Deserialize)]
struct DownloadLink {
    href: String,
}

/// client for the public resources endpoint of the hosting service
#[derive(Debug, Clone)]
pub struct DiskClient {
    client: reqwest::Client,
    base: Url,
    limit: Option<u32>,
}

impl DiskClient {
    pub fn builder() -> DiskClientBuilder {
        DiskClientBuilder {
            base: None,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            agent: None,
            limit: None,
        }
    }

    fn download_endpoint(&self) -> Result<Url, ClientError> {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBase)?
            .pop_if_empty()
            .push("download");

        Ok(url)
    }

    /// lists the items found at the public link. a response without an
    /// embedded item list is an empty listing
    pub async fn list_resources(&self, public_link: &str) -> Result<Vec<FileRecord>, ClientError> {
        let mut request = self.client.get(self.base.clone())
            .query(&[("public_key", public_link)]);

        if let Some(limit) = self.limit {
            request = request.query(&[("limit", limit)]);
        }

        let response = request.send().await?;
        let status = response.status();

        tracing::debug!(
            endpoint = %self.base,
            status = status.as_u16(),
            "resource listing"
        );

        if status != StatusCode::OK {
            return Err(ClientError::UpstreamList(status.as_u16()));
        }

        let listing: ResourceListing = response.json().await?;

        Ok(listing.embedded
            .map(|embedded| embedded.items)
            .unwrap_or_default())
    }

    /// exchanges a file path for a short lived signed url
    pub async fn resolve_download_url(&self, public_link: &str, path: &str) -> Result<Url, ClientError> {
        let endpoint = self.download_endpoint()?;
        let response = self.client.get(endpoint.clone())
            .query(&[("public_key", public_link), ("path", path)])
            .send()
            .await?;
        let status = response.status();

        tracing::debug!(
            endpoint = %endpoint,
            path = path,
            status = status.as_u16(),
            "download link"
        );

        if status != StatusCode::OK {
            return Err(ClientError::UpstreamDownload(status.as_u16()));
        }

        let link: DownloadLink = response.json().await?;

        Url::parse(&link.href).map_err(ClientError::InvalidHref)
    }

    /// starts fetching the signed url, the body is left unread
    pub async fn fetch(&self, href: Url) -> Result<Response, ClientError> {
        let response = self.client.get(href).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ClientError::Fetch(status.as_u16()));
        }

        Ok(response)
    }

    /// fetches the signed url and buffers the whole body
    pub async fn fetch_bytes(&self, href: Url) -> Result<Bytes, ClientError> {
        let response = self.fetch(href).await?;

        Ok(response.bytes().await?)
    }
}

pub struct DiskClientBuilder {
    base: Option<Url>,
    timeout: Duration,
    connect_timeout: Duration,
    agent: Option<String>,
    limit: Option<u32>,
}

impl DiskClientBuilder {
    pub fn base(mut self, base: Url) -> Self {
        self.base = Some(base);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn user_agent<U>(mut self, user_agent: U) -> Self
    where
        U: Into<String>
    {
        self.agent = Some(user_agent.into());
        self
    }

    pub fn limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn build(self) -> Result<DiskClient, ClientError> {
        let base = match self.base {
            Some(base) => base,
            None => Url::parse(DEFAULT_API_BASE).map_err(|_| ClientError::InvalidBase)?,
        };

        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBase);
        }

        let user_agent = self.agent.unwrap_or("pubdisk/0.1.0".into());
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()?;

        Ok(DiskClient {
            client,
            base,
            limit: self.limit,
        })
    }
}
