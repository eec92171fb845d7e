use std::collections::HashSet;

use bytes::Bytes;
use futures::{StreamExt, stream};
use pubdisk_api::client::DiskClient;
use pubdisk_api::client::error::ClientError;
use pubdisk_lib::fs::basename;
use pubdisk_lib::names::unique_names;

use crate::disk::archive::build_archive;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("no files were selected")]
    NoFilesSelected,

    #[error("none of the {0} selected files could be fetched")]
    NothingFetched(usize),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("failed to write zip archive")]
    Archive(#[from] zip::result::ZipError),

    #[error("zip archive task failed")]
    Join(#[from] tokio::task::JoinError),
}

/// a single file whose body has not been read yet
#[derive(Debug)]
pub struct FileDownload {
    pub filename: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub response: reqwest::Response,
}

/// zip archive of the fetched files along with what made it in and what
/// did not
#[derive(Debug)]
pub struct Bundle {
    pub archive: Vec<u8>,
    pub entries: Vec<String>,
    pub skipped: Vec<String>,
}

/// resolves and starts fetching a single file. the suggested name is the
/// last segment of the path
pub async fn download_one(
    client: &DiskClient,
    public_link: &str,
    path: &str,
) -> Result<FileDownload, ClientError> {
    let href = client.resolve_download_url(public_link, path).await?;
    let response = client.fetch(href).await?;

    let content_type = response.headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned);
    let content_length = response.content_length();

    Ok(FileDownload {
        filename: basename(path).to_owned(),
        content_type,
        content_length,
        response,
    })
}

async fn fetch_one(client: &DiskClient, public_link: &str, path: &str) -> Result<Bytes, ClientError> {
    let href = client.resolve_download_url(public_link, path).await?;

    client.fetch_bytes(href).await
}

/// fetches every selected path and bundles them into a zip archive
///
/// paths are fetched with at most `concurrency` requests in flight but the
/// archive keeps selection order. repeated paths are fetched once. a path
/// that fails is skipped, the request only fails when nothing could be
/// fetched.
pub async fn download_many<I, P>(
    client: &DiskClient,
    public_link: &str,
    paths: I,
    concurrency: usize,
) -> Result<Bundle, DownloadError>
where
    I: IntoIterator<Item = P>,
    P: Into<String>,
{
    let mut seen = HashSet::new();
    let mut selected = Vec::new();

    for path in paths {
        let path = path.into();

        if path.is_empty() {
            continue;
        }

        if seen.insert(path.clone()) {
            selected.push(path);
        }
    }

    if selected.is_empty() {
        return Err(DownloadError::NoFilesSelected);
    }

    let total = selected.len();
    let results: Vec<(String, Result<Bytes, ClientError>)> = stream::iter(selected)
        .map(|path| async move {
            let result = fetch_one(client, public_link, &path).await;

            (path, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut fetched = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();

    for (path, result) in results {
        match result {
            Ok(data) => fetched.push((path, data)),
            Err(err) => {
                tracing::warn!(
                    path = %path,
                    status = ?err.upstream_status(),
                    "skipping file in bundle: {err}"
                );

                skipped.push(path);
            }
        }
    }

    if fetched.is_empty() {
        return Err(DownloadError::NothingFetched(total));
    }

    let entries = unique_names(fetched.iter().map(|(path, _)| basename(path)));
    let named: Vec<(String, Bytes)> = entries.iter()
        .cloned()
        .zip(fetched.into_iter().map(|(_, data)| data))
        .collect();

    let archive = tokio::task::spawn_blocking(move || build_archive(named)).await??;

    tracing::debug!(
        entries = entries.len(),
        skipped = skipped.len(),
        bytes = archive.len(),
        "bundle created"
    );

    Ok(Bundle {
        archive,
        entries,
        skipped,
    })
}
