use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use pubdisk_lib::validation::public_link_valid;
use url::form_urlencoded;

use crate::disk::archive::ARCHIVE_NAME;
use crate::disk::download::{download_many, DownloadError};
use crate::net::{self, error};
use crate::state::ArcShared;

pub const SKIPPED_HEADER: &str = "x-skipped-files";

/// form body with a single `public_link` and any number of `path` values
#[derive(Debug, Default, PartialEq)]
struct BundleForm {
    public_link: Option<String>,
    paths: Vec<String>,
}

impl BundleForm {
    fn parse(body: &[u8]) -> Self {
        let mut form = BundleForm::default();

        for (key, value) in form_urlencoded::parse(body) {
            match key.as_ref() {
                "public_link" => form.public_link = Some(value.into_owned()),
                "path" => if !value.is_empty() {
                    form.paths.push(value.into_owned());
                },
                _ => {}
            }
        }

        form
    }
}

/// accepts any method so the wrong one gets an error body instead of an
/// empty 405
pub async fn handle(
    State(state): State<ArcShared>,
    method: Method,
    body: Bytes,
) -> error::Result<Response> {
    if method != Method::POST {
        return Err(error::Error::api((
            error::GeneralKind::InvalidMethod,
            "use POST to download selected files"
        )));
    }

    let BundleForm { public_link, paths } = BundleForm::parse(&body);

    if paths.is_empty() {
        return Err(DownloadError::NoFilesSelected.into());
    }

    let Some(public_link) = public_link.filter(|link| public_link_valid(link)) else {
        return Err(error::Error::api((
            error::DiskKind::InvalidLink,
            error::Detail::with_key("public_link")
        )));
    };

    let bundle = download_many(
        state.disk(),
        public_link.trim(),
        paths,
        state.download_concurrency()
    ).await?;

    if !bundle.skipped.is_empty() {
        tracing::warn!(
            skipped = bundle.skipped.len(),
            included = bundle.entries.len(),
            "bundle is missing files"
        );
    }

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/zip")
        .header(
            header::CONTENT_DISPOSITION,
            net::attachment::content_disposition(ARCHIVE_NAME)?
        )
        .header(header::CONTENT_LENGTH, bundle.archive.len())
        .header(SKIPPED_HEADER, bundle.skipped.len())
        .body(bundle.archive.into())?)
}
