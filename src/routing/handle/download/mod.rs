use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use pubdisk_lib::validation::public_link_valid;
use serde::Deserialize;

use crate::disk::download::download_one;
use crate::net::{self, error};
use crate::state::ArcShared;

pub mod bundle;

#[derive(Deserialize)]
pub struct DownloadQuery {
    public_link: Option<String>,
    path: Option<String>,
}

/// the upstream content type unless it is missing or generic, then a guess
/// from the file name
fn content_type_for(upstream: Option<&str>, filename: &str) -> String {
    match upstream {
        Some(given) if !given.is_empty() && !given.starts_with("application/octet-stream") => given.to_owned(),
        _ => net::mime::mime_from_name(filename).to_string()
    }
}

pub async fn get(
    State(state): State<ArcShared>,
    Query(DownloadQuery { public_link, path }): Query<DownloadQuery>,
) -> error::Result<Response> {
    let Some(public_link) = public_link.filter(|link| public_link_valid(link)) else {
        return Err(error::Error::api((
            error::DiskKind::InvalidLink,
            error::Detail::with_key("public_link")
        )));
    };

    let Some(path) = path.filter(|p| !p.is_empty()) else {
        return Err(error::Error::api((
            error::GeneralKind::MissingData,
            error::Detail::with_key("path")
        )));
    };

    let download = download_one(state.disk(), public_link.trim(), &path).await?;

    tracing::debug!(
        path = %path,
        filename = %download.filename,
        length = ?download.content_length,
        "streaming file"
    );

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            content_type_for(download.content_type.as_deref(), &download.filename)
        )
        .header(
            header::CONTENT_DISPOSITION,
            net::attachment::content_disposition(&download.filename)?
        );

    if let Some(length) = download.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    Ok(builder.body(Body::from_stream(download.response.bytes_stream()))?)
}
