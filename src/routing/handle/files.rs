use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Utc};
use pubdisk_lib::filter::{FilterSelector, MimeGroup};
use pubdisk_lib::fs::FileRecord;
use pubdisk_lib::validation::public_link_valid;
use serde::{Deserialize, Serialize};
use url::form_urlencoded::Serializer;

use crate::disk::listing::{list_files, RenderResult};
use crate::net::{self, error};
use crate::routing::handle::index_page;
use crate::state::ArcShared;
use crate::template::FILES_PAGE;

#[derive(Deserialize)]
pub struct FilesQuery {
    public_link: Option<String>,
    file_type: Option<String>,
    group: Option<String>,
}

#[derive(Serialize)]
struct GroupOption {
    name: &'static str,
    selected: bool,
}

#[derive(Serialize)]
struct RecordContext<'a> {
    name: &'a str,
    path: &'a str,
    is_file: bool,
    media_type: Option<&'a str>,
    mime_type: Option<&'a str>,
    size: Option<u64>,
    modified: Option<String>,
    download_href: String,
}

#[derive(Serialize)]
struct FilesContext<'a> {
    public_link: &'a str,
    filter: &'a str,
    file_type: &'a str,
    groups: Vec<GroupOption>,
    records: Vec<RecordContext<'a>>,
    cached: bool,
    error: Option<String>,
}

fn download_href(public_link: &str, path: &str) -> String {
    let query = Serializer::new(String::new())
        .append_pair("public_link", public_link)
        .append_pair("path", path)
        .finish();

    format!("/download?{query}")
}

fn format_time(time: &Option<DateTime<Utc>>) -> Option<String> {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
}

fn record_context<'a>(public_link: &str, record: &'a FileRecord) -> RecordContext<'a> {
    RecordContext {
        name: &record.name,
        path: &record.path,
        is_file: record.is_file(),
        media_type: record.media_type.as_deref(),
        mime_type: record.mime_type.as_deref(),
        size: record.size,
        modified: format_time(&record.modified),
        download_href: download_href(public_link, &record.path),
    }
}

/// a named group wins over the coarse type when both are given
fn selector_from(file_type: Option<String>, group: Option<String>) -> FilterSelector {
    if let Some(group) = group.filter(|g| !g.is_empty()) {
        let selector = FilterSelector::group(&group);

        if selector.is_all() {
            tracing::debug!(group = %group, "unknown filter group, listing unfiltered");
        }

        return selector;
    }

    FilterSelector::media(file_type.unwrap_or_default())
}

pub async fn get(
    State(state): State<ArcShared>,
    Query(FilesQuery { public_link, file_type, group }): Query<FilesQuery>,
) -> error::Result<Response> {
    let given = public_link.unwrap_or_default();
    let public_link = given.trim();

    if !public_link_valid(public_link) {
        return index_page(&state, StatusCode::BAD_REQUEST, public_link, Some("a valid public link is required"));
    }

    let selector = selector_from(file_type, group);
    let result = list_files(
        state.disk(),
        state.cache(),
        public_link,
        selector,
        state.cache_ttl()
    ).await;

    let selected_group = match result.selector() {
        FilterSelector::Group(group) => Some(*group),
        _ => None,
    };
    let file_type = match result.selector() {
        FilterSelector::Media(media_type) => media_type.as_str(),
        _ => "",
    };
    let groups = [MimeGroup::Documents, MimeGroup::Images].into_iter()
        .map(|group| GroupOption {
            name: group.name(),
            selected: selected_group == Some(group),
        })
        .collect();

    let (status, records, cached, error) = match &result {
        RenderResult::Files { records, cached, .. } => (
            StatusCode::OK,
            records.iter()
                .map(|record| record_context(public_link, record))
                .collect(),
            *cached,
            None
        ),
        RenderResult::Failed { error, .. } => (
            error.status(),
            Vec::new(),
            false,
            Some(error.message()
                .unwrap_or("failed to list files")
                .to_owned())
        )
    };

    net::html::render_page(state.templates(), FILES_PAGE, status, &FilesContext {
        public_link: result.public_link(),
        filter: result.selector().label(),
        file_type,
        groups,
        records,
        cached,
        error,
    })
}
