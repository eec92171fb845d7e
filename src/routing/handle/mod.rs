use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use pubdisk_lib::validation::public_link_valid;
use serde::{Deserialize, Serialize};
use url::form_urlencoded::Serializer;

use crate::net::{self, error};
use crate::state::ArcShared;
use crate::template::INDEX_PAGE;

pub mod files;
pub mod download;

#[derive(Serialize)]
pub struct IndexContext<'a> {
    pub public_link: &'a str,
    pub message: Option<&'a str>,
}

/// renders the landing page with an optional message
pub fn index_page(
    state: &ArcShared,
    status: StatusCode,
    public_link: &str,
    message: Option<&str>
) -> error::Result<Response> {
    net::html::render_page(
        state.templates(),
        INDEX_PAGE,
        status,
        &IndexContext { public_link, message }
    )
}

pub fn files_location(public_link: &str) -> String {
    let query = Serializer::new(String::new())
        .append_pair("public_link", public_link)
        .finish();

    format!("/files?{query}")
}

#[derive(Deserialize)]
pub struct IndexForm {
    public_link: Option<String>,
}

pub async fn get(
    State(state): State<ArcShared>,
) -> error::Result<Response> {
    index_page(&state, StatusCode::OK, "", None)
}

pub async fn post(
    State(state): State<ArcShared>,
    Form(IndexForm { public_link }): Form<IndexForm>,
) -> error::Result<Response> {
    let given = public_link.unwrap_or_default();
    let trimmed = given.trim();

    if !public_link_valid(trimmed) {
        let message = if trimmed.is_empty() {
            "a public link is required"
        } else {
            "the public link is invalid"
        };

        return index_page(&state, StatusCode::BAD_REQUEST, trimmed, Some(message));
    }

    Ok(Redirect::to(&files_location(trimmed)).into_response())
}
