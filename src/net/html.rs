use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::net::error;
use crate::template::Templates;

#[inline]
pub fn html_response(status: StatusCode, contents: String) -> error::Result<Response> {
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CONTENT_LENGTH, contents.len())
        .body(Body::from(contents))?)
}

/// renders a registered template into an html response
pub fn render_page<T>(
    templates: &Templates,
    name: &str,
    status: StatusCode,
    data: &T
) -> error::Result<Response>
where
    T: Serialize
{
    let contents = templates.render(name, data)?;

    html_response(status, contents)
}
