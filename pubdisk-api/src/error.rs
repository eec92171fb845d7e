use http::StatusCode;
use axum_core::response::{IntoResponse, Response};
use serde::{Serialize, Deserialize};
use strum::{AsRefStr as StrumAsRefStr};

use crate::response::{serialize_json, error_json};

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum DiskKind {
    ListFailed,
    DownloadFailed,
    FetchFailed,
    NoFilesSelected,
    InvalidLink,
}

impl std::fmt::Display for DiskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&DiskKind> for StatusCode {
    fn from(kind: &DiskKind) -> Self {
        match kind {
            DiskKind::ListFailed |
            DiskKind::DownloadFailed |
            DiskKind::FetchFailed => StatusCode::BAD_GATEWAY,
            DiskKind::NoFilesSelected |
            DiskKind::InvalidLink => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    StrumAsRefStr,
    Serialize, Deserialize
)]
pub enum GeneralKind {
    InternalFailure,
    Timeout,
    UpstreamTimeout,

    NotFound,

    MissingData,
    InvalidHeaderValue,
    InvalidMethod,
}

impl std::fmt::Display for GeneralKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self.as_ref(), f)
    }
}

impl From<&GeneralKind> for StatusCode {
    fn from(kind: &GeneralKind) -> StatusCode {
        match kind {
            GeneralKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
            GeneralKind::Timeout => StatusCode::REQUEST_TIMEOUT,
            GeneralKind::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GeneralKind::NotFound => StatusCode::NOT_FOUND,
            GeneralKind::MissingData |
            GeneralKind::InvalidHeaderValue => StatusCode::BAD_REQUEST,
            GeneralKind::InvalidMethod => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq,
    Serialize, Deserialize
)]
pub enum ApiErrorKind {
    General(GeneralKind),
    Disk(DiskKind),
}

impl std::fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiErrorKind::General(v) => std::fmt::Display::fmt(v, f),
            ApiErrorKind::Disk(v) => std::fmt::Display::fmt(v, f),
        }
    }
}

impl From<GeneralKind> for ApiErrorKind {
    fn from(v: GeneralKind) -> Self {
        ApiErrorKind::General(v)
    }
}

impl From<DiskKind> for ApiErrorKind {
    fn from(v: DiskKind) -> Self {
        ApiErrorKind::Disk(v)
    }
}

impl From<&ApiErrorKind> for StatusCode {
    fn from(kind: &ApiErrorKind) -> Self {
        match kind {
            ApiErrorKind::General(v) => v.into(),
            ApiErrorKind::Disk(v) => v.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Detail {
    Keys(Vec<String>),
    Upstream(u16),
}

impl Detail {
    pub fn with_key(key: impl Into<String>) -> Self {
        Detail::Keys(vec![key.into()])
    }
}

impl std::fmt::Display for Detail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detail::Keys(list) => {
                let mut iter = list.iter();

                if let Some(first) = iter.next() {
                    write!(f, "{}", first)?;

                    for key in iter {
                        write!(f, ",{}", key)?;
                    }
                }
            },
            Detail::Upstream(status) => {
                write!(f, "upstream status {}", status)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    kind: ApiErrorKind,
    detail: Option<Detail>,
    msg: Option<String>,
}

impl ApiError {
    pub fn new() -> Self {
        ApiError {
            kind: ApiErrorKind::General(GeneralKind::InternalFailure),
            detail: None,
            msg: None
        }
    }

    pub fn with_kind<K>(mut self, kind: K) -> Self
    where
        K: Into<ApiErrorKind>
    {
        self.kind = kind.into();
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_message<M>(mut self, msg: M) -> Self
    where
        M: Into<String>
    {
        self.msg = Some(msg.into());
        self
    }

    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    pub fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref()
    }

    pub fn status(&self) -> StatusCode {
        (&self.kind).into()
    }
}

impl std::default::Default for ApiError {
    fn default() -> Self {
        ApiError::new()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }

        if let Some(msg) = &self.msg {
            write!(f, ": {}", msg)?;
        }

        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl<K> From<K> for ApiError
where
    K: Into<ApiErrorKind>
{
    fn from(kind: K) -> Self {
        ApiError {
            kind: kind.into(),
            detail: None,
            msg: None
        }
    }
}

impl<K,M> From<(K, M)> for ApiError
where
    K: Into<ApiErrorKind>,
    M: Into<String>,
{
    fn from((kind, msg): (K, M)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: None,
            msg: Some(msg.into())
        }
    }
}

impl<K> From<(K, Detail)> for ApiError
where
    K: Into<ApiErrorKind>
{
    fn from((kind, detail): (K, Detail)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: Some(detail),
            msg: None
        }
    }
}

impl<K,M> From<(K, Detail, M)> for ApiError
where
    K: Into<ApiErrorKind>,
    M: Into<String>
{
    fn from((kind, detail, msg): (K, Detail, M)) -> Self {
        ApiError {
            kind: kind.into(),
            detail: Some(detail),
            msg: Some(msg.into())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match serialize_json(self.status(), &self) {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("ApiError serialization error {:?}", err);
                error_json()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_status_codes() {
        let cases: [(ApiErrorKind, StatusCode); 7] = [
            (DiskKind::ListFailed.into(), StatusCode::BAD_GATEWAY),
            (DiskKind::DownloadFailed.into(), StatusCode::BAD_GATEWAY),
            (DiskKind::FetchFailed.into(), StatusCode::BAD_GATEWAY),
            (DiskKind::NoFilesSelected.into(), StatusCode::BAD_REQUEST),
            (GeneralKind::InvalidMethod.into(), StatusCode::METHOD_NOT_ALLOWED),
            (GeneralKind::UpstreamTimeout.into(), StatusCode::GATEWAY_TIMEOUT),
            (GeneralKind::NotFound.into(), StatusCode::NOT_FOUND),
        ];

        for (kind, expected) in cases {
            assert_eq!(StatusCode::from(&kind), expected, "kind {}", kind);
        }
    }

    #[test]
    fn display_includes_detail_and_message() {
        let err = ApiError::from((
            DiskKind::ListFailed,
            Detail::Upstream(404),
            "could not list files"
        ));

        assert_eq!(err.to_string(), "ListFailed: upstream status 404: could not list files");
    }

    #[test]
    fn into_response_uses_kind_status() {
        let response = ApiError::from(DiskKind::NoFilesSelected).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
