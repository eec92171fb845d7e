use axum::response::{IntoResponse, Response};
use pubdisk_api::client::error::ClientError;
use tracing::Level;

pub use pubdisk_api::error::{
    Detail,
    ApiErrorKind,
    ApiError,
    GeneralKind,
    DiskKind,
};

use crate::disk::download::DownloadError;

type BoxDynError = Box<dyn std::error::Error + Send + Sync>;

/// request level error. the inner ApiError is what the caller sees, the
/// source is only logged
#[derive(Debug)]
pub struct Error {
    inner: ApiError,
    context: Option<String>,
    src: Option<BoxDynError>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new() -> Self {
        Error {
            inner: Default::default(),
            context: None,
            src: None,
        }
    }

    pub fn api<T>(value: T) -> Self
    where
        T: Into<ApiError>
    {
        Error {
            inner: value.into(),
            context: None,
            src: None
        }
    }

    pub fn context<C>(mut self, ctx: C) -> Self
    where
        C: Into<String>
    {
        self.context = Some(ctx.into());
        self
    }

    pub fn source<S>(mut self, src: S) -> Self
    where
        S: Into<BoxDynError>
    {
        self.src = Some(src.into());
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.inner, &self.context, &self.src) {
            (inner, Some(cxt), Some(err)) => write!(f, "inner: {}\ncxt: {}\nerr: {}", inner, cxt, err),
            (inner, Some(cxt), None) => write!(f, "inner: {}\ncxt: {}", inner, cxt),
            (inner, None, Some(err)) => write!(f, "inner: {}\nerr: {}", inner, err),
            (inner, None, None) => write!(f, "inner: {}", inner)
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.src.as_ref().map(|v| & **v as _)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Some(err) = self.src.as_ref() {
            match &self.context {
                Some(cxt) => tracing::event!(
                    Level::ERROR,
                    "unhandled error when processing request: {cxt}: {err:#?}"
                ),
                None => tracing::event!(
                    Level::ERROR,
                    "unhandled error when processing request: {err:#?}"
                )
            }
        }

        self.inner.into_response()
    }
}

impl From<ApiError> for Error {
    fn from(api_err: ApiError) -> Self {
        Error {
            inner: api_err,
            context: None,
            src: None,
        }
    }
}

/// maps an upstream client failure to what the caller is shown. transport
/// failures that are not timeouts get `transport_kind`
pub fn client_api_error(err: &ClientError, transport_kind: DiskKind) -> ApiError {
    if err.is_timeout() {
        return ApiError::from(GeneralKind::UpstreamTimeout)
            .with_message("the disk service did not respond in time");
    }

    match err {
        ClientError::UpstreamList(status) => ApiError::from((
            DiskKind::ListFailed,
            Detail::Upstream(*status),
            "failed to list files for the public link"
        )),
        ClientError::UpstreamDownload(status) => ApiError::from((
            DiskKind::DownloadFailed,
            Detail::Upstream(*status),
            "failed to retrieve a download link"
        )),
        ClientError::Fetch(status) => ApiError::from((
            DiskKind::FetchFailed,
            Detail::Upstream(*status),
            "failed to fetch the file contents"
        )),
        ClientError::InvalidHref(_) => ApiError::from((
            DiskKind::DownloadFailed,
            "the disk service returned an invalid download link"
        )),
        ClientError::InvalidBase => ApiError::from(GeneralKind::InternalFailure),
        ClientError::Transport(_) => ApiError::from((
            transport_kind,
            "failed to communicate with the disk service"
        )),
    }
}

impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        let inner = client_api_error(&err, DiskKind::DownloadFailed);

        Error::api(inner).source(err)
    }
}

impl From<DownloadError> for Error {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::NoFilesSelected => Error::api((
                DiskKind::NoFilesSelected,
                Detail::with_key("path"),
                "select at least one file to download"
            )),
            DownloadError::NothingFetched(count) => Error::api((
                DiskKind::FetchFailed,
                format!("none of the {count} selected files could be fetched")
            )),
            DownloadError::Client(err) => Self::from(err),
            DownloadError::Archive(_) |
            DownloadError::Join(_) => Error::new()
                .context("failed to create zip archive")
                .source(err),
        }
    }
}

macro_rules! simple_from {
    ($e:path) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::new()
                    .source(err)
            }
        }
    };
    ($e:path, $k:expr) => {
        impl From<$e> for Error {
            fn from(err: $e) -> Self {
                Error::api($k)
                    .source(err)
            }
        }
    };
}

simple_from!(std::io::Error);

simple_from!(axum::Error);
simple_from!(axum::http::Error);
simple_from!(
    axum::http::header::InvalidHeaderValue,
    GeneralKind::InvalidHeaderValue
);

simple_from!(handlebars::RenderError);

simple_from!(serde_json::Error);
