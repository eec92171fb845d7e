use std::error::Error;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("resource listing failed with upstream status {0}")]
    UpstreamList(u16),

    #[error("download link request failed with upstream status {0}")]
    UpstreamDownload(u16),

    #[error("file fetch failed with upstream status {0}")]
    Fetch(u16),

    #[error("upstream returned an invalid download href")]
    InvalidHref(#[source] url::ParseError),

    #[error("api base url cannot be used as a base")]
    InvalidBase,

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// status code received from the hosting service, if any
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ClientError::UpstreamList(status) |
            ClientError::UpstreamDownload(status) |
            ClientError::Fetch(status) => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ClientError::Transport(err) => {
                if err.is_timeout() {
                    return true;
                }

                // body read timeouts surface as io errors further down
                let mut source = err.source();

                while let Some(src) = source {
                    if let Some(io_err) = src.downcast_ref::<std::io::Error>() {
                        if io_err.kind() == std::io::ErrorKind::TimedOut {
                            return true;
                        }
                    }

                    source = src.source();
                }

                false
            }
            _ => false
        }
    }
}
