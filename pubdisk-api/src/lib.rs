mod response;

pub mod error;
pub use error::{ApiError, ApiErrorKind, Detail};

#[cfg(feature = "client")]
pub mod client;
