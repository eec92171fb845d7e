pub mod error;
pub mod mime;
pub mod layer;
pub mod html;
pub mod attachment;
