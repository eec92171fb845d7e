pub mod listing;
pub mod download;
pub mod archive;
