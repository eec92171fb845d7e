pub mod error;
pub mod validation;
pub mod names;

pub mod fs;
pub mod filter;
