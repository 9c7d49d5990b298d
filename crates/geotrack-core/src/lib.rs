//! Core utilities and types shared across all Geotrack crates

pub mod config;
pub mod error;
pub mod error_builder;
pub mod problemdetails;
pub use problemdetails::ErrorBody;
pub mod types;
pub mod utils;
// Re-export commonly used types
pub use config::*;
pub use error::*;
pub use error_builder::*;
pub use types::*;
pub use utils::*;
