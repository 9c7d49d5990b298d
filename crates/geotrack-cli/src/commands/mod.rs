pub mod health;
pub mod openapi;
pub mod serve;

pub use health::HealthCommand;
pub use openapi::OpenApiCommand;
pub use serve::ServeCommand;
