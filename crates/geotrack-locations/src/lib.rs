//! Location batch ingestion: validation, storage and the HTTP surface

pub mod auth;
pub mod handlers;
pub mod store;
pub mod validator;

pub use auth::{authorize, presented_api_key, ApiKeyGuard, AuthError};
pub use handlers::{build_router, configure_routes, LocationsApiDoc, LocationsAppState};
pub use store::{
    DeviceRef, InMemoryLocationStore, LocationStore, SeaOrmLocationStore, StoreError,
};
pub use validator::{validate_batch, Axis, ValidationFailure};
