//! Local HTTP API of a bound repository.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ServiceStartError;
pub use routes::AppState;
pub use server::{ApiOptions, ApiServer, RunningServer, DEFAULT_API_HOST};
