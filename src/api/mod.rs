pub mod auth;
pub mod error;
pub mod route;
pub mod webhook;

pub use error::ApiError;
pub use route::create_router;
