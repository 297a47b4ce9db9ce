//! HTTP middleware.

pub mod forward_auth;
pub mod request_logger;

pub use forward_auth::ForwardAuthorization;
pub use request_logger::{ArtifactOutcome, REQUEST_ID_HEADER, RequestLogger};
