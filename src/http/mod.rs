//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, dispatch)
//!     → request.rs (request ID, request context)
//!     → body.rs (parse JSON, validate against schema)
//!     → [route handler]
//!     → response.rs (envelopes) / error_handler.rs (errors)
//!     → Send to client
//! ```

pub mod body;
pub mod error_handler;
pub mod request;
pub mod response;
pub mod server;

pub use body::{parse_and_validate, parse_body, validate_body, BodySchema, Violation};
pub use error_handler::handle_error;
pub use request::{RequestContext, RequestId, X_REQUEST_ID};
pub use response::{send_error, send_success, ErrorOptions, Reply};
pub use server::{build_router, AppState};
