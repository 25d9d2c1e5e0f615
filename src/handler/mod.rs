//! Request handler module
//!
//! Responsible for request routing dispatch and the per-route handlers. Each
//! handler takes one raw request parameter and passes it to its sink as is.

pub mod deserialize;
pub mod literal;
pub mod pages;
pub mod render;
pub mod router;
pub mod search;
pub mod upload;
pub mod user;

// Re-export main entry point
pub use router::{dispatch, handle_request, respond, RequestContext, Route};
