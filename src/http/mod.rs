//! HTTP protocol layer module
//!
//! Request parsing and response building shared by every route handler,
//! decoupled from what the handlers do with the input.

pub mod multipart;
pub mod query;
pub mod response;

// Re-export commonly used items
pub use multipart::{read_file_field, UploadedFile};
pub use query::{get_param, param_or};
pub use response::{
    build_404_response, build_405_response, build_413_response, build_500_response,
    build_html_response, build_ok_response, build_redirect_response, with_server_header,
};
