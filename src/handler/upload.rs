//! `/upload`: stores a posted file under the client-supplied name

use std::path::{Path, PathBuf};

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::config::AppState;
use crate::error::AppError;
use crate::http;

/// Destination for an uploaded file name. `..` segments and absolute names
/// pass straight through `Path::join`.
pub fn destination(upload_dir: &str, file_name: &str) -> PathBuf {
    Path::new(upload_dir).join(file_name)
}

pub async fn upload(
    state: &AppState,
    content_type: Option<&str>,
    body: Bytes,
) -> Result<Response<Full<Bytes>>, AppError> {
    let file = http::read_file_field(content_type, body, "file").await?;
    let dest = destination(&state.config.upload.dir, &file.file_name);
    tokio::fs::write(&dest, &file.data).await?;

    Ok(http::build_ok_response(
        format!("File {} uploaded successfully", file.file_name),
        &state.config.http.default_content_type,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_joins_verbatim() {
        assert_eq!(
            destination("/uploads", "report.pdf"),
            PathBuf::from("/uploads/report.pdf")
        );
        assert_eq!(
            destination("/uploads", "../etc/passwd"),
            PathBuf::from("/uploads/../etc/passwd")
        );
        // An absolute name replaces the directory
        assert_eq!(destination("/uploads", "/tmp/x"), PathBuf::from("/tmp/x"));
    }
}
