//! Multipart form parsing module
//!
//! Pulls a single file field out of an already-buffered `multipart/form-data`
//! body.

use std::convert::Infallible;

use hyper::body::Bytes;

use crate::error::AppError;

/// File part of a multipart form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// File name exactly as the client sent it
    pub file_name: String,
    pub data: Bytes,
}

/// Find the field called `field_name` and return its file name and bytes
///
/// The boundary comes from `content_type`. A missing field, or one sent
/// without a file name, is an error.
pub async fn read_file_field(
    content_type: Option<&str>,
    body: Bytes,
    field_name: &'static str,
) -> Result<UploadedFile, AppError> {
    let boundary = multer::parse_boundary(content_type.unwrap_or_default())?;
    let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(ToString::to_string)
            .ok_or(AppError::MissingField(field_name))?;
        let data = field.bytes().await?;
        return Ok(UploadedFile { file_name, data });
    }

    Err(AppError::MissingField(field_name))
}

#[cfg(test)]
pub(crate) fn encode_form(boundary: &str, field: &str, file_name: Option<&str>, data: &[u8]) -> Vec<u8> {
    let disposition = match file_name {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
