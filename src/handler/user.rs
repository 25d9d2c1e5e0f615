//! `/user`: echoes a user id through the shell

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::process::Command;

use crate::config::AppState;
use crate::error::AppError;
use crate::http;

/// Shell command line for a user id, built by concatenation
pub fn build_command(user_id: &str) -> String {
    format!("echo User ID: {user_id}")
}

/// Run the command line through `sh -c` and return its stdout
///
/// A non-zero exit status is an error carrying the command's stderr.
pub async fn run_shell(command_line: &str) -> Result<Vec<u8>, AppError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command_line)
        .output()
        .await?;

    if !output.status.success() {
        return Err(AppError::Command {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(output.stdout)
}

pub async fn user_info(state: &AppState, user_id: &str) -> Result<Response<Full<Bytes>>, AppError> {
    let stdout = run_shell(&build_command(user_id)).await?;
    Ok(http::build_ok_response(
        stdout,
        &state.config.http.default_content_type,
    ))
}
