//! `/search`: product lookup by name
//!
//! The search term is pasted into the SQL text. A leading `%` lets callers
//! add their own wildcards (`Wid%`), and a quote in the term ends the string
//! literal early.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::literal;
use crate::config::AppState;
use crate::error::AppError;
use crate::http;

/// SQL text for a search term, built by concatenation
pub fn build_query(term: &str) -> String {
    format!("SELECT * FROM products WHERE name LIKE '%{term}'")
}

pub async fn search(state: &AppState, term: &str) -> Result<Response<Full<Bytes>>, AppError> {
    let sql = build_query(term);
    let store = state.store.clone();
    let rows = tokio::task::spawn_blocking(move || store.raw_query(&sql)).await??;

    Ok(http::build_ok_response(
        literal::format_rows(&rows),
        &state.config.http.default_content_type,
    ))
}
