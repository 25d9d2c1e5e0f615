//! HTTP response building module
//!
//! Provides builders for the status codes the route table produces.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SERVER};
use hyper::Response;

/// Build 200 response with the given content type
pub fn build_ok_response(body: impl Into<Bytes>, content_type: &str) -> Response<Full<Bytes>> {
    let body = body.into();
    Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", body.len())
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build generic HTML response
pub fn build_html_response(content: impl Into<Bytes>) -> Response<Full<Bytes>> {
    build_ok_response(content, "text/html; charset=utf-8")
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", allow)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(Full::new(Bytes::from("405 Method Not Allowed")))
        })
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(413)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("413 Payload Too Large")))
        .unwrap_or_else(|e| {
            log_build_error("413", &e);
            Response::new(Full::new(Bytes::from("413 Payload Too Large")))
        })
}

/// Build 500 Internal Server Error response, optionally exposing the cause
pub fn build_500_response(detail: Option<&str>) -> Response<Full<Bytes>> {
    let body = match detail {
        Some(detail) => format!("500 Internal Server Error\n\n{detail}"),
        None => "500 Internal Server Error".to_string(),
    };
    Response::builder()
        .status(500)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error("500", &e);
            Response::new(Full::new(Bytes::from("500 Internal Server Error")))
        })
}

/// Build 302 redirect response pointing exactly at `target`
///
/// Fails when `target` is not a legal header value.
pub fn build_redirect_response(target: &str) -> Result<Response<Full<Bytes>>, hyper::http::Error> {
    Response::builder()
        .status(302)
        .header("Location", target)
        .body(Full::new(Bytes::new()))
}

/// Stamp the configured `Server` header onto a response
pub fn with_server_header(mut resp: Response<Full<Bytes>>, server_name: &str) -> Response<Full<Bytes>> {
    if let Ok(value) = HeaderValue::from_str(server_name) {
        resp.headers_mut().insert(SERVER, value);
    }
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_redirect_keeps_target_verbatim() {
        let resp = build_redirect_response("https://evil.example/landing?x=1").unwrap();
        assert_eq!(resp.status(), 302);
        assert_eq!(
            resp.headers().get("Location").unwrap(),
            "https://evil.example/landing?x=1"
        );
        assert_eq!(body_string(resp).await, "");
    }

    #[test]
    fn test_redirect_rejects_header_breaking_target() {
        assert!(build_redirect_response("/ok\r\nSet-Cookie: a=b").is_err());
    }

    #[tokio::test]
    async fn test_500_detail() {
        let resp = build_500_response(Some("Database error: boom"));
        assert_eq!(resp.status(), 500);
        assert!(body_string(resp).await.contains("boom"));

        let resp = build_500_response(None);
        assert_eq!(body_string(resp).await, "500 Internal Server Error");
    }

    #[test]
    fn test_server_header() {
        let resp = with_server_header(build_404_response(), "Demo/1.0");
        assert_eq!(resp.headers().get(SERVER).unwrap(), "Demo/1.0");
    }
}
