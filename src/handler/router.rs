//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body limits, route table lookup,
//! method checks, dispatch, and the conversion of sink errors into 500s.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};

use super::{deserialize, pages, render, search, upload, user};
use crate::config::AppState;
use crate::error::AppError;
use crate::http;
use crate::logger::{self, AccessLogEntry};

/// Every path the application answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Index,
    Search,
    User,
    Upload,
    Render,
    Deserialize,
    Redirect,
    Connect,
}

/// Route table, exact path match
const ROUTES: &[(&str, Route)] = &[
    ("/", Route::Index),
    ("/search", Route::Search),
    ("/user", Route::User),
    ("/upload", Route::Upload),
    ("/render", Route::Render),
    ("/deserialize", Route::Deserialize),
    ("/redirect", Route::Redirect),
    ("/connect", Route::Connect),
];

impl Route {
    pub fn from_path(path: &str) -> Option<Self> {
        ROUTES
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, route)| *route)
    }

    /// Value for the `Allow` header
    pub const fn allow(self) -> &'static str {
        match self {
            Self::Upload => "GET, HEAD, POST",
            _ => "GET, HEAD",
        }
    }

    pub fn accepts(self, method: &Method) -> bool {
        match *method {
            Method::GET | Method::HEAD => true,
            Method::POST => self == Self::Upload,
            _ => false,
        }
    }
}

/// Request data handed to the route handlers, body already buffered
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RequestContext {
    /// Bodyless request for `target` (path plus optional query)
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method,
            path,
            query,
            content_type: None,
            body: Bytes::new(),
        }
    }

    fn param_or(&self, key: &str, default: &str) -> String {
        http::param_or(self.query.as_deref(), key, default)
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let access_log = state.config.logging.access_log;

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_string(&req, "referer");
    entry.user_agent = header_string(&req, "user-agent");

    logger::log_headers_count(req.headers().len(), state.config.logging.show_headers);

    let max_body_size = state.config.http.max_body_size;
    let too_large = check_body_size(&req, max_body_size);
    let response = match too_large {
        Some(resp) => resp,
        None => match buffer_request(req, max_body_size).await {
            Ok(ctx) => respond(&state, ctx).await,
            Err(AppError::BodyTooLarge { limit }) => {
                logger::log_error(&format!("Request body too large: over {limit} bytes"));
                http::build_413_response()
            }
            Err(e) => error_response(&state, &e),
        },
    };
    let response = http::with_server_header(response, &state.config.http.server_name);

    if access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route a buffered request and turn any sink error into a 500
pub async fn respond(state: &AppState, ctx: RequestContext) -> Response<Full<Bytes>> {
    match dispatch(state, ctx).await {
        Ok(resp) => resp,
        Err(e) => error_response(state, &e),
    }
}

/// Map the path to its handler and pass the raw parameter along
pub async fn dispatch(
    state: &AppState,
    ctx: RequestContext,
) -> Result<Response<Full<Bytes>>, AppError> {
    let Some(route) = Route::from_path(&ctx.path) else {
        return Ok(http::build_404_response());
    };
    if !route.accepts(&ctx.method) {
        logger::log_warning(&format!("Method not allowed: {} {}", ctx.method, ctx.path));
        return Ok(http::build_405_response(route.allow()));
    }

    match route {
        Route::Index => Ok(pages::index()),
        Route::Search => search::search(state, &ctx.param_or("q", "")).await,
        Route::User => user::user_info(state, &ctx.param_or("id", "1")).await,
        Route::Upload if ctx.method == Method::POST => {
            upload::upload(state, ctx.content_type.as_deref(), ctx.body).await
        }
        Route::Upload => Ok(pages::upload_form()),
        Route::Render => render::render(state, &ctx.param_or("template", "Hello World")),
        Route::Deserialize => deserialize::deserialize(state, &ctx.param_or("data", "")).await,
        Route::Redirect => Ok(http::build_redirect_response(&ctx.param_or("url", "/"))?),
        Route::Connect => render::connect(state, &ctx.param_or("host", "localhost")),
    }
}

fn error_response(state: &AppState, error: &AppError) -> Response<Full<Bytes>> {
    let message = error.to_string();
    logger::log_error(&message);
    if state.config.server.debug {
        http::build_500_response(Some(&message))
    } else {
        http::build_500_response(None)
    }
}

/// Read the whole body, at most `max_body_size` bytes, and pull out what the
/// handlers need. Chunked bodies carry no `Content-Length`, so the cap is
/// enforced on the bytes actually read.
async fn buffer_request(
    req: Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Result<RequestContext, AppError> {
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let (parts, body) = req.into_parts();
    let body = Limited::new(body, limit)
        .collect()
        .await
        .map_err(|e| {
            if e.is::<LengthLimitError>() {
                AppError::BodyTooLarge { limit }
            } else {
                AppError::Body(e)
            }
        })?
        .to_bytes();

    Ok(RequestContext {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(ToString::to_string),
        content_type: parts
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        body,
    })
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: hyper::Version) -> &'static str {
    if version == hyper::Version::HTTP_10 {
        "1.0"
    } else if version == hyper::Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}
