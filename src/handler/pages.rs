//! Static pages: the landing page and the upload form

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::http;

const INDEX_HTML: &str = r#"
    <h1>DevSecOps Demo App</h1>
    <a href="/search">Search</a> |
    <a href="/upload">Upload</a> |
    <a href="/user">User Info</a>
    "#;

const UPLOAD_FORM_HTML: &str = r#"
    <form method="post" enctype="multipart/form-data">
        <input type="file" name="file">
        <input type="submit">
    </form>
    "#;

pub fn index() -> Response<Full<Bytes>> {
    http::build_html_response(INDEX_HTML)
}

pub fn upload_form() -> Response<Full<Bytes>> {
    http::build_html_response(UPLOAD_FORM_HTML)
}
