// Server loop module
// Accepts connections until the shutdown future resolves

use std::future::Future;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop on `listener` until `shutdown` completes.
///
/// Must run inside a `LocalSet`: connections are served with `spawn_local`.
/// Connections still in flight when the loop exits finish in the background.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                logger::log_info("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_config(dir: &std::path::Path) -> Config {
        let mut config = Config::load_from("does/not/exist/config").unwrap();
        config.database.path = dir.join("app.db").to_string_lossy().into_owned();
        config.upload.dir = dir.to_string_lossy().into_owned();
        config.logging.access_log = false;
        config
    }

    /// Send raw request bytes and read until the server closes or resets
    async fn send_raw(addr: std::net::SocketAddr, request: &[u8]) -> String {
        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(request).await.unwrap();
        let mut response = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => response.extend_from_slice(&buf[..n]),
            }
        }
        String::from_utf8_lossy(&response).into_owned()
    }

    async fn http_get(addr: std::net::SocketAddr, target: &str) -> String {
        let request = format!("GET {target} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        send_raw(addr, request.as_bytes()).await
    }

    /// Run `client` against a server started with `config`, then stop it
    async fn with_server<F, Fut>(config: Config, client: F)
    where
        F: FnOnce(std::net::SocketAddr) -> Fut,
        Fut: Future<Output = ()>,
    {
        let state = Arc::new(AppState::new(&config).unwrap());
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(start_server_loop(listener, state, async {
                    let _ = stop_rx.await;
                }));
                client(addr).await;
                stop_tx.send(()).unwrap();
                server.await.unwrap();
            })
            .await;
    }

    fn upload_head(extra: &str) -> String {
        format!(
            "POST /upload HTTP/1.1\r\nHost: localhost\r\n\
             Content-Type: multipart/form-data; boundary=XBOUNDARYX\r\n\
             {extra}Connection: close\r\n\r\n"
        )
    }

    fn big_form() -> Vec<u8> {
        crate::http::multipart::encode_form("XBOUNDARYX", "file", Some("big.txt"), &[b'a'; 1024])
    }

    #[tokio::test]
    async fn test_serves_over_tcp() {
        let dir = tempfile::tempdir().unwrap();
        with_server(test_config(dir.path()), |addr| async move {
            let response = http_get(addr, "/redirect?url=https%3A%2F%2Fevil.example%2F").await;
            assert!(response.starts_with("HTTP/1.1 302"), "got: {response}");
            assert!(response.contains("location: https://evil.example/\r\n"));
            assert!(response.contains("server: DevSecOps-Demo/0.1\r\n"));

            let response = http_get(addr, "/search?q=Gizmo").await;
            assert!(response.ends_with("[(3, 'Gizmo', 29.5)]"), "got: {response}");
        })
        .await;
    }

    #[tokio::test]
    async fn test_content_length_over_limit_is_413() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.http.max_body_size = 16;

        with_server(config, |addr| async move {
            let form = big_form();
            let mut request = upload_head(&format!("Content-Length: {}\r\n", form.len())).into_bytes();
            request.extend_from_slice(&form);

            let response = send_raw(addr, &request).await;
            assert!(response.starts_with("HTTP/1.1 413"), "got: {response}");
        })
        .await;
        assert!(!dir.path().join("big.txt").exists());
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit_is_413() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        config.http.max_body_size = 16;

        with_server(config, |addr| async move {
            let form = big_form();
            let mut request = upload_head("Transfer-Encoding: chunked\r\n").into_bytes();
            request.extend_from_slice(format!("{:x}\r\n", form.len()).as_bytes());
            request.extend_from_slice(&form);
            request.extend_from_slice(b"\r\n0\r\n\r\n");

            let response = send_raw(addr, &request).await;
            assert!(response.starts_with("HTTP/1.1 413"), "got: {response}");
        })
        .await;
        assert!(!dir.path().join("big.txt").exists());
    }

    #[tokio::test]
    async fn test_chunked_body_within_limit_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        with_server(test_config(dir.path()), |addr| async move {
            let form = crate::http::multipart::encode_form("XBOUNDARYX", "file", Some("small.txt"), b"ok");
            let mut request = upload_head("Transfer-Encoding: chunked\r\n").into_bytes();
            request.extend_from_slice(format!("{:x}\r\n", form.len()).as_bytes());
            request.extend_from_slice(&form);
            request.extend_from_slice(b"\r\n0\r\n\r\n");

            let response = send_raw(addr, &request).await;
            assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
        })
        .await;
        assert_eq!(std::fs::read(dir.path().join("small.txt")).unwrap(), b"ok");
    }
}
