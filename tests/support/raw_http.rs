//! Minimal HTTP/1.1 responder for responses wiremock cannot produce.
//!
//! Each route answers with a fixed status, a declared `Content-Length` that
//! may disagree with the body actually sent, and then closes the connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::socket_guard::should_skip_socket_bound_test;

/// Canned response for one path.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// 200 response declaring `content_length` but sending only `body`.
    pub fn declared(content_length: u64, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_length: Some(content_length),
            body: body.into(),
        }
    }
}

/// Running responder; aborted on drop.
pub struct RawServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    task: tokio::task::JoinHandle<()>,
}

impl RawServer {
    /// Starts serving `routes`, or returns `None` when sockets are unavailable.
    pub async fn start(routes: Vec<(&str, RawResponse)>) -> Option<Self> {
        if should_skip_socket_bound_test() {
            return None;
        }
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind raw responder");
        let addr = listener.local_addr().expect("raw responder address");
        let routes: Arc<HashMap<String, RawResponse>> = Arc::new(
            routes
                .into_iter()
                .map(|(path, response)| (path.to_string(), response))
                .collect(),
        );
        let hits = Arc::new(AtomicUsize::new(0));

        let task_hits = Arc::clone(&hits);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                task_hits.fetch_add(1, Ordering::SeqCst);
                let routes = Arc::clone(&routes);
                tokio::spawn(async move {
                    let _ = respond(stream, &routes).await;
                });
            }
        });

        Some(Self {
            base_url: format!("http://{addr}"),
            hits,
            task,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Number of connections accepted so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for RawServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond(
    mut stream: TcpStream,
    routes: &HashMap<String, RawResponse>,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buffer = [0u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buffer[..read]);
    }

    let request_line = String::from_utf8_lossy(&request);
    let path = request_line
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let response = routes.get(&path).cloned().unwrap_or(RawResponse {
        status: 404,
        content_length: Some(0),
        body: Vec::new(),
    });

    let mut head = format!("HTTP/1.1 {} Canned\r\nConnection: close\r\n", response.status);
    if let Some(length) = response.content_length {
        head.push_str(&format!("Content-Length: {length}\r\n"));
    }
    head.push_str("\r\n");

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(&response.body).await?;
    stream.flush().await?;
    stream.shutdown().await
}
