//! Test doubles shared by the client tests
//!
//! A minimal loopback HTTP responder stands in for the auth endpoints,
//! and small helpers wrap the framed mock chat server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{timeout, Duration};
use tokio_util::codec::Framed;

use banter_protocol::ServerCodec;

use crate::session::SessionState;

#[derive(Debug, Clone)]
enum LoginMode {
    Accept,
    Reject(String),
}

/// In-process stand-in for the auth endpoints
pub struct MockAuth {
    base_url: String,
    logins: Arc<AtomicUsize>,
    logouts: Arc<AtomicUsize>,
}

impl MockAuth {
    /// Auth server that accepts every login and logout
    pub async fn spawn() -> Self {
        Self::start(LoginMode::Accept, 200).await
    }

    /// Auth server that rejects logins with the given message
    pub async fn spawn_rejecting(message: &str) -> Self {
        Self::start(LoginMode::Reject(message.to_string()), 200).await
    }

    /// Auth server whose logout endpoint always returns 500
    pub async fn spawn_with_failing_logout() -> Self {
        Self::start(LoginMode::Accept, 500).await
    }

    async fn start(login: LoginMode, logout_status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let logins = Arc::new(AtomicUsize::new(0));
        let logouts = Arc::new(AtomicUsize::new(0));

        let login_counter = logins.clone();
        let logout_counter = logouts.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let login = login.clone();
                let logins = login_counter.clone();
                let logouts = logout_counter.clone();
                tokio::spawn(handle_request(
                    stream,
                    login,
                    logout_status,
                    logins,
                    logouts,
                ));
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            logins,
            logouts,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn logout_count(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

async fn handle_request(
    mut stream: TcpStream,
    login: LoginMode,
    logout_status: u16,
    logins: Arc<AtomicUsize>,
    logouts: Arc<AtomicUsize>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    // Read headers
    let header_end = loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > 64 * 1024 {
            return;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    // Read body
    while buf.len() < header_end + content_length {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = &buf[header_end..];

    let path = headers
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("")
        .to_string();

    let (status, reply) = if path.ends_with("/api/auth/login") {
        logins.fetch_add(1, Ordering::SeqCst);
        match login {
            LoginMode::Accept => {
                let name = serde_json::from_slice::<serde_json::Value>(body)
                    .ok()
                    .and_then(|v| v.get("name")?.as_str().map(String::from))
                    .unwrap_or_else(|| "anonymous".to_string());
                (
                    200,
                    serde_json::json!({
                        "token": "test-token",
                        "userId": format!("u-{}", name.to_lowercase()),
                        "name": name,
                    })
                    .to_string(),
                )
            }
            LoginMode::Reject(message) => {
                (400, serde_json::json!({ "message": message }).to_string())
            }
        }
    } else if path.ends_with("/api/auth/logout") {
        logouts.fetch_add(1, Ordering::SeqCst);
        (logout_status, "{}".to_string())
    } else {
        (404, serde_json::json!({ "message": "not found" }).to_string())
    };

    let status_text = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        reply.len(),
        reply
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Bind a listener for a scripted mock chat server
pub async fn chat_listener() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    (listener, addr)
}

/// Accept one client connection, framed with the server-side codec
pub async fn accept_chat(listener: &TcpListener) -> Framed<TcpStream, ServerCodec> {
    let (stream, _) = timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("timed out waiting for client connection")
        .expect("accept failed");
    Framed::new(stream, ServerCodec::new())
}

/// Wait until the published session state satisfies `pred`
pub async fn wait_for_state(
    rx: &mut watch::Receiver<SessionState>,
    pred: impl Fn(&SessionState) -> bool,
) -> SessionState {
    timeout(Duration::from_secs(5), rx.wait_for(|s| pred(s)))
        .await
        .expect("timed out waiting for session state")
        .expect("session controller gone")
        .clone()
}
