//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use campaign_relay::config::AppConfig;
use campaign_relay::http::AppState;
use campaign_relay::store::SqliteStore;
use campaign_relay::{HttpServer, Shutdown};

/// A mock tracking endpoint that records the request heads it receives.
#[allow(dead_code)]
pub struct MockTracker {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockTracker {
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// First request head, lower-cased for header matching.
    pub fn first_request(&self) -> String {
        self.requests.lock().unwrap()[0].to_lowercase()
    }
}

/// Start a mock tracker answering every request with a fixed JSON body.
#[allow(dead_code)]
pub async fn start_mock_tracker(status: u16, body: &'static str) -> MockTracker {
    start_programmable_backend(move || async move { (status, body.to_string()) }).await
}

/// Start a programmable mock backend with async support.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> MockTracker
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let seen = seen.clone();
                    tokio::spawn(async move {
                        let head = read_head(&mut socket).await;
                        seen.lock().unwrap().push(head);

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockTracker { addr, requests }
}

#[allow(dead_code)]
async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Config whose tracking calls go to `tracker` over plain HTTP.
#[allow(dead_code)]
pub fn config_for_tracker(tracker: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.tracking.scheme = "http".into();
    config.tracking.host_override = Some(tracker.to_string());
    config.tracking.timeout_ms = 1000;
    config.tracking.bypass_proxy = true;
    config
}

/// Address nothing listens on.
#[allow(dead_code)]
pub fn dead_address() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

/// A relay serving on an ephemeral port with an in-memory store.
#[allow(dead_code)]
pub struct RunningRelay {
    pub addr: SocketAddr,
    pub state: AppState,
    pub shutdown: Shutdown,
}

#[allow(dead_code)]
impl RunningRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

#[allow(dead_code)]
pub async fn start_relay(config: AppConfig) -> RunningRelay {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let server = HttpServer::with_store(config, store).unwrap();
    let state = server.state().clone();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    RunningRelay {
        addr,
        state,
        shutdown,
    }
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
