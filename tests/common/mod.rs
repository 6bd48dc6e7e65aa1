//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use txtdirect::config::{Config, Feature};
use txtdirect::dns::{LookupError, TxtResolver};
use txtdirect::lifecycle::Shutdown;
use txtdirect::observability::{FallbackKind, RedirectMetrics};
use txtdirect::record::RecordType;
use txtdirect::{HttpServer, Redirector};

/// TXT answers served from memory, keyed by absolute zone.
#[derive(Default)]
pub struct StaticResolver {
    zones: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    lookups: AtomicUsize,
    queried: Mutex<Vec<String>>,
}

impl StaticResolver {
    pub fn new(records: &[(&str, &str)]) -> Self {
        let mut resolver = Self::default();
        for (zone, txt) in records {
            resolver
                .zones
                .entry(zone.to_string())
                .or_default()
                .push(txt.to_string());
        }
        resolver
    }

    /// Answer `zone` with a server failure.
    pub fn failing(mut self, zone: &str) -> Self {
        self.failing.insert(zone.to_string());
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl TxtResolver for StaticResolver {
    async fn lookup_txt(&self, zone: &str) -> Result<Vec<String>, LookupError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().unwrap().push(zone.to_string());
        if self.failing.contains(zone) {
            return Err(LookupError::Failed {
                zone: zone.to_string(),
                reason: "SERVFAIL".to_string(),
            });
        }
        self.zones
            .get(zone)
            .cloned()
            .ok_or_else(|| LookupError::NotFound {
                zone: zone.to_string(),
            })
    }
}

/// Metrics observer counting every observation by label set.
#[derive(Default)]
pub struct CountingMetrics {
    counts: DashMap<String, u64>,
}

impl CountingMetrics {
    fn bump(&self, key: String) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).map(|v| *v).unwrap_or(0)
    }

    pub fn requests(&self, host: &str) -> u64 {
        self.get(&format!("request:{host}"))
    }

    pub fn statuses(&self, host: &str, status: u16) -> u64 {
        self.get(&format!("status:{host}:{status}"))
    }

    pub fn fallbacks(&self, host: &str, record_type: &str, kind: &str) -> u64 {
        self.get(&format!("fallback:{host}:{record_type}:{kind}"))
    }
}

impl RedirectMetrics for CountingMetrics {
    fn request(&self, host: &str) {
        self.bump(format!("request:{host}"));
    }

    fn status(&self, host: &str, status: StatusCode) {
        self.bump(format!("status:{host}:{}", status.as_u16()));
    }

    fn record_type(&self, host: &str, record_type: RecordType) {
        self.bump(format!("type:{host}:{record_type}"));
    }

    fn fallback(&self, host: &str, record_type: RecordType, kind: FallbackKind) {
        self.bump(format!("fallback:{host}:{record_type}:{}", kind.as_str()));
    }

    fn path(&self, host: &str, path: &str) {
        self.bump(format!("path:{host}:{path}"));
    }
}

/// Config with exactly `features` enabled.
pub fn config_with(features: &[Feature]) -> Config {
    let mut config = Config::default();
    config.redirect.enable = Some(features.iter().copied().collect());
    config
}

/// A redirector over `records`, with its resolver and metrics exposed.
pub fn redirector(
    config: Config,
    records: &[(&str, &str)],
) -> (Arc<Redirector>, Arc<StaticResolver>, Arc<CountingMetrics>) {
    redirector_over(config, StaticResolver::new(records))
}

/// A redirector over a prepared resolver.
pub fn redirector_over(
    config: Config,
    resolver: StaticResolver,
) -> (Arc<Redirector>, Arc<StaticResolver>, Arc<CountingMetrics>) {
    let resolver = Arc::new(resolver);
    let metrics = Arc::new(CountingMetrics::default());
    let redirector = Redirector::new(
        Arc::new(config),
        resolver.clone(),
        metrics.clone(),
    )
    .unwrap();
    (Arc::new(redirector), resolver, metrics)
}

/// Serve `redirector` on an ephemeral port.
pub async fn start_server(redirector: Arc<Redirector>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(redirector);
    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });
    (addr, shutdown)
}

/// HTTP client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Start a mock backend that answers with its request line and headers.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 8192];
                        let n = socket.read(&mut buf).await.unwrap_or(0);
                        let request = String::from_utf8_lossy(&buf[..n]).to_string();
                        let head = request.split("\r\n\r\n").next().unwrap_or("").to_string();
                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nX-Backend: echo\r\nConnection: close\r\n\r\n{}",
                            head.len(),
                            head
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
    addr
}

/// Start a mock backend that answers with the raw bytes following the
/// request head, chunk framing included.
pub async fn start_body_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut received = Vec::new();
                let mut buf = [0u8; 4096];
                let body_start = loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        return;
                    }
                    received.extend_from_slice(&buf[..n]);
                    if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };

                let head = String::from_utf8_lossy(&received[..body_start]).to_lowercase();
                let length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok());
                let chunked = head.contains("transfer-encoding: chunked");

                loop {
                    let body = &received[body_start..];
                    let complete = match length {
                        Some(len) => body.len() >= len,
                        None if chunked => body.ends_with(b"0\r\n\r\n"),
                        None => true,
                    };
                    if complete {
                        break;
                    }
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    received.extend_from_slice(&buf[..n]);
                }

                let body = &received[body_start..];
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nX-Backend: body-echo\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    addr
}
