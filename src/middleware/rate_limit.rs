use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;

use crate::error::ApiError;

const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
}

/// Fixed-window request counter keyed by client address
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    message: &'static str,
    skip_successful: bool,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration, message: &'static str) -> Self {
        Self {
            limit,
            window,
            message,
            skip_successful: false,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Give the hit back when the request succeeds
    pub fn skip_successful(mut self) -> Self {
        self.skip_successful = true;
        self
    }

    pub async fn hit(&self, key: &str) -> Decision {
        let now = Instant::now();
        let mut lock = self.windows.lock().await;
        if lock.len() > SWEEP_THRESHOLD {
            let window = self.window;
            lock.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = lock.entry(key.to_string()).or_insert_with(|| Window { started: now, hits: 0 });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.hits = 0;
        }

        let allowed = entry.hits < self.limit;
        if allowed {
            entry.hits += 1;
        }
        Decision {
            allowed,
            limit: self.limit,
            remaining: self.limit.saturating_sub(entry.hits),
        }
    }

    pub async fn refund(&self, key: &str) {
        let mut lock = self.windows.lock().await;
        if let Some(entry) = lock.get_mut(key) {
            entry.hits = entry.hits.saturating_sub(1);
        }
    }
}

/// First `X-Forwarded-For` hop, else the socket peer address
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    let decision = limiter.hit(&key).await;
    if !decision.allowed {
        tracing::warn!(client = %key, "rate limit exceeded");
        let mut response = ApiError::too_many_requests(limiter.message).into_response();
        set_headers(&mut response, decision);
        return response;
    }

    let mut response = next.run(request).await;
    let mut decision = decision;
    if limiter.skip_successful && response.status().as_u16() < 400 {
        limiter.refund(&key).await;
        decision.remaining = (decision.remaining + 1).min(decision.limit);
    }
    set_headers(&mut response, decision);
    response
}

fn set_headers(response: &mut Response, decision: Decision) {
    let headers = response.headers_mut();
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocks_after_limit() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60), "slow down");
        assert!(limiter.hit("10.0.0.1").await.allowed);
        let second = limiter.hit("10.0.0.1").await;
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);
        assert!(!limiter.hit("10.0.0.1").await.allowed);

        // Other clients have their own window
        assert!(limiter.hit("10.0.0.2").await.allowed);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20), "slow down");
        assert!(limiter.hit("k").await.allowed);
        assert!(!limiter.hit("k").await.allowed);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(limiter.hit("k").await.allowed);
    }

    #[tokio::test]
    async fn test_refund_returns_a_hit() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60), "slow down").skip_successful();
        assert!(limiter.hit("k").await.allowed);
        limiter.refund("k").await;
        assert!(limiter.hit("k").await.allowed);
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers, Some(peer)), "127.0.0.1");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");
        assert_eq!(client_key(&HeaderMap::new(), None), "unknown");
    }
}
