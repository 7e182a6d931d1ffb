//! Per-client request quota for the summarize route.
//!
//! A keyed GCRA limiter: each client IP may spend `per_day` requests in a burst,
//! and capacity refills evenly across 24 hours.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use crate::errors::AppError;

const QUOTA_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);
const EVICTION_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    trust_forwarded_for: bool,
}

impl ClientRateLimiter {
    pub fn per_day(requests: u32, trust_forwarded_for: bool) -> Result<Self> {
        let burst = NonZeroU32::new(requests)
            .ok_or_else(|| anyhow!("rate limit must allow at least one request per day"))?;
        let quota = Quota::with_period(QUOTA_WINDOW / requests)
            .ok_or_else(|| anyhow!("rate limit of {requests}/day is too fine-grained"))?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::keyed(quota),
            trust_forwarded_for,
        })
    }

    /// Spends one unit of `ip`'s quota. Returns `false` when the quota is exhausted.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    /// Resolves the key for a request: the first `X-Forwarded-For` hop when the
    /// deployment sits behind a trusted proxy, otherwise the socket peer.
    pub fn client_ip(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
        if self.trust_forwarded_for {
            if let Some(ip) = forwarded_for(headers) {
                return ip;
            }
        }
        peer.map(|addr| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    /// Drops state for clients whose quota has fully refilled.
    pub fn evict_idle(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        debug!("Rate limiter tracking {} client(s)", self.limiter.len());
    }

    /// Periodically evicts idle clients for the lifetime of the process.
    pub fn spawn_eviction(self: &Arc<Self>) {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(EVICTION_INTERVAL);
            loop {
                ticker.tick().await;
                limiter.evict_idle();
            }
        });
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Route-layer middleware: rejects the request with 429 once the client's quota is spent.
pub async fn enforce_quota(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = limiter.client_ip(request.headers(), peer);

    if !limiter.check(ip) {
        warn!("Rate limit exceeded for {ip}");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}
