//! Per-client fixed-window rate limiting

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::AppError;
use super::AppState;
use cryptfile_core::Limits;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Table size above which idle clients are pruned
const PRUNE_THRESHOLD: usize = 10_000;

/// Network part of an IPv6 address
const IPV6_PREFIX_MASK: u128 = u128::MAX << 64;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Windows per client, plus when idle clients were last swept
#[derive(Default)]
struct ClientTable {
    windows: HashMap<IpAddr, Vec<Window>>,
    last_prune: Option<Instant>,
}

impl ClientTable {
    /// Drop clients none of whose windows are still running.
    ///
    /// Runs at most once per `interval`, and only while the table is over
    /// `PRUNE_THRESHOLD`.
    fn prune(&mut self, now: Instant, interval: Duration, idle_after: Duration) {
        if self.windows.len() <= PRUNE_THRESHOLD {
            return;
        }
        if self
            .last_prune
            .is_some_and(|at| now.duration_since(at) < interval)
        {
            return;
        }

        let before = self.windows.len();
        self.windows.retain(|_, windows| {
            windows
                .iter()
                .any(|w| now.duration_since(w.started) < idle_after)
        });
        self.last_prune = Some(now);
        debug!(
            removed = before - self.windows.len(),
            remaining = self.windows.len(),
            "Pruned idle rate-limit clients"
        );
    }
}

/// Rate-limit key for a peer address. IPv6 peers are grouped by their /64;
/// IPv4-mapped addresses count as the IPv4 client they carry.
fn client_key(addr: IpAddr) -> IpAddr {
    match addr {
        IpAddr::V4(_) => addr,
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => IpAddr::V4(v4),
            None => IpAddr::V6(Ipv6Addr::from(u128::from(v6) & IPV6_PREFIX_MASK)),
        },
    }
}

/// Counts requests per client over minute, hour and day windows.
///
/// A limit of zero disables that window.
pub struct RateLimiter {
    quotas: Vec<(Duration, u32)>,
    clients: Mutex<ClientTable>,
}

impl RateLimiter {
    pub fn new(limits: &Limits) -> Self {
        let quotas = [
            (MINUTE, limits.max_requests_per_minute),
            (HOUR, limits.max_requests_per_hour),
            (DAY, limits.max_requests_per_day),
        ]
        .into_iter()
        .filter(|(_, limit)| *limit > 0)
        .collect();

        Self {
            quotas,
            clients: Mutex::new(ClientTable::default()),
        }
    }

    /// Record a request from `client`.
    ///
    /// Returns how long to wait when any window is exhausted. Rejected
    /// requests are not counted.
    pub async fn check(&self, client: IpAddr) -> Result<(), Duration> {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: IpAddr, now: Instant) -> Result<(), Duration> {
        // Quotas are ordered shortest first
        let (Some((shortest, _)), Some((longest, _))) = (self.quotas.first(), self.quotas.last())
        else {
            return Ok(());
        };

        let mut table = self.clients.lock().await;
        table.prune(now, *shortest, *longest);

        let windows = table.windows.entry(client_key(client)).or_insert_with(|| {
            self.quotas
                .iter()
                .map(|_| Window {
                    started: now,
                    count: 0,
                })
                .collect()
        });

        let mut retry_after = None;
        for (window, (period, limit)) in windows.iter_mut().zip(&self.quotas) {
            let elapsed = now.duration_since(window.started);
            if elapsed >= *period {
                window.started = now;
                window.count = 0;
            } else if window.count >= *limit {
                let wait = *period - elapsed;
                retry_after = Some(retry_after.map_or(wait, |w: Duration| w.max(wait)));
            }
        }

        if let Some(wait) = retry_after {
            return Err(wait);
        }

        for window in windows.iter_mut() {
            window.count += 1;
        }
        Ok(())
    }
}

/// Middleware rejecting clients over their quota with 429
pub async fn enforce(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = connect_info
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if let Err(wait) = state.limiter.check(client).await {
        warn!(%client, retry_after = wait.as_secs(), "rate limit exceeded");
        return Err(AppError::TooManyRequests {
            retry_after_secs: wait.as_secs().max(1),
        });
    }

    Ok(next.run(request).await)
}
