//! Background polling that keeps the cache warm.
//!
//! Every configured provider gets its own tokio task that wakes on a fixed
//! interval, fetches the provider's latest transactions and writes them into
//! the shared cache. A separate one-shot task fetches from all providers at
//! once right after [`BackgroundFetcher::start`] so the cache is populated
//! before the first interval elapses.
//!
//! ```text
//! BackgroundFetcher
//!     ├── poll task (stripe) ──┐
//!     ├── poll task (vipps)  ──┼──> Cache
//!     ├── poll task (zettle) ──┘
//!     └── initial fetch (all providers, concurrently)
//! ```

use super::{CACHE_TTL, PROVIDER_FETCH_LIMIT, Providers};
use crate::domain::ports::{CacheHandle, ProviderHandle};
use crate::domain::transaction::PaymentSource;
use crate::error::AggregatorError;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

struct Workers {
    stop: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

pub struct BackgroundFetcher {
    cache: CacheHandle,
    providers: Providers,
    interval: Duration,
    fetch_timeout: Duration,
    // Only touched by start/stop.
    workers: Mutex<Option<Workers>>,
    // Never held across an await, so is_running does not wait on start/stop.
    running: RwLock<bool>,
}

impl BackgroundFetcher {
    pub fn new(cache: CacheHandle, providers: Providers, interval: Duration) -> Self {
        Self {
            cache,
            providers,
            interval,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            workers: Mutex::new(None),
            running: RwLock::new(false),
        }
    }

    /// Overrides the per-fetch deadline (30 seconds by default).
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        *self.running.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_running(&self, running: bool) {
        *self.running.write().unwrap_or_else(PoisonError::into_inner) = running;
    }

    /// Starts one polling task per provider plus the initial fetch.
    ///
    /// Cancelling `cancel` ends every task, as does [`BackgroundFetcher::stop`].
    /// Calling this while already running does nothing.
    pub async fn start(&self, cancel: &CancellationToken) {
        let mut workers = self.workers.lock().await;
        if workers.is_some() {
            warn!("Background fetcher is already running");
            return;
        }

        info!(interval_secs = self.interval.as_secs(), "Starting background transaction fetcher");

        let stop = CancellationToken::new();
        let mut handles = Vec::with_capacity(self.providers.len() + 1);

        for poller in self.pollers() {
            handles.push(tokio::spawn(poller.run(
                self.interval,
                stop.clone(),
                cancel.clone(),
            )));
        }
        handles.push(tokio::spawn(initial_fetch(
            self.pollers(),
            stop.clone(),
            cancel.clone(),
        )));

        *workers = Some(Workers { stop, handles });
        self.set_running(true);
    }

    fn pollers(&self) -> Vec<Poller> {
        self.providers
            .iter()
            .map(|(source, provider)| Poller {
                source,
                provider: provider.clone(),
                cache: self.cache.clone(),
                fetch_timeout: self.fetch_timeout,
            })
            .collect()
    }

    /// Signals every task to finish and waits until all of them have exited.
    /// Does nothing when not running.
    pub async fn stop(&self) {
        let mut workers = self.workers.lock().await;
        let Some(Workers { stop, handles }) = workers.take() else {
            return;
        };

        info!("Stopping background transaction fetcher");
        stop.cancel();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Background fetch task ended abnormally");
            }
        }

        self.set_running(false);
        info!("Background transaction fetcher stopped");
    }
}

/// Fetches from one provider into the cache.
struct Poller {
    source: PaymentSource,
    provider: ProviderHandle,
    cache: CacheHandle,
    fetch_timeout: Duration,
}

impl Poller {
    async fn run(self, interval: Duration, stop: CancellationToken, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(provider = %self.source, "Started background fetcher for provider");

        loop {
            tokio::select! {
                _ = stop.cancelled() => {
                    info!(provider = %self.source, "Stopping background fetcher for provider");
                    return;
                }
                _ = cancel.cancelled() => {
                    info!(provider = %self.source, "Cancelled, stopping background fetcher for provider");
                    return;
                }
                _ = ticker.tick() => {
                    self.fetch_into_cache(&stop, &cancel).await;
                }
            }
        }
    }

    /// One fetch cycle. Failures are logged and the cycle skipped; the next
    /// tick tries again.
    async fn fetch_into_cache(&self, stop: &CancellationToken, cancel: &CancellationToken) {
        let started = Instant::now();
        debug!(provider = %self.source, "Fetching transactions from provider");

        let fetch = tokio::time::timeout(
            self.fetch_timeout,
            self.provider.latest_transactions(PROVIDER_FETCH_LIMIT),
        );
        let result = tokio::select! {
            _ = stop.cancelled() => return,
            _ = cancel.cancelled() => return,
            result = fetch => result,
        };

        let result = result.unwrap_or(Err(AggregatorError::Timeout {
            provider: self.source,
        }));
        let transactions = match result {
            Ok(transactions) => transactions,
            Err(e) => {
                error!(provider = %self.source, error = %e, "Failed to fetch transactions from provider");
                return;
            }
        };

        let count = transactions.len();
        for transaction in transactions {
            let key = transaction.external_id.clone();
            self.cache.set_transaction(&key, transaction, CACHE_TTL).await;
        }

        info!(
            provider = %self.source,
            count,
            duration_ms = started.elapsed().as_millis() as u64,
            "Successfully fetched and cached transactions"
        );
    }
}

async fn initial_fetch(pollers: Vec<Poller>, stop: CancellationToken, cancel: CancellationToken) {
    info!("Performing initial data fetch from all providers");
    futures::future::join_all(
        pollers
            .iter()
            .map(|poller| poller.fetch_into_cache(&stop, &cancel)),
    )
    .await;
    info!("Initial data fetch completed");
}
