use super::Providers;
use super::fetcher::{BackgroundFetcher, DEFAULT_POLL_INTERVAL};
use super::pricing::PriceMatcher;
use super::repository::CachedTransactionRepository;
use super::service::TransactionService;
use crate::domain::ports::{Cache, CacheHandle};
use crate::domain::transaction::PaymentSource;
use crate::error::Result;
use crate::infrastructure::feed::FeedProvider;
use crate::infrastructure::in_memory::InMemoryCache;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const DEFAULT_JANITOR_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Everything needed to assemble the application.
#[derive(Debug, Clone)]
pub struct Settings {
    pub prices_path: PathBuf,
    pub feeds: Vec<(PaymentSource, PathBuf)>,
    pub poll_interval: Duration,
    pub janitor_interval: Duration,
}

impl Settings {
    pub fn new(prices_path: impl Into<PathBuf>) -> Self {
        Self {
            prices_path: prices_path.into(),
            feeds: Vec::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            janitor_interval: DEFAULT_JANITOR_INTERVAL,
        }
    }

    pub fn with_feed(mut self, source: PaymentSource, path: impl Into<PathBuf>) -> Self {
        self.feeds.push((source, path.into()));
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Composition root: builds the shared components once and hands out handles.
///
/// A context is single-use: once [`AppContext::shutdown`] has run, `start`
/// does nothing. Build a new context to run again.
pub struct AppContext {
    cache: InMemoryCache,
    prices: Arc<PriceMatcher>,
    fetcher: Arc<BackgroundFetcher>,
    service: TransactionService,
    janitor_interval: Duration,
    shutdown: CancellationToken,
    janitor: Mutex<Option<JoinHandle<()>>>,
}

impl AppContext {
    /// Loads the price list and wires one feed adapter per configured provider.
    /// A malformed price list aborts the build.
    pub async fn build(settings: &Settings) -> Result<Self> {
        let prices = PriceMatcher::from_path(&settings.prices_path)?;
        info!(
            path = %settings.prices_path.display(),
            count = prices.prices().len(),
            "Loaded price list"
        );

        let mut providers = Providers::new();
        for (source, path) in &settings.feeds {
            info!(provider = %source, path = %path.display(), "Configured provider feed");
            providers.insert(*source, Arc::new(FeedProvider::new(*source, path)));
        }

        let mut context = Self::assemble(
            InMemoryCache::new(),
            providers,
            prices,
            settings.poll_interval,
        )
        .await;
        context.janitor_interval = settings.janitor_interval;
        Ok(context)
    }

    /// Wires already constructed parts; the price list is mirrored into the cache.
    pub async fn assemble(
        cache: InMemoryCache,
        providers: Providers,
        prices: PriceMatcher,
        poll_interval: Duration,
    ) -> Self {
        for price in prices.prices() {
            cache.set_price(&price.product, price.clone()).await;
        }

        let prices = Arc::new(prices);
        let cache_handle: CacheHandle = Arc::new(cache.clone());
        let repository = Arc::new(CachedTransactionRepository::new(
            cache_handle.clone(),
            providers.clone(),
        ));
        let fetcher = Arc::new(BackgroundFetcher::new(
            cache_handle,
            providers,
            poll_interval,
        ));
        let service = TransactionService::new(repository, Some(prices.clone()));

        Self {
            cache,
            prices,
            fetcher,
            service,
            janitor_interval: DEFAULT_JANITOR_INTERVAL,
            shutdown: CancellationToken::new(),
            janitor: Mutex::new(None),
        }
    }

    pub fn cache(&self) -> &InMemoryCache {
        &self.cache
    }

    pub fn prices(&self) -> &Arc<PriceMatcher> {
        &self.prices
    }

    pub fn fetcher(&self) -> &Arc<BackgroundFetcher> {
        &self.fetcher
    }

    pub fn service(&self) -> &TransactionService {
        &self.service
    }

    /// Cancelled by [`AppContext::shutdown`]; background work observes it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Starts background polling and the cache janitor.
    pub async fn start(&self) {
        if self.shutdown.is_cancelled() {
            warn!("Application context already shut down, not starting");
            return;
        }
        self.fetcher.start(&self.shutdown).await;

        let mut janitor = self.janitor.lock().await;
        if janitor.is_none() {
            *janitor = Some(
                self.cache
                    .spawn_janitor(self.janitor_interval, self.shutdown.clone()),
            );
        }
    }

    /// Stops polling, then every other background task, and waits for them.
    pub async fn shutdown(&self) {
        self.fetcher.stop().await;
        self.shutdown.cancel();
        if let Some(handle) = self.janitor.lock().await.take() {
            let _ = handle.await;
        }
        info!("Application context shut down");
    }
}
