//! Application layer orchestrating the cache, the provider adapters and the
//! price list.
//!
//! The repository serves reads from the cache and falls back to providers, the
//! background fetcher keeps the cache warm, and the service enriches whatever
//! the repository returns. [`context::AppContext`] wires them together once.

pub mod context;
pub mod fetcher;
pub mod pricing;
pub mod repository;
pub mod service;

use crate::domain::ports::ProviderHandle;
use crate::domain::transaction::PaymentSource;
use std::fmt;
use std::time::Duration;

/// Lifetime of a cached transaction.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// How many transactions are requested from a provider per fetch.
pub const PROVIDER_FETCH_LIMIT: usize = 100;

/// The configured provider adapters, at most one per payment source.
///
/// Iteration always follows [`PaymentSource::ALL`] (stripe, vipps, zettle).
///
/// # Note
///
/// Transactions are cached under their provider's external id alone, so all
/// providers share one key space. If two providers issue the same id, the
/// transaction written last replaces the other; during a refresh that is the
/// later provider in iteration order.
#[derive(Clone, Default)]
pub struct Providers {
    stripe: Option<ProviderHandle>,
    vipps: Option<ProviderHandle>,
    zettle: Option<ProviderHandle>,
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: PaymentSource, provider: ProviderHandle) -> Self {
        self.insert(source, provider);
        self
    }

    pub fn insert(&mut self, source: PaymentSource, provider: ProviderHandle) {
        let slot = match source {
            PaymentSource::Stripe => &mut self.stripe,
            PaymentSource::Vipps => &mut self.vipps,
            PaymentSource::Zettle => &mut self.zettle,
        };
        *slot = Some(provider);
    }

    pub fn get(&self, source: PaymentSource) -> Option<&ProviderHandle> {
        match source {
            PaymentSource::Stripe => self.stripe.as_ref(),
            PaymentSource::Vipps => self.vipps.as_ref(),
            PaymentSource::Zettle => self.zettle.as_ref(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PaymentSource, &ProviderHandle)> {
        PaymentSource::ALL
            .into_iter()
            .filter_map(move |source| self.get(source).map(|provider| (source, provider)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Providers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(source, _)| source))
            .finish()
    }
}
