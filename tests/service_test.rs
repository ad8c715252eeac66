mod common;

use common::transaction;
use payhub::application::pricing::PriceMatcher;
use payhub::application::repository::CachedTransactionRepository;
use payhub::application::service::TransactionService;
use payhub::application::{CACHE_TTL, Providers};
use payhub::domain::ports::{Cache, CacheHandle};
use payhub::domain::price::Price;
use payhub::domain::transaction::PaymentSource::{Stripe, Zettle};
use payhub::domain::transaction::Transaction;
use payhub::infrastructure::in_memory::InMemoryCache;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn price(product: &str, price: Decimal) -> Price {
    Price {
        product: product.to_string(),
        price,
        currency: "NOK".to_string(),
    }
}

fn price_list() -> Arc<PriceMatcher> {
    Arc::new(PriceMatcher::new(vec![
        price("Cabin 1-2 pers", dec!(650)),
        price("Tent site", dec!(300)),
        price("Caravan site", dec!(300)),
        price("Firewood", dec!(120)),
    ]))
}

fn service_over(cache: &InMemoryCache, prices: Option<Arc<PriceMatcher>>) -> TransactionService {
    let handle: CacheHandle = Arc::new(cache.clone());
    let repository = Arc::new(CachedTransactionRepository::new(handle, Providers::new()));
    TransactionService::new(repository, prices)
}

async fn seed(cache: &InMemoryCache, tx: Transaction) {
    cache.set_transaction(&tx.external_id.clone(), tx, CACHE_TTL).await;
}

#[tokio::test]
async fn test_list_is_enriched() {
    let cache = InMemoryCache::new();
    seed(&cache, transaction(Stripe, "ch_1", dec!(650), "", 2)).await;
    seed(&cache, transaction(Zettle, "zt_1", dec!(300), "Caravan for two nights", 1)).await;
    seed(&cache, transaction(Stripe, "ch_2", dec!(7.5), "Ice cream", 0)).await;
    let service = service_over(&cache, Some(price_list()));

    let txs = service.get_transactions(10).await.unwrap();

    assert_eq!(txs.len(), 3);
    assert_eq!(txs[0].product.as_deref(), Some("Cabin 1-2 pers"));
    assert_eq!(txs[0].product_price, Some(dec!(650)));
    assert_eq!(txs[1].product.as_deref(), Some("Caravan site"));
    assert_eq!(txs[2].product, None);
    assert_eq!(txs[2].product_price, None);
}

#[tokio::test]
async fn test_lookup_is_enriched_within_tolerance() {
    let cache = InMemoryCache::new();
    seed(&cache, transaction(Stripe, "ch_wood", dec!(118), "", 0)).await;
    let service = service_over(&cache, Some(price_list()));

    let tx = service.get_transaction_by_id("ch_wood").await.unwrap();

    assert_eq!(tx.product.as_deref(), Some("Firewood"));
    assert_eq!(tx.product_price, Some(dec!(120)));
    assert_eq!(tx.amount, dec!(118));
}

#[tokio::test]
async fn test_enrichment_leaves_cache_untouched() {
    let cache = InMemoryCache::new();
    seed(&cache, transaction(Stripe, "ch_1", dec!(650), "", 0)).await;
    let service = service_over(&cache, Some(price_list()));

    service.get_transaction_by_id("ch_1").await.unwrap();

    let cached = cache.get_transaction("ch_1").await.unwrap();
    assert_eq!(cached.product, None);
    assert_eq!(cached.product_price, None);
}

#[tokio::test]
async fn test_without_price_list_nothing_is_enriched() {
    let cache = InMemoryCache::new();
    seed(&cache, transaction(Stripe, "ch_1", dec!(650), "Cabin", 0)).await;
    let service = service_over(&cache, None);

    let txs = service.get_transactions(10).await.unwrap();

    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].product, None);
}

#[tokio::test]
async fn test_repository_errors_pass_through() {
    let service = service_over(&InMemoryCache::new(), Some(price_list()));

    assert!(service.get_transaction_by_id("nope").await.is_err());
    assert!(service.refresh_cache().await.is_err());
}
