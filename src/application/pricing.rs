//! Best-effort mapping from a transaction to the product it most likely paid for.
//!
//! Matching works on the amount and the free-text description only. It is a
//! heuristic, not a billing rule: a transaction that matches nothing is simply
//! left unenriched.

use crate::domain::price::Price;
use crate::error::{AggregatorError, Result};
use crate::interfaces::csv::price_reader::PriceReader;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs::File;
use std::path::Path;

const PRICE_TOLERANCE: Decimal = dec!(0.05);
const WORD_MATCH_THRESHOLD: f64 = 0.4;
const WORD_TRIM: &[char] = &['/', '-', ',', '.'];

// (product word, description words it also accepts)
const SYNONYMS: &[(&str, &[&str])] = &[
    ("1-2", &["1", "2"]),
    ("3", &["3", "three"]),
    ("4", &["4", "four"]),
    ("pers", &["people", "person"]),
];

/// Immutable, ordered price list with lookup and matching operations.
#[derive(Debug, Clone, Default)]
pub struct PriceMatcher {
    prices: Vec<Price>,
}

impl PriceMatcher {
    pub fn new(prices: Vec<Price>) -> Self {
        Self { prices }
    }

    /// Loads the price list from a `;`-separated file. Any malformed row fails
    /// the whole load.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AggregatorError::PriceList(format!("failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self::new(PriceReader::new(file).read_all()?))
    }

    pub fn prices(&self) -> &[Price] {
        &self.prices
    }

    pub fn products(&self) -> Vec<&str> {
        self.prices.iter().map(|p| p.product.as_str()).collect()
    }

    /// Case-insensitive lookup by product name.
    pub fn by_product(&self, product: &str) -> Option<&Price> {
        let product = product.trim();
        self.prices
            .iter()
            .find(|p| p.product.eq_ignore_ascii_case(product))
    }

    pub fn by_price(&self, amount: Decimal) -> Vec<&Price> {
        self.prices.iter().filter(|p| p.price == amount).collect()
    }

    /// Entries priced within `[min, max]`, inclusive.
    pub fn in_range(&self, min: Decimal, max: Decimal) -> Result<Vec<&Price>> {
        if min > max {
            return Err(AggregatorError::InvalidRange { min, max });
        }
        Ok(self
            .prices
            .iter()
            .filter(|p| p.price >= min && p.price <= max)
            .collect())
    }

    /// Finds the most plausible product for a transaction.
    ///
    /// Strategies, first hit wins:
    /// 1. a single entry with exactly this price;
    /// 2. the first entry whose name fuzzy-matches the description;
    /// 3. several entries with exactly this price: the first one matching the
    ///    description, else simply the first one;
    /// 4. entries within ±5% of the amount: a description match, else the
    ///    nearest price.
    pub fn find_best_match(&self, amount: Decimal, description: &str) -> Option<&Price> {
        let has_description = !description.is_empty();
        let exact = self.by_price(amount);

        if exact.len() == 1 {
            return exact.first().copied();
        }

        if has_description {
            if let Some(p) = self.prices.iter().find(|p| fuzzy_match(description, &p.product)) {
                return Some(p);
            }
        }

        // Falling back to the first of several equal prices is an approximation;
        // nothing guarantees it is the right product.
        if exact.len() > 1 && has_description {
            return exact
                .iter()
                .find(|p| fuzzy_match(description, &p.product))
                .or(exact.first())
                .copied();
        }

        let tolerance = amount * PRICE_TOLERANCE;
        let in_range = self
            .in_range(amount - tolerance, amount + tolerance)
            .unwrap_or_default();
        if in_range.is_empty() {
            return None;
        }

        if has_description {
            if let Some(p) = in_range
                .iter()
                .copied()
                .find(|p| fuzzy_match(description, &p.product))
            {
                return Some(p);
            }
        }

        // min_by_key keeps the first of equal keys, so ties go to list order.
        in_range
            .into_iter()
            .min_by_key(|p| (amount - p.price).abs())
    }
}

/// Loose comparison between a transaction description and a product name.
///
/// Equal or contained strings match outright. Otherwise each description word
/// that hits some product word (by containment or a known synonym) counts, and
/// the match succeeds once hits reach 40% of the product's word count. Product
/// words of two characters or fewer only match through synonyms; description
/// words have no length limit.
pub fn fuzzy_match(description: &str, product: &str) -> bool {
    let desc = description.trim().to_lowercase();
    let prod = product.trim().to_lowercase();

    if desc.is_empty() || prod.is_empty() {
        return false;
    }
    if desc == prod || desc.contains(&prod) || prod.contains(&desc) {
        return true;
    }

    let prod_words: Vec<&str> = prod
        .split_whitespace()
        .map(|w| w.trim_matches(WORD_TRIM))
        .collect();
    if prod_words.is_empty() {
        return false;
    }

    let hits = desc
        .split_whitespace()
        .map(|w| w.trim_matches(WORD_TRIM))
        .filter(|d| prod_words.iter().any(|p| words_match(d, p)))
        .count();

    hits as f64 >= prod_words.len() as f64 * WORD_MATCH_THRESHOLD
}

fn words_match(desc_word: &str, prod_word: &str) -> bool {
    if prod_word.len() > 2 && (desc_word.contains(prod_word) || prod_word.contains(desc_word)) {
        return true;
    }
    SYNONYMS
        .iter()
        .any(|(p, accepted)| *p == prod_word && accepted.contains(&desc_word))
}
