use crate::domain::price::Price;
use crate::error::{AggregatorError, Result};
use rust_decimal::Decimal;
use std::io::Read;
use std::str::FromStr;

const COLUMNS: usize = 3;

/// Reads a `;`-separated price list with a `Product;Price;Currency` header.
///
/// Unlike a streaming reader, loading is all-or-nothing: the first malformed
/// row fails the whole list.
pub struct PriceReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> PriceReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Reads every row, in file order.
    pub fn read_all(mut self) -> Result<Vec<Price>> {
        let header_len = self.reader.headers()?.len();
        if header_len != COLUMNS {
            return Err(AggregatorError::PriceList(format!(
                "expected {} header columns, got {}",
                COLUMNS, header_len
            )));
        }

        let mut prices = Vec::new();
        for record in self.reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            prices.push(parse_record(&record, line)?);
        }

        if prices.is_empty() {
            return Err(AggregatorError::PriceList(
                "price list must contain a header and at least one data row".to_string(),
            ));
        }
        Ok(prices)
    }
}

fn parse_record(record: &csv::StringRecord, line: u64) -> Result<Price> {
    if record.len() != COLUMNS {
        return Err(AggregatorError::PriceList(format!(
            "invalid record at line {}: expected {} columns, got {}",
            line,
            COLUMNS,
            record.len()
        )));
    }

    let price = Decimal::from_str(&record[1]).map_err(|e| {
        AggregatorError::PriceList(format!("invalid price value at line {}: {}", line, e))
    })?;

    Ok(Price {
        product: record[0].to_string(),
        price,
        currency: record[2].to_string(),
    })
}
