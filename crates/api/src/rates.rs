//! HTTP quote source for the exchange-rate warmer.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use carmarket_domain::services::rates::{RateFetchError, RateSource};

/// Reference-rate payload: `{"compra": {...}, "venta": {"valor": 512.35, ...}}`.
/// Listings are priced against the selling rate.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    venta: QuotePoint,
}

#[derive(Debug, Deserialize)]
struct QuotePoint {
    valor: f64,
}

pub struct HttpRateSource {
    client: Client,
    url: String,
}

impl HttpRateSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rate(&self) -> Result<Decimal, RateFetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| RateFetchError::Http(err.to_string()))?;

        let quote: QuoteResponse = response
            .json()
            .await
            .map_err(|err| RateFetchError::Malformed(err.to_string()))?;

        let rate = Decimal::try_from(quote.venta.valor)
            .map_err(|err| RateFetchError::Malformed(err.to_string()))?;
        if rate <= Decimal::ZERO {
            return Err(RateFetchError::Malformed(format!(
                "non-positive rate {rate}"
            )));
        }

        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_payload_parses() {
        let raw = r#"{"compra":{"fecha":"2024-05-02","valor":504.1},"venta":{"fecha":"2024-05-02","valor":511.89}}"#;
        let quote: QuoteResponse = serde_json::from_str(raw).unwrap();
        assert!((quote.venta.valor - 511.89).abs() < f64::EPSILON);
    }
}
