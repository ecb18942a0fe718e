use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::util::with_retry;
use crate::core::cache::Cache;
use crate::core::market::{AssetQuote, MarketDataProvider};

const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Market data from the CoinGecko `/coins/markets` endpoint.
pub struct CoinGeckoProvider {
    base_url: String,
    cache: Arc<Cache<String, AssetQuote>>,
    retries: usize,
    retry_delay_ms: u64,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, AssetQuote>>) -> Self {
        CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
            retries: 0,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }

    pub fn with_retries(mut self, retries: usize, retry_delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }
}

#[derive(Deserialize, Debug)]
struct CoinGeckoMarketData {
    id: String,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    circulating_supply: Option<f64>,
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    #[instrument(
        name = "CoinGeckoQuoteFetch",
        skip(self),
        fields(asset = %asset_id, vs = %vs_currency)
    )]
    async fn fetch_quote(&self, asset_id: &str, vs_currency: &str) -> Result<AssetQuote> {
        let key = format!("{asset_id}:{vs_currency}");
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let url = format!(
            "{}/coins/markets?vs_currency={}&ids={}",
            self.base_url,
            vs_currency.to_lowercase(),
            asset_id
        );
        debug!("Requesting market data from {}", url);

        let client = reqwest::Client::builder().user_agent("kpp/1.0").build()?;
        let (client, request_url) = (&client, &url);
        let markets: Vec<CoinGeckoMarketData> = with_retry(
            || async move {
                client
                    .get(request_url)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<Vec<CoinGeckoMarketData>>()
                    .await
            },
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(|e| anyhow!("Request error: {} for asset: {} URL: {}", e, asset_id, url))?;

        let item = markets
            .into_iter()
            .find(|m| m.id == asset_id)
            .ok_or_else(|| anyhow!("No market data found for asset: {}", asset_id))?;
        debug!(market = ?item, "Received CoinGecko market data");

        let quote = AssetQuote {
            asset_id: asset_id.to_string(),
            currency: vs_currency.to_uppercase(),
            price: item.current_price,
            circulating_supply: item.circulating_supply,
            market_cap: item.market_cap,
        };

        self.cache.put(key, quote.clone()).await;
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(asset_id: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .and(query_param("ids", asset_id))
            .and(query_param("vs_currency", "usd"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_quote_fetch() {
        let mock_response = r#"[{
            "id": "kaspa",
            "symbol": "kas",
            "name": "Kaspa",
            "current_price": 0.2711,
            "market_cap": 6940000000,
            "circulating_supply": 25600000000.0,
            "total_supply": 25600000000.0
        }]"#;
        let mock_server = create_mock_server("kaspa", mock_response).await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let quote = provider.fetch_quote("kaspa", "USD").await.unwrap();
        assert_eq!(quote.asset_id, "kaspa");
        assert_eq!(quote.currency, "USD");
        assert_eq!(quote.price, Some(0.2711));
        assert_eq!(quote.market_cap, Some(6_940_000_000.0));
        assert_eq!(quote.circulating_supply, Some(25_600_000_000.0));
    }

    #[tokio::test]
    async fn test_missing_fields_are_unavailable() {
        let mock_response = r#"[{
            "id": "kaspa",
            "current_price": null,
            "market_cap": null,
            "circulating_supply": null
        }]"#;
        let mock_server = create_mock_server("kaspa", mock_response).await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let quote = provider.fetch_quote("kaspa", "usd").await.unwrap();
        assert!(quote.price.is_none());
        assert!(quote.require_price().is_err());
    }

    #[tokio::test]
    async fn test_unknown_asset() {
        let mock_server = create_mock_server("nope", "[]").await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let result = provider.fetch_quote("nope", "USD").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No market data found for asset: nope"
        );
    }

    #[tokio::test]
    async fn test_quotes_are_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"id": "bitcoin", "current_price": 65000.0, "market_cap": 1.28e12, "circulating_supply": 19700000}]"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), Arc::new(Cache::new()));

        let first = provider.fetch_quote("bitcoin", "USD").await.unwrap();
        let second = provider.fetch_quote("bitcoin", "USD").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.market_cap, Some(1.28e12));
    }

    #[tokio::test]
    async fn test_server_error_after_retries() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/markets"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&mock_server)
            .await;
        let provider = CoinGeckoProvider::new(&mock_server.uri(), Arc::new(Cache::new()))
            .with_retries(2, 1);

        let result = provider.fetch_quote("kaspa", "USD").await;
        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("Request error:"), "{message}");
        assert!(message.contains("kaspa"));
    }
}
