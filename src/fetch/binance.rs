use serde_json::json;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Binance P2P advert search (USDT/VES buy side).
pub struct BinanceP2pClient {
    url: String,
    client: reqwest::Client,
}

impl BinanceP2pClient {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self { url, client }
    }

    /// Fetch the representative market price. Never errors: transport
    /// failures and empty listings degrade to `None` and are logged.
    pub async fn fetch(&self) -> Option<f64> {
        match self.try_fetch().await {
            Ok(Some(price)) => Some(price),
            Ok(None) => {
                tracing::warn!("Binance P2P returned no usable listings");
                None
            }
            Err(e) => {
                tracing::warn!("Binance P2P fetch failed: {e}");
                None
            }
        }
    }

    async fn try_fetch(&self) -> Result<Option<f64>, String> {
        // First page of the 20 most relevant buy adverts, no merchant or
        // publisher filtering.
        let payload = json!({
            "asset": "USDT",
            "fiat": "VES",
            "merchantCheck": false,
            "page": 1,
            "publisherType": null,
            "rows": 20,
            "tradeType": "BUY",
        });

        let res: api::Response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?
            .json()
            .await
            .map_err(|e| format!("unable to parse as json: {e}"))?;

        let prices: Vec<f64> = res
            .data
            .iter()
            .filter_map(|listing| listing.adv.price.trim().parse().ok())
            .collect();

        Ok(average_price(&prices))
    }
}

/// Arithmetic mean of the listed prices, rounded to two decimals with
/// round-half-away-from-zero (`f64::round`). An empty listing yields
/// `None`, never NaN.
///
/// A plain mean over the first page of buy offers is the point: no outlier
/// rejection, no size weighting. Historical records were computed this way
/// and stay comparable only if this stays this way.
pub fn average_price(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Response {
        /// Advert listing; a response without it counts as a failed cycle.
        #[serde(default)]
        pub data: Vec<Listing>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Listing {
        pub adv: Adv,
    }

    #[derive(Deserialize, Debug)]
    pub struct Adv {
        /// Advertised unit price, serialized by Binance as a string.
        pub price: String,
    }
}
