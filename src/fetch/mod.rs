pub mod bcv;
pub mod binance;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::Config;
use bcv::BcvClient;
use binance::BinanceP2pClient;

/// Official USD/EUR reference rates.
///
/// `None` means "could not be determined this cycle" — distinct from a
/// measured zero, which never occurs for a real reference rate. The `0`
/// wire sentinel is produced only at the JSON/storage boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OfficialRates {
    pub usd: Option<f64>,
    pub eur: Option<f64>,
}

/// One complete measurement of official + market rates at a point in time.
/// Built fresh on every request and every scheduled cycle, never cached.
#[derive(Debug, Clone, Copy)]
pub struct RateSnapshot {
    pub official: OfficialRates,
    pub market_ves: Option<f64>,
    pub captured_at: DateTime<Utc>,
}

impl RateSnapshot {
    /// Wire form served by `/tasas`: unavailable values collapse to `0`.
    pub fn to_wire(&self) -> WireSnapshot {
        WireSnapshot {
            bcv_usd: self.official.usd.unwrap_or(0.0),
            bcv_eur: self.official.eur.unwrap_or(0.0),
            binance_ves: self.market_ves.unwrap_or(0.0),
            timestamp: self
                .captured_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// JSON shape served by `/tasas`.
#[derive(Debug, Clone, Serialize)]
pub struct WireSnapshot {
    pub bcv_usd: f64,
    pub bcv_eur: f64,
    pub binance_ves: f64,
    pub timestamp: String,
}

/// Owns both upstream clients and assembles snapshots from them.
pub struct RateService {
    bcv: BcvClient,
    binance: BinanceP2pClient,
}

impl RateService {
    pub fn new(cfg: &Config) -> Self {
        Self {
            bcv: BcvClient::new(cfg.bcv_url.clone()),
            binance: BinanceP2pClient::new(cfg.binance_url.clone()),
        }
    }

    /// Fetch both sources concurrently and assemble a snapshot.
    ///
    /// The two fetches are independent, so they run in parallel; each is
    /// bounded by its own client timeout. A failed side simply leaves its
    /// fields unset — assembly itself never fails.
    pub async fn snapshot(&self) -> RateSnapshot {
        let (official, market_ves) = tokio::join!(self.bcv.fetch(), self.binance.fetch());
        RateSnapshot {
            official,
            market_ves,
            captured_at: Utc::now(),
        }
    }
}
