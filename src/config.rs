use std::env;
use std::path::PathBuf;

pub const DEFAULT_BCV_URL: &str = "https://www.bcv.org.ve/";
pub const DEFAULT_BINANCE_URL: &str =
    "https://p2p.binance.com/bapi/c2c/v2/friendly/c2c/adv/search";

/// Service configuration derived from environment variables.
///
/// `PORT` keeps its historical name; everything else is namespaced under
/// `TASAS_`. The upstream URLs are overridable so an operator can point the
/// service at a mirror without a rebuild.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Path of the SQLite history database.
    pub db_path: PathBuf,
    /// Official (BCV) landing page to scrape.
    pub bcv_url: String,
    /// Binance P2P advert search endpoint.
    pub binance_url: String,
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_path(name: &str, default: &str) -> PathBuf {
    PathBuf::from(env_str(name, default))
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind: env_str("TASAS_BIND", "0.0.0.0"),
            port: env_u16("PORT", 3000),
            db_path: env_path("TASAS_DB", "data/tasas.db"),
            bcv_url: env_str("TASAS_BCV_URL", DEFAULT_BCV_URL),
            binance_url: env_str("TASAS_BINANCE_URL", DEFAULT_BINANCE_URL),
        }
    }
}
