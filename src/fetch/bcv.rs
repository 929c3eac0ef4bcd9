use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use super::OfficialRates;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

// The landing page renders each rate as `<div id="dolar"> … <strong> 36,50
// </strong> … </div>`. The id anchors are the stable part of the markup; the
// value is read only from the slice up to the element's closing tag, so a
// broken element cannot capture its neighbour's value.
static RE_USD_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)id=["']dolar["']"#).unwrap());
static RE_EUR_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)id=["']euro["']"#).unwrap());
static RE_STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<strong>\s*([0-9.,]+)\s*</strong>").unwrap());

/// Scraper for the official BCV reference rates.
pub struct BcvClient {
    url: String,
    client: reqwest::Client,
}

impl BcvClient {
    pub fn new(url: String) -> Self {
        // The BCV site is known to present a broken certificate chain, so this
        // one client accepts invalid certs. Never widen this to other clients.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client");
        Self { url, client }
    }

    /// Fetch the official USD/EUR rates. Never errors: any transport or
    /// parse failure degrades to unset fields and is logged.
    pub async fn fetch(&self) -> OfficialRates {
        match self.try_fetch().await {
            Ok(rates) => {
                if rates.usd.is_none() {
                    tracing::warn!("BCV page yielded no parseable USD rate");
                }
                if rates.eur.is_none() {
                    tracing::warn!("BCV page yielded no parseable EUR rate");
                }
                rates
            }
            Err(e) => {
                tracing::warn!("BCV fetch failed: {e}");
                OfficialRates::default()
            }
        }
    }

    async fn try_fetch(&self) -> Result<OfficialRates, String> {
        let resp = self
            .client
            .get(&self.url)
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if !resp.status().is_success() {
            return Err(format!("unexpected status {}", resp.status()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| format!("body read failed: {e}"))?;

        Ok(parse_rates(&body))
    }
}

/// Extract the USD/EUR reference rates from the BCV landing page.
///
/// Each field degrades independently: a missing or malformed element leaves
/// only that field unset, and a structural page change degrades the output
/// to the zero sentinel rather than an error.
pub fn parse_rates(html: &str) -> OfficialRates {
    OfficialRates {
        usd: extract_rate(&RE_USD_ANCHOR, html),
        eur: extract_rate(&RE_EUR_ANCHOR, html),
    }
}

fn extract_rate(anchor: &Regex, html: &str) -> Option<f64> {
    let start = anchor.find(html)?.end();
    let rest = &html[start..];
    // The rate's <strong> precedes the first closing tag inside the element.
    let block = rest.find("</div>").map_or(rest, |end| &rest[..end]);
    RE_STRONG
        .captures(block)
        .and_then(|c| c.get(1))
        .and_then(|m| parse_decimal(m.as_str()))
}

/// Parse a decimal-comma formatted number (`"36,50"`) as `f64`.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().replace(',', ".").parse().ok()
}
