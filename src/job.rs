use chrono::{Timelike, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::db::history::HistoryStore;
use crate::fetch::{RateService, RateSnapshot};
use crate::state::AppState;

/// One scheduled cycle: assemble a fresh snapshot and apply the
/// persistence gate. Exposed as a plain async fn so tests can drive it
/// without a running clock.
pub async fn tick(rates: &RateService, store: &HistoryStore) {
    let snapshot = rates.snapshot().await;
    persist(store, &snapshot);
}

/// Persistence gate: a snapshot is written only when all three values were
/// measured this cycle. Partial snapshots are skipped so the historical
/// chart never shows zero dips from transient scrape failures; write
/// failures are logged and swallowed.
pub fn persist(store: &HistoryStore, snapshot: &RateSnapshot) {
    let (Some(usd), Some(eur), Some(market)) = (
        snapshot.official.usd,
        snapshot.official.eur,
        snapshot.market_ves,
    ) else {
        tracing::warn!(
            "Skipping history write, incomplete snapshot: usd={:?} eur={:?} market={:?}",
            snapshot.official.usd,
            snapshot.official.eur,
            snapshot.market_ves
        );
        return;
    };

    if usd <= 0.0 || eur <= 0.0 || market <= 0.0 {
        tracing::warn!(
            "Skipping history write, non-positive rate: usd={usd} eur={eur} market={market}"
        );
        return;
    }

    match store.insert(usd, eur, market, snapshot.captured_at) {
        Ok(()) => tracing::info!("Stored snapshot: usd={usd} eur={eur} market={market}"),
        Err(e) => tracing::error!("History write failed: {e}"),
    }
}

/// Background task: run `tick` once per hour at minute 0.
pub fn spawn_hourly(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(until_next_hour()).await;
            tick(&state.rates, &state.store).await;
        }
    });
}

/// Duration until the next top of the hour (at least one second, so a tick
/// landing exactly on minute 0 waits for the following hour).
fn until_next_hour() -> Duration {
    let now = Utc::now();
    let seconds_into_hour = u64::from(now.minute()) * 60 + u64::from(now.second());
    Duration::from_secs(3600 - seconds_into_hour.min(3599))
}
