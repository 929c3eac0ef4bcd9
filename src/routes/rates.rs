use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use crate::db::history::HistoryRecord;
use crate::error::ApiError;
use crate::fetch::WireSnapshot;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/tasas", get(tasas))
        .route("/historial", get(historial))
}

/// GET / — plain-text liveness banner.
async fn index() -> &'static str {
    "tasas-ves: tasas de cambio BCV + Binance P2P"
}

/// GET /tasas — fresh snapshot of both sources.
///
/// Always 200: a failed source shows up as a `0` value, never as an HTTP
/// error. Callers are expected to treat zeros as "unavailable".
async fn tasas(State(state): State<Arc<AppState>>) -> Json<WireSnapshot> {
    let snapshot = state.rates.snapshot().await;
    Json(snapshot.to_wire())
}

/// GET /historial — up to the most recent 168 hourly records, oldest first.
async fn historial(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<HistoryRecord>>, ApiError> {
    let records = state.store.recent()?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::history::HistoryStore;
    use crate::fetch::RateService;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use std::time::{Duration, Instant};
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    // Upstream URLs point at a closed local port so fetches fail fast
    // instead of reaching the network.
    fn test_state() -> Arc<AppState> {
        let config = Config {
            bind: "127.0.0.1".to_string(),
            port: 0,
            db_path: ":memory:".into(),
            bcv_url: "http://127.0.0.1:1/".to_string(),
            binance_url: "http://127.0.0.1:1/".to_string(),
        };
        let rates = RateService::new(&config);
        let store = HistoryStore::open_in_memory().unwrap();
        Arc::new(AppState {
            config,
            rates,
            store,
        })
    }

    // Minimal upstream that answers every connection with an empty JSON body
    // after `delay`. Used to verify that slow sources do not serialize
    // requests.
    async fn spawn_slow_upstream(delay: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = sock
                        .write_all(
                            b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
                        )
                        .await;
                });
            }
        });
        format!("http://{addr}/")
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn index_serves_banner() {
        let app = crate::routes::api_router().with_state(test_state());
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8(bytes.to_vec()).unwrap().contains("tasas"));
    }

    #[tokio::test]
    async fn tasas_is_200_with_zero_sentinels_when_sources_are_down() {
        let app = crate::routes::api_router().with_state(test_state());
        let resp = app
            .oneshot(Request::get("/tasas").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["bcv_usd"], 0.0);
        assert_eq!(json["bcv_eur"], 0.0);
        assert_eq!(json["binance_ves"], 0.0);
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn concurrent_tasas_requests_complete_within_one_delay_interval() {
        let url = spawn_slow_upstream(Duration::from_secs(1)).await;
        let config = Config {
            bind: "127.0.0.1".to_string(),
            port: 0,
            db_path: ":memory:".into(),
            bcv_url: url.clone(),
            binance_url: url,
        };
        let rates = RateService::new(&config);
        let store = HistoryStore::open_in_memory().unwrap();
        let state = Arc::new(AppState {
            config,
            rates,
            store,
        });

        let app = crate::routes::api_router().with_state(state);
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let app = app.clone();
            handles.push(tokio::spawn(async move {
                app.oneshot(Request::get("/tasas").body(Body::empty()).unwrap())
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            let resp = handle.await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }

        // Four serialized rounds against a 1 s upstream would take >= 4 s.
        let elapsed = started.elapsed();
        assert!(
            elapsed < Duration::from_secs(3),
            "requests serialized: took {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn historial_returns_stored_records_oldest_first() {
        let state = test_state();
        state.store.insert(36.0, 40.0, 230.0, Utc::now()).unwrap();
        state.store.insert(36.5, 40.5, 231.0, Utc::now()).unwrap();

        let app = crate::routes::api_router().with_state(state);
        let resp = app
            .oneshot(Request::get("/historial").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], 1);
        assert_eq!(records[0]["bcv_usd"], 36.0);
        assert_eq!(records[1]["id"], 2);
        assert_eq!(records[1]["binance_ves"], 231.0);
    }
}
