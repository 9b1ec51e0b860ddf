pub mod routes;
pub mod state;
pub mod ws;

use axum::Router;
use runtime::SnapshotReader;

pub use state::AppState;

pub fn app(reader: SnapshotReader) -> Router {
    routes::router(AppState::new(reader))
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, time::Duration};

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use core_sim::{
        HistoricalReturns, InstrumentSeed, InstrumentSnapshot, MarketSeeds, MarketSnapshot,
        PricePoint, Symbol, UniformResampler,
    };
    use futures_util::StreamExt;
    use runtime::{InMemoryRunLogWriter, SimulationEngine, SnapshotReader};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio_tungstenite::{connect_async, tungstenite::Message};
    use tower::ServiceExt;

    use crate::{app, routes, AppState};

    fn two_step_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            step: 2,
            total_steps: 2,
            instruments: BTreeMap::from([
                (
                    Symbol::from("AAPL"),
                    InstrumentSnapshot {
                        price: 110.25,
                        history: vec![
                            PricePoint { step: 1, price: 105.0 },
                            PricePoint { step: 2, price: 110.25 },
                        ],
                    },
                ),
                (
                    Symbol::from("TSLA"),
                    InstrumentSnapshot {
                        price: 190.0,
                        history: vec![
                            PricePoint { step: 1, price: 195.0 },
                            PricePoint { step: 2, price: 190.0 },
                        ],
                    },
                ),
            ]),
        }
    }

    async fn get_json(reader: SnapshotReader, uri: &str) -> (StatusCode, Value) {
        let response = app(reader)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn stocks_returns_price_history_and_months_per_symbol() {
        let reader = SnapshotReader::fixed(two_step_snapshot());

        let (status, body) = get_json(reader, "/stocks").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "AAPL": { "price": 110.25, "history": [105.0, 110.25], "months": [1, 2] },
                "TSLA": { "price": 190.0, "history": [195.0, 190.0], "months": [1, 2] },
            })
        );
    }

    #[tokio::test]
    async fn stocks_before_the_first_tick_reports_starting_prices() {
        let seeds: MarketSeeds = [("AAPL", 187.44), ("GOOG", 140.1)]
            .into_iter()
            .map(|(name, price)| {
                let symbol = Symbol::from(name);
                let returns = HistoricalReturns::new(&symbol, vec![0.01]).unwrap();
                let seed = InstrumentSeed::new(&symbol, price, returns).unwrap();
                (symbol, seed)
            })
            .collect();
        let engine = SimulationEngine::new(
            seeds,
            240,
            UniformResampler::seeded(1),
            InMemoryRunLogWriter::new(),
        );

        let (_, body) = get_json(engine.reader(), "/stocks").await;

        assert_eq!(
            body,
            json!({
                "AAPL": { "price": 187.44, "history": [], "months": [] },
                "GOOG": { "price": 140.1, "history": [], "months": [] },
            })
        );
    }

    #[tokio::test]
    async fn snapshot_reports_step_and_completion() {
        let reader = SnapshotReader::fixed(two_step_snapshot());

        let (status, body) = get_json(reader, "/snapshot").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], 2);
        assert_eq!(body["total_steps"], 2);
        assert_eq!(body["finished"], true);
        assert_eq!(
            body["instruments"]["AAPL"]["history"][1],
            json!({ "step": 2, "price": 110.25 })
        );
    }

    #[tokio::test]
    async fn stocks_and_snapshot_follow_the_same_tick() {
        let symbol = Symbol::from("AAPL");
        let returns = HistoricalReturns::new(&symbol, vec![0.05]).unwrap();
        let seeds = MarketSeeds::from([(
            symbol.clone(),
            InstrumentSeed::new(&symbol, 100.0, returns).unwrap(),
        )]);
        let mut engine = SimulationEngine::new(
            seeds,
            240,
            UniformResampler::seeded(3),
            InMemoryRunLogWriter::new(),
        );
        let reader = engine.reader();

        for (step, expected) in [(1, 105.0), (2, 110.25)] {
            engine.advance(step).unwrap();

            let (_, stocks) = get_json(reader.clone(), "/stocks").await;
            let (_, snapshot) = get_json(reader.clone(), "/snapshot").await;

            assert_eq!(snapshot["step"], step);
            assert_eq!(stocks["AAPL"]["price"], json!(expected));
            assert_eq!(snapshot["instruments"]["AAPL"]["price"], json!(expected));
            assert_eq!(
                stocks["AAPL"]["months"].as_array().map(Vec::len),
                Some(step as usize)
            );
        }
    }

    #[tokio::test]
    async fn index_serves_the_chart_page() {
        let reader = SnapshotReader::fixed(two_step_snapshot());

        let response = app(reader)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn static_script_is_served_as_javascript() {
        let reader = SnapshotReader::fixed(two_step_snapshot());

        let response = app(reader)
            .oneshot(Request::get("/static/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/javascript"
        );
    }

    #[tokio::test]
    async fn price_feed_sends_connected_then_a_single_frame_per_step() {
        let reader = SnapshotReader::fixed(two_step_snapshot());
        let state = AppState::with_chart_poll_interval(reader, Duration::from_millis(10));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, routes::router(state)).await.unwrap();
        });

        let (mut socket, _) = connect_async(format!("ws://{addr}/ws/prices")).await.unwrap();

        let connected = next_json(&mut socket).await;
        assert_eq!(connected, json!({ "event_type": "connected", "step": 2, "total_steps": 2 }));

        let frame = next_json(&mut socket).await;
        assert_eq!(frame["event_type"], "chart_frame");
        assert_eq!(frame["prices"]["AAPL"], json!(110.25));
        assert_eq!(frame["series"]["AAPL"], json!([[1, 105.0], [2, 110.25]]));

        let repeat = tokio::time::timeout(Duration::from_millis(100), socket.next()).await;
        assert!(repeat.is_err(), "unchanged snapshot should not be re-sent");
    }

    async fn next_json<S>(socket: &mut S) -> Value
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            match socket.next().await.unwrap().unwrap() {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                _ => continue,
            }
        }
    }
}
