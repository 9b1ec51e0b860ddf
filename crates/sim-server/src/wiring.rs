use std::time::Duration;

use api::AppState;
use axum::{routing::get, Router};
use runtime::SnapshotReader;

pub fn build_app(reader: SnapshotReader, chart_poll_interval: Duration) -> Router {
    api::routes::router(AppState::with_chart_poll_interval(
        reader,
        chart_poll_interval,
    ))
    .route("/health", get(healthcheck))
}

async fn healthcheck() -> &'static str {
    "ok"
}
