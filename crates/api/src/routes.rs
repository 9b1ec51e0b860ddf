use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::{
    state::{AppState, SnapshotResponse, StockEntry},
    ws,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/static/styles.css", get(styles))
        .route("/static/app.js", get(script))
        .route("/stocks", get(stocks))
        .route("/snapshot", get(snapshot))
        .route("/ws/prices", get(ws::prices_socket))
        .with_state(state)
}

async fn stocks(State(state): State<AppState>) -> Response {
    let snapshot = state.reader().latest();
    Json(StockEntry::from_snapshot(&snapshot)).into_response()
}

async fn snapshot(State(state): State<AppState>) -> Response {
    let snapshot = state.reader().latest();
    Json(SnapshotResponse::from(&*snapshot)).into_response()
}

async fn index() -> Html<&'static str> {
    Html(ui::index_html())
}

async fn styles() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], ui::styles_css())
}

async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], ui::app_js())
}
