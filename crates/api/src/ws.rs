use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::state::{AppState, FeedEvent};

pub async fn prices_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream_chart(socket, state))
}

/// Polls the latest snapshot on the feed's own cadence and pushes a frame whenever the
/// step has moved. Polling the same snapshot again is a no-op.
async fn stream_chart(mut socket: WebSocket, state: AppState) {
    let reader = state.reader().clone();
    let connected = FeedEvent::connected(&reader.latest());
    if send_event(&mut socket, &connected).await.is_err() {
        return;
    }

    let mut poll = interval(state.chart_poll_interval());
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_sent_step = None;
    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => return,
                }
            }
            _ = poll.tick() => {
                let snapshot = reader.latest();
                if last_sent_step == Some(snapshot.step) {
                    continue;
                }
                if send_event(&mut socket, &FeedEvent::chart_frame(&snapshot)).await.is_err() {
                    debug!("chart feed client went away");
                    return;
                }
                last_sent_step = Some(snapshot.step);
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &FeedEvent) -> Result<(), ()> {
    let payload = event_json(event)?;
    socket.send(Message::Text(payload)).await.map_err(|_| ())
}

fn event_json(event: &FeedEvent) -> Result<String, ()> {
    serde_json::to_string(event).map_err(|_| ())
}
