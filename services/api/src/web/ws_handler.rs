//! services/api/src/web/ws_handler.rs
//!
//! WebSocket endpoints that push live snapshots of the caller's employees and
//! of one employee's notes. The store subscription lives exactly as long as the
//! socket: when either side closes, the stream is dropped and the subscription
//! is released.

use crate::error::port_error_response;
use crate::web::{
    locale::RequestLocale,
    protocol::ServerMessage,
    rest::{EmployeeResponse, NoteResponse},
    state::AppState,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};
use reviewiz_core::{SessionGrant, SnapshotStream};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// GET /ws/employees - live snapshots of the caller's employees.
pub async fn employees_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        info!("Employee subscription opened for {}", grant.user_id);
        let snapshots = app_state.team.watch_employees(&grant.user_id).await;
        forward(socket, snapshots, |employees| ServerMessage::Employees {
            employees: employees.into_iter().map(EmployeeResponse::from).collect(),
        })
        .await;
        info!("Employee subscription closed for {}", grant.user_id);
    })
}

/// GET /ws/employees/{id}/notes - live snapshots of one employee's notes.
///
/// The employee is looked up before upgrading so an unknown id is a plain 404.
pub async fn notes_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Extension(grant): Extension<SessionGrant>,
    RequestLocale(locale): RequestLocale,
    Path(employee_id): Path<Uuid>,
) -> Result<Response, (StatusCode, String)> {
    app_state
        .team
        .get_employee(&grant.user_id, employee_id)
        .await
        .map_err(|e| port_error_response(&e, locale))?;

    Ok(ws.on_upgrade(move |socket| async move {
        info!("Note subscription opened for employee {}", employee_id);
        let snapshots = app_state.team.watch_notes(&grant.user_id, employee_id).await;
        forward(socket, snapshots, |notes| ServerMessage::Notes {
            employee_id,
            notes: notes.into_iter().map(NoteResponse::from).collect(),
        })
        .await;
        info!("Note subscription closed for employee {}", employee_id);
    }))
}

/// Pumps snapshots into the socket until the client leaves or the subscription fails.
async fn forward<T, F>(
    socket: WebSocket,
    snapshots: reviewiz_core::PortResult<SnapshotStream<T>>,
    to_message: F,
) where
    F: Fn(Vec<T>) -> ServerMessage,
{
    let (mut sender, mut receiver) = socket.split();

    let mut snapshots = match snapshots {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to open subscription: {:?}", e);
            let _ = send(&mut sender, &subscription_error()).await;
            return;
        }
    };

    loop {
        tokio::select! {
            next = snapshots.next() => match next {
                Some(Ok(items)) => {
                    if send(&mut sender, &to_message(items)).await.is_err() {
                        warn!("Client went away while sending a snapshot.");
                        break;
                    }
                }
                Some(Err(e)) => {
                    error!("Subscription failed: {:?}", e);
                    let _ = send(&mut sender, &subscription_error()).await;
                    break;
                }
                None => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {:?}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = sender.close().await;
}

fn subscription_error() -> ServerMessage {
    ServerMessage::Error {
        message: "Live updates are unavailable.".to_string(),
    }
}

async fn send<S>(sender: &mut S, message: &ServerMessage) -> Result<(), ()>
where
    S: futures::Sink<Message> + Unpin,
{
    let json = serde_json::to_string(message).map_err(|e| {
        error!("Failed to serialize server message: {:?}", e);
    })?;
    sender.send(Message::Text(json.into())).await.map_err(|_| ())
}
