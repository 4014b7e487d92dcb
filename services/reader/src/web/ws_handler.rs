//! services/reader/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket
//! connection. One connection is one reader screen: the init message opens
//! the book, a spawned seeker restores the saved position, viewport frames
//! drive the observer, and the session tracker heartbeats until teardown.

use crate::web::{
    protocol::{ClientMessage, PageVisibility, ServerMessage},
    state::{AppState, ReaderState},
    viewport::WsViewport,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use chrono::Utc;
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use shelfside_core::domain::IntersectionRecord;
use shelfside_core::scroll::ScrollController;
use shelfside_core::seek::InitialSeek;
use shelfside_core::tracker::{is_completed, reading_progress, SessionTracker};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let ws_sender = Arc::new(Mutex::new(sender));

    // --- 1. Initialization Phase ---
    let (user_id, book_id, header_offset) = match receiver.next().await {
        Some(Ok(Message::Text(open_json))) => {
            match serde_json::from_str::<ClientMessage>(&open_json) {
                Ok(ClientMessage::Open {
                    user_id,
                    book_id,
                    header_offset,
                }) => (user_id, book_id, header_offset),
                _ => {
                    error!("First message was not a valid Open message.");
                    return;
                }
            }
        }
        _ => {
            error!("Client disconnected before sending Open message.");
            return;
        }
    };
    info!("Reader screen opening for user {} on book {}", user_id, book_id);

    let book = match app_state.store.get_book(book_id).await {
        Ok(book) => book,
        Err(e) => {
            error!("Failed to load book {}: {:?}", book_id, e);
            send_message(
                &ws_sender,
                &ServerMessage::Error {
                    message: "Failed to load book data.".to_string(),
                },
            )
            .await;
            return;
        }
    };

    let reader_state = Arc::new(Mutex::new(ReaderState::new(user_id, book_id, header_offset)));
    let viewport = Arc::new(WsViewport::new(reader_state.clone(), ws_sender.clone()));

    let mut tracker = SessionTracker::new(app_state.store.clone(), user_id, book_id);
    let start_page = book.last_page_read.max(1);
    tracker.start(start_page, Utc::now()).await;

    send_message(
        &ws_sender,
        &ServerMessage::ReaderReady {
            book_id,
            last_page_read: book.last_page_read,
            total_pages: book.total_pages,
        },
    )
    .await;

    // --- 2. Spawn the One-Shot Initial Seek ---
    // The target is captured here, once; later page changes never re-seek.
    let seek_handle: JoinHandle<()> = {
        let viewport = viewport.clone();
        let (gate, token) = {
            let state = reader_state.lock().await;
            (state.gate.clone(), state.cancellation_token.clone())
        };
        tokio::spawn(async move {
            InitialSeek::new(start_page, header_offset, gate)
                .run(viewport.as_ref(), &token)
                .await;
        })
    };

    // --- 3. Main Message Loop ---
    let mut heartbeat = tokio::time::interval(app_state.config.heartbeat_interval);
    // An interval's first tick completes immediately; consume it so the
    // first real heartbeat lands a full period after mount.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                tracker.heartbeat(Utc::now()).await;
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    handle_text_message(
                        text.to_string(),
                        &app_state,
                        &reader_state,
                        &viewport,
                        &ws_sender,
                        &mut tracker,
                    )
                    .await;
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            }
        }
    }

    // --- 4. Cleanup ---
    // Cancel any in-flight seek or jump retries, then send the final
    // accrual update. A heartbeat racing this close is harmless: updates
    // are idempotent overwrites.
    reader_state.lock().await.cancellation_token.cancel();
    seek_handle.abort();
    tracker.end(Utc::now()).await;
    info!("Reader screen closed for book {}", book_id);
}

/// Helper function to handle the logic for different `ClientMessage`
/// variants after initialization.
async fn handle_text_message(
    text: String,
    app_state: &Arc<AppState>,
    reader_state: &Arc<Mutex<ReaderState>>,
    viewport: &Arc<WsViewport>,
    ws_sender: &Arc<Mutex<SplitSink<WebSocket, Message>>>,
    tracker: &mut SessionTracker,
) {
    let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            return;
        }
    };

    match client_msg {
        ClientMessage::DocumentLoaded { total_pages } => {
            let book_id = {
                let mut state = reader_state.lock().await;
                if state.total_pages != Some(total_pages) {
                    state.total_pages = Some(total_pages);
                    // A new page count invalidates every prior measurement.
                    let header_offset = state.header_offset;
                    state.observer.reset(header_offset);
                }
                state.book_id
            };
            if let Err(e) = app_state.store.set_total_pages(book_id, total_pages).await {
                warn!("Failed to record total pages: {}", e);
            }
        }
        ClientMessage::PageMounted { page, top } => {
            reader_state.lock().await.page_tops.insert(page, top);
        }
        ClientMessage::PageUnmounted { page } => {
            let mut state = reader_state.lock().await;
            state.page_tops.remove(&page);
            state.observer.page_unmounted(page);
        }
        ClientMessage::ViewportFrame { records } => {
            viewport.frame_tick();
            let changed = {
                let mut state = reader_state.lock().await;
                let frame: Vec<IntersectionRecord> = records
                    .iter()
                    .map(|r: &PageVisibility| IntersectionRecord {
                        page: r.page,
                        ratio: r.ratio,
                        top: r.top,
                    })
                    .collect();
                state.observer.observe(&frame)
            };
            if let Some(page) = changed {
                tracker.page_changed(page);
                send_message(ws_sender, &ServerMessage::PageChanged { page }).await;
                save_position(app_state, reader_state, page).await;
            }
        }
        ClientMessage::JumpToPage { page } => {
            let state = reader_state.lock().await;
            let controller = ScrollController::new(
                state.header_offset,
                state.total_pages.unwrap_or(u32::MAX),
            );
            let token = state.cancellation_token.clone();
            drop(state);
            let viewport = viewport.clone();
            tokio::spawn(async move {
                controller.jump_to(page, viewport.as_ref(), &token).await;
            });
        }
        ClientMessage::VisibilityHidden => {
            tracker.heartbeat(Utc::now()).await;
        }
        ClientMessage::HeaderOffsetChanged { header_offset } => {
            let mut state = reader_state.lock().await;
            state.header_offset = header_offset;
            state.observer.reset(header_offset);
        }
        ClientMessage::Open { .. } => {
            warn!("Received subsequent Open message, which is ignored.");
        }
    }
}

/// Persists the new reading position with its derived progress fields.
/// Best-effort: failures are logged and reading continues.
async fn save_position(
    app_state: &Arc<AppState>,
    reader_state: &Arc<Mutex<ReaderState>>,
    page: u32,
) {
    let (book_id, total_pages) = {
        let state = reader_state.lock().await;
        (state.book_id, state.total_pages)
    };
    // Without a page count there is no progress to derive yet.
    let Some(total_pages) = total_pages else {
        return;
    };
    let progress = reading_progress(page, total_pages);
    let completed = is_completed(progress);
    if let Err(e) = app_state
        .store
        .save_reading_position(book_id, page, progress, completed)
        .await
    {
        warn!("Failed to save reading position: {}", e);
    }
}

async fn send_message(
    ws_sender: &Arc<Mutex<SplitSink<WebSocket, Message>>>,
    message: &ServerMessage,
) {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return;
        }
    };
    if ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_err()
    {
        warn!("Failed to send message to client.");
    }
}
