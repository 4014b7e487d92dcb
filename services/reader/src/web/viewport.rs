//! services/reader/src/web/viewport.rs
//!
//! The WebSocket-backed implementation of the `ViewportPort`: the browser
//! is the real rendering collaborator, so geometry queries read the layout
//! snapshot the client has reported, scroll commands go out over the
//! socket, and "settling" means waiting for further viewport frames to
//! arrive after a programmatic scroll.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use shelfside_core::ports::{PortError, PortResult, ViewportPort};
use tokio::sync::{Mutex, Notify};

use crate::web::protocol::ServerMessage;
use crate::web::state::ReaderState;

pub struct WsViewport {
    state: Arc<Mutex<ReaderState>>,
    sender: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    frames: Arc<Notify>,
}

impl WsViewport {
    pub fn new(
        state: Arc<Mutex<ReaderState>>,
        sender: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    ) -> Self {
        Self {
            state,
            sender,
            frames: Arc::new(Notify::new()),
        }
    }

    /// Called by the connection loop whenever the client reports a
    /// viewport frame; wakes any settle waiters.
    pub fn frame_tick(&self) {
        self.frames.notify_waiters();
    }

    async fn send(&self, message: &ServerMessage) -> PortResult<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.sender
            .lock()
            .await
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

#[async_trait]
impl ViewportPort for WsViewport {
    async fn page_top(&self, page: u32) -> PortResult<Option<f64>> {
        Ok(self.state.lock().await.page_tops.get(&page).copied())
    }

    async fn scroll_to(&self, offset: f64, smooth: bool) -> PortResult<()> {
        self.send(&ServerMessage::ScrollTo { offset, smooth }).await
    }

    // Waits for the client to report more frames; a hidden tab may never
    // send them, so the seeker bounds this wait on its side.
    async fn settle(&self, frames: u32) -> PortResult<()> {
        for _ in 0..frames {
            self.frames.notified().await;
        }
        Ok(())
    }
}
