//! services/reader/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser reader and
//! the server. The client owns rendering and reports layout geometry; the
//! server owns page tracking and tells the client where to scroll.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One page's visibility measurement inside a viewport frame.
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct PageVisibility {
    pub page: u32,
    /// Visibility ratio in [0, 1]; 0 when not intersecting.
    pub ratio: f64,
    /// Top edge offset relative to the viewport.
    pub top: f64,
}

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens a reader screen. This must be the first message sent on the
    /// connection.
    Open {
        user_id: Uuid,
        book_id: Uuid,
        /// Pixels reserved at the top of the viewport for sticky chrome.
        header_offset: f64,
    },

    /// The rendering engine finished its initial load and knows the page
    /// count.
    DocumentLoaded { total_pages: u32 },

    /// A page element entered the rendered range, with its absolute
    /// document top offset.
    PageMounted { page: u32, top: f64 },

    /// A page element left the rendered range.
    PageUnmounted { page: u32 },

    /// One intersection-observer frame of visibility measurements. The
    /// client configures its observer with a shrunk bottom margin so only
    /// the top portion of the viewport counts as the active zone, and with
    /// multiple ratio thresholds for fine-grained callbacks.
    ViewportFrame { records: Vec<PageVisibility> },

    /// A user-initiated jump from a page-number input.
    JumpToPage { page: u32 },

    /// The document became hidden (tab switch); flush accrual now.
    VisibilityHidden,

    /// The sticky chrome changed height; prior measurements are stale.
    HeaderOffsetChanged { header_offset: f64 },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the reader screen is open and reports the saved position.
    ReaderReady {
        book_id: Uuid,
        last_page_read: u32,
        total_pages: Option<u32>,
    },

    /// Instructs the client to move the viewport to an absolute offset.
    ScrollTo { offset: f64, smooth: bool },

    /// The tracked current page changed.
    PageChanged { page: u32 },

    /// Reports a fatal error to the client, which should display a message.
    Error { message: String },
}
