pub mod protocol;
pub mod rest;
pub mod state;
pub mod viewport;
pub mod ws_handler;

// Re-export the main WebSocket handler to make it easily accessible
// to the binary that will build the web server router.
pub use rest::{user_stats_handler, user_year_handler};
pub use ws_handler::ws_handler;
