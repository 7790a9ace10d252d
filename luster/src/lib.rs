//! # Luster
//!
//! An asynchronous client for the Revolt.chat API. It uses `tokio` for the
//! async runtime, `reqwest` for the REST API ("Delta") and the file server
//! ("Autumn"), and `tokio-tungstenite` for the event socket ("Bonfire").
//!
//! Two surfaces are offered:
//! * low-level: the endpoint traits in [`api`], implemented on
//!   [`HttpHandler`], returning the wire types in [`types`];
//! * high-level: [`Client`], the [`models`] that act on themselves, the
//!   [`cache`], and an [`EventHandler`] fed by the socket.
//!
//! ```no_run
//! use luster::{Client, EventHandler, Message};
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl EventHandler for Echo {
//!     async fn on_message(&self, _client: &Client, message: &Message) {
//!         if message.content.as_deref() == Some("!ping") {
//!             let _ = message.reply("Pong!").await;
//!         }
//!     }
//! }
//!
//! # async fn run() -> Result<(), luster::LusterError> {
//! let client = Client::new("bot-token", true)?;
//! client.event_handler(Echo).await;
//! client.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod state;
pub mod types;
pub mod util;
pub mod websocket;

pub use client::Client;
pub use config::{ClientConfig, Credentials, WebsocketFormat};
pub use error::LusterError;
pub use http::{create_http_handler, HttpHandler};
pub use state::State;
pub use types::*;
pub use websocket::{ConnectionState, EventHandler, ReadyEvent};
