// llmstack-api: Async Rust client for the LLMStack REST and WebSocket APIs

pub mod client;
pub mod error;
pub mod models;
pub mod protocol;
pub mod transport;
pub mod websocket;

mod endpoints;

pub use client::ApiClient;
pub use error::Error;
pub use protocol::SocketProtocol;
pub use transport::{TlsMode, TransportConfig};
pub use websocket::{SocketAuth, SocketHandle};
