// dmxnode-api: Async Rust client for the DMX node REST API and status WebSocket

pub mod client;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;
pub mod websocket;

mod auth;
mod dmx;
mod file;
mod network;
mod system;

pub use client::DeviceClient;
pub use endpoint::{DeviceEndpoint, STATUS_SOCKET_PATH};
pub use error::Error;
pub use session::{MemoryTokenStore, TokenStore};
pub use system::FIRMWARE_FIELD;
pub use transport::{TlsMode, TransportConfig};
pub use websocket::FrameStream;
