// esplink-api: Async HTTP client for the device control API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::DeviceClient;
pub use error::Error;
pub use models::{Control, ControlBody, StatusResponse};
pub use transport::TransportConfig;
