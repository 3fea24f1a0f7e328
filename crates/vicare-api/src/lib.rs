// vicare-api: Async Rust client for the Viessmann IoT API

pub mod auth;
pub mod client;
pub mod equipment;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::{Endpoints, TokenOwner, TokenSet, TokenStore};
pub use client::ViessmannClient;
pub use equipment::DeviceRef;
pub use error::Error;
pub use models::{Device, Feature, Gateway, Installation};
pub use transport::TransportConfig;
