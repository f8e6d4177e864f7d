// dfp-api: Async Rust client for token-protected DFP/TFP device endpoints

pub mod auth;
pub mod device;
pub mod error;
pub mod session;
pub mod transport;

pub use auth::{Credentials, TOKEN_LEASE, Token};
pub use device::models::{Attributes, Family, Module};
pub use device::DeviceClient;
pub use error::Error;
pub use session::Session;
pub use transport::{TlsMode, TransportConfig};
