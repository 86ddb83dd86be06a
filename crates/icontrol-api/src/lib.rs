// icontrol-api: Async HTTP transport for BIG-IP/BIG-IQ iControl REST.

pub mod auth;
pub mod error;
pub mod session;
pub mod transport;

pub use auth::{AuthMethod, Credentials};
pub use error::Error;
pub use session::{ConnectionConfig, Session};
pub use transport::{TlsMode, TransportConfig};
