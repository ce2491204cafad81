//! Connection establishment
//!
//! This module handles:
//! * Dial configuration (network kind, address, timeout, custom dialer)
//! * Transport abstraction (TCP, TLS-over-TCP, Unix socket)
//! * TLS configuration

mod config;
mod tls;
mod transport;

pub use config::{Config, ConfigBuilder, DialFunc, NetKind};
pub use tls::{parse_server_name, TlsConfig, TlsConfigBuilder, TlsMode};
pub use transport::Transport;
