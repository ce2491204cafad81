//! # mysql-wire
//!
//! Connection establishment layer for MySQL-compatible client drivers.
//!
//! This crate turns a validated [`Config`] (network kind, address, timeout,
//! optional custom dialer, optional TLS settings) plus a caller-supplied
//! [`Context`] into a live, caller-owned [`Transport`], ready for the
//! protocol handshake. It sits strictly below the wire-protocol layer:
//! authentication, query execution, and pooling are collaborators, not part
//! of this crate.
//!
//! # Quick start
//!
//! ```no_run
//! use mysql_wire::{Config, Connector, Context, NetKind};
//! use std::time::Duration;
//!
//! # async fn example() -> mysql_wire::Result<()> {
//! let config = Config::builder(NetKind::Tcp, "db.example.com:3306")
//!     .connect_timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let connector = Connector::new(config);
//! let ctx = Context::background().with_timeout(Duration::from_secs(30));
//! let transport = connector.connect(&ctx).await?;
//! # let _ = transport;
//! # Ok(())
//! # }
//! ```
//!
//! # Cancellation
//!
//! Every blocking step of `connect` (the dial and the optional TLS
//! handshake) races against the supplied [`Context`]: cancelling it aborts
//! the in-flight socket, and deadline expiry surfaces as a dial error of the
//! form `dial tcp host:port: i/o timeout`. Once `connect` has returned, the
//! context no longer governs the connection.

pub mod connection;
pub mod connector;
pub mod context;
mod error;

pub use connection::{Config, ConfigBuilder, DialFunc, NetKind, TlsConfig, TlsMode, Transport};
pub use connector::{
    disable_connection_info_fetch, is_connection_info_fetch_disabled, Connector,
};
pub use context::Context;
pub use error::{DialError, DialErrorKind, Error, Result};
