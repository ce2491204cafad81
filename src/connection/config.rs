//! Dial configuration

use super::tls::TlsConfig;
use super::transport::Transport;
use crate::context::Context;
use crate::{Error, Result};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;

/// Network kind the server address refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NetKind {
    /// Stream-oriented TCP (`host:port`)
    #[default]
    Tcp,
    /// Unix domain socket (filesystem path)
    Unix,
}

impl std::fmt::Display for NetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Unix => write!(f, "unix"),
        }
    }
}

impl std::str::FromStr for NetKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "unix" => Ok(Self::Unix),
            _ => Err(Error::Config(format!(
                "invalid network kind '{}': expected tcp or unix",
                s
            ))),
        }
    }
}

/// Pluggable dial function.
///
/// Receives a clone of the caller's [`Context`] (so it can honor cancellation
/// itself) and the configured address, and returns an established
/// [`Transport`]. Used to substitute the transport for testing or proxying;
/// the connector calls it exactly like the default dialer and wraps its
/// errors in the same dial-error shape.
pub type DialFunc =
    Arc<dyn Fn(Context, String) -> BoxFuture<'static, std::io::Result<Transport>> + Send + Sync>;

/// Validated dial configuration.
///
/// Immutable once built; the connector never mutates it. Produced by
/// configuration-parsing logic outside this layer, assembled here through
/// [`Config::builder`].
#[derive(Clone)]
pub struct Config {
    net: NetKind,
    addr: String,
    connect_timeout: Option<Duration>,
    dial_func: Option<DialFunc>,
    tls: Option<TlsConfig>,
}

impl Config {
    /// Create a builder for the given network kind and address.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = Config::builder(NetKind::Tcp, "db.example.com:3306")
    ///     .connect_timeout(Duration::from_secs(10))
    ///     .build()?;
    /// ```
    pub fn builder(net: NetKind, addr: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder {
            net,
            addr: addr.into(),
            connect_timeout: None,
            dial_func: None,
            tls: None,
        }
    }

    /// Network kind to dial
    pub fn net(&self) -> NetKind {
        self.net
    }

    /// Address to dial (`host:port` for TCP, socket path for Unix)
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Explicit connect timeout; `None` means no timeout beyond the
    /// context's deadline.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Custom dial function, if one was injected
    pub fn dial_func(&self) -> Option<&DialFunc> {
        self.dial_func.as_ref()
    }

    /// TLS configuration, if TLS was requested
    pub fn tls(&self) -> Option<&TlsConfig> {
        self.tls.as_ref()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("net", &self.net)
            .field("addr", &self.addr)
            .field("connect_timeout", &self.connect_timeout)
            .field("dial_func", &self.dial_func.as_ref().map(|_| "<DialFunc>"))
            .field("tls", &self.tls)
            .finish()
    }
}

/// Builder for [`Config`]
pub struct ConfigBuilder {
    net: NetKind,
    addr: String,
    connect_timeout: Option<Duration>,
    dial_func: Option<DialFunc>,
    tls: Option<TlsConfig>,
}

impl ConfigBuilder {
    /// Set the connect timeout.
    ///
    /// Default: None (dial is bounded only by the context's deadline and the
    /// OS-level connect timeout). A zero duration means the same thing as
    /// not setting a timeout at all.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Inject a custom dial function replacing the default dialer.
    pub fn dial_func(mut self, dial: DialFunc) -> Self {
        self.dial_func = Some(dial);
        self
    }

    /// Request TLS with the given configuration.
    ///
    /// Only valid for TCP addresses; rejected at build time otherwise.
    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty or if TLS was requested for
    /// a non-TCP address.
    pub fn build(self) -> Result<Config> {
        if self.addr.is_empty() {
            return Err(Error::Config("address must not be empty".into()));
        }
        // Zero reads as "no explicit timeout beyond the context deadline".
        let connect_timeout = self
            .connect_timeout
            .filter(|timeout| !timeout.is_zero());
        if self.tls.is_some() && self.net != NetKind::Tcp {
            return Err(Error::Config(format!(
                "TLS is only supported for tcp addresses, not {}",
                self.net
            )));
        }
        Ok(Config {
            net: self.net,
            addr: self.addr,
            connect_timeout,
            dial_func: self.dial_func,
            tls: self.tls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_kind_display() {
        assert_eq!(NetKind::Tcp.to_string(), "tcp");
        assert_eq!(NetKind::Unix.to_string(), "unix");
    }

    #[test]
    fn test_net_kind_from_str() {
        assert_eq!("tcp".parse::<NetKind>().unwrap(), NetKind::Tcp);
        assert_eq!("unix".parse::<NetKind>().unwrap(), NetKind::Unix);
        assert!("udp".parse::<NetKind>().is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder(NetKind::Tcp, "localhost:3306")
            .build()
            .unwrap();
        assert_eq!(config.net(), NetKind::Tcp);
        assert_eq!(config.addr(), "localhost:3306");
        assert!(config.connect_timeout().is_none());
        assert!(config.dial_func().is_none());
        assert!(config.tls().is_none());
    }

    #[test]
    fn test_builder_rejects_empty_addr() {
        assert!(Config::builder(NetKind::Tcp, "").build().is_err());
    }

    #[test]
    fn test_zero_timeout_means_no_timeout() {
        let config = Config::builder(NetKind::Tcp, "localhost:3306")
            .connect_timeout(Duration::ZERO)
            .build()
            .unwrap();
        assert!(config.connect_timeout().is_none());
    }

    #[test]
    fn test_positive_timeout_is_kept() {
        let config = Config::builder(NetKind::Tcp, "localhost:3306")
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap();
        assert_eq!(config.connect_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_builder_rejects_tls_over_unix() {
        let tls = TlsConfig::builder().build().unwrap();
        let result = Config::builder(NetKind::Unix, "/tmp/mysql.sock")
            .tls(tls)
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_config_debug_hides_dial_func() {
        let dial: DialFunc = Arc::new(|_ctx, _addr| {
            Box::pin(async { Err(std::io::Error::other("not implemented")) })
        });
        let config = Config::builder(NetKind::Tcp, "localhost:3306")
            .dial_func(dial)
            .build()
            .unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("<DialFunc>"));
    }
}
