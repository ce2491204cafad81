//! Connector: turns a validated [`Config`] plus a caller [`Context`] into a
//! live transport connection.
//!
//! The connector is stateless beyond its immutable configuration: `connect`
//! is a pure function of (config, context), so one instance can be shared
//! freely across tasks. Each call opens exactly one socket (plus the TLS
//! handshake over it, if configured) and never retries; retry policy belongs
//! to the pool layer.
//!
//! This module also hosts the connection-info-fetch suppression flag: a
//! driver-internal marker the reconnect path sets on its context so the
//! handshake layer can skip re-fetching server metadata it already has. The
//! flag's key type is private to this module, so no code outside the crate
//! can forge or tamper with it through the public context API.

use crate::connection::{parse_server_name, Config, NetKind, TlsConfig, Transport};
use crate::context::Context;
use crate::error::DialError;
use crate::{Error, Result};
use rustls_pki_types::ServerName;
use std::future::Future;
use std::io;
use tokio::net::{TcpStream, UnixStream};
use tokio::time::Instant;
use tokio_rustls::TlsConnector;

/// Establishes transport connections from an immutable [`Config`].
///
/// Safe to call concurrently and repeatedly from multiple tasks sharing one
/// instance; every call is independent.
#[derive(Debug, Clone)]
pub struct Connector {
    config: Config,
}

impl Connector {
    /// Wrap a validated configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration this connector dials with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Establish a connection, honoring the context's cancellation and the
    /// tighter of the context deadline and the configured connect timeout.
    ///
    /// On success the returned [`Transport`] is owned by the caller;
    /// cancelling the context afterwards has no effect on it. On failure no
    /// connection is returned and any partially-opened socket is closed.
    ///
    /// # Errors
    ///
    /// * [`Error::Dial`] — the transport could not be established; deadline
    ///   expiry renders as `dial <net> <addr>: i/o timeout`, other causes
    ///   forward the underlying I/O error unchanged.
    /// * [`Error::Cancelled`] — the context was cancelled by the caller.
    /// * [`Error::Tls`] — the TLS handshake failed; the raw socket is closed
    ///   before the error returns.
    pub async fn connect(&self, ctx: &Context) -> Result<Transport> {
        // Fail fast on a dead context before any I/O.
        match ctx.error() {
            Some(Error::DeadlineExceeded) => {
                return Err(DialError::timeout(self.config.net(), self.config.addr()).into());
            }
            Some(err) => return Err(err),
            None => {}
        }

        let deadline = self.effective_deadline(ctx);

        tracing::debug!(net = %self.config.net(), addr = self.config.addr(), "dialing");
        let raw = self.dial(ctx, deadline).await?;

        let transport = match self.config.tls() {
            Some(tls) if tls.mode().requires_tls() => {
                self.tls_handshake(ctx, deadline, raw, tls).await?
            }
            _ => raw,
        };

        tracing::debug!(transport = ?transport, "connection established");
        Ok(transport)
    }

    /// The tighter of the context deadline and the configured connect
    /// timeout; `None` when neither is set (dial then blocks until the
    /// OS-level connect resolves).
    fn effective_deadline(&self, ctx: &Context) -> Option<Instant> {
        let configured = self
            .config
            .connect_timeout()
            .map(|timeout| Instant::now() + timeout);
        match (ctx.deadline(), configured) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    async fn dial(&self, ctx: &Context, deadline: Option<Instant>) -> Result<Transport> {
        let net = self.config.net();
        let addr = self.config.addr();

        let dialed = match self.config.dial_func() {
            Some(dial) => {
                let fut = dial(ctx.clone(), addr.to_string());
                self.bounded(ctx, deadline, fut).await?
            }
            None => match net {
                NetKind::Tcp => {
                    self.bounded(ctx, deadline, async {
                        TcpStream::connect(addr).await.map(Transport::Tcp)
                    })
                    .await?
                }
                NetKind::Unix => {
                    self.bounded(ctx, deadline, async {
                        UnixStream::connect(addr).await.map(Transport::Unix)
                    })
                    .await?
                }
            },
        };

        dialed.map_err(|e| DialError::io(net, addr, e).into())
    }

    async fn tls_handshake(
        &self,
        ctx: &Context,
        deadline: Option<Instant>,
        raw: Transport,
        tls: &TlsConfig,
    ) -> Result<Transport> {
        let stream = match raw {
            Transport::Tcp(stream) => stream,
            other => {
                // Dropping `other` closes the socket.
                return Err(Error::Config(format!(
                    "TLS requires a plain tcp transport, got {:?}",
                    other
                )));
            }
        };

        let host = host_portion(self.config.addr());
        let server_name = parse_server_name(host)?;
        let server_name = ServerName::try_from(server_name)
            .map_err(|_| Error::Config(format!("invalid hostname for TLS: {}", host)))?;

        tracing::debug!(host, "starting TLS handshake");
        let connector = TlsConnector::from(tls.client_config());
        // The handshake future owns the raw stream; every failure path below
        // drops it, closing the socket.
        let handshake = connector.connect(server_name, stream);
        let tls_stream = self
            .bounded(ctx, deadline, handshake)
            .await?
            .map_err(Error::Tls)?;
        tracing::debug!("TLS handshake complete");

        Ok(Transport::Tls(tls_stream))
    }

    /// Race `fut` against the context's cancellation and the effective
    /// deadline. Deadline expiry is classified as a dial timeout;
    /// cancellation propagates as [`Error::Cancelled`]. Dropping `fut`
    /// aborts any in-flight socket.
    async fn bounded<F, T>(
        &self,
        ctx: &Context,
        deadline: Option<Instant>,
        fut: F,
    ) -> Result<io::Result<T>>
    where
        F: Future<Output = io::Result<T>>,
    {
        match deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    res = tokio::time::timeout_at(deadline, fut) => match res {
                        Ok(inner) => Ok(inner),
                        Err(_) => {
                            Err(DialError::timeout(self.config.net(), self.config.addr()).into())
                        }
                    },
                    _ = ctx.cancelled() => Err(Error::Cancelled),
                }
            }
            None => {
                tokio::select! {
                    biased;
                    res = fut => Ok(res),
                    _ = ctx.cancelled() => Err(Error::Cancelled),
                }
            }
        }
    }
}

/// Host part of a `host:port` address; returned unchanged when no port is
/// present.
fn host_portion(addr: &str) -> &str {
    match addr.rsplit_once(':') {
        Some((host, _port)) => host.trim_start_matches('[').trim_end_matches(']'),
        None => addr,
    }
}

/// Key type for the suppression flag. Private, so the flag cannot be set or
/// matched by any key constructed outside this module.
struct SuppressInfoFetch;

/// Mark `ctx` so that the post-connect server-info fetch is skipped.
///
/// Set by the reconnect path when connection metadata (version string, max
/// packet size, ...) is already cached and known valid, before it calls
/// [`Connector::connect`] and re-runs the handshake. The flag survives
/// further context derivation and cannot be unset.
pub fn disable_connection_info_fetch(ctx: &Context) -> Context {
    ctx.with_value::<SuppressInfoFetch, bool>(true)
}

/// Whether `ctx` was marked by [`disable_connection_info_fetch`].
///
/// Returns `false` for every other context, including one carrying an
/// unrelated value under a structurally similar key type.
pub fn is_connection_info_fetch_disabled(ctx: &Context) -> bool {
    ctx.value::<SuppressInfoFetch, bool>()
        .copied()
        .unwrap_or(false)
}
