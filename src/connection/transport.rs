//! Established transport handle (TCP, TLS-over-TCP, or Unix socket)

use crate::Result;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};

/// An established duplex byte stream, ready for the protocol handshake.
///
/// Produced by the connector; ownership transfers to the caller, which is
/// responsible for closing it (dropping the transport closes the socket).
#[allow(clippy::large_enum_variant)]
pub enum Transport {
    /// Plain TCP connection
    Tcp(TcpStream),
    /// TLS-encrypted TCP connection
    Tls(tokio_rustls::client::TlsStream<TcpStream>),
    /// Unix domain socket
    Unix(UnixStream),
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::Tcp(_) => f.write_str("Transport::Tcp(TcpStream)"),
            Transport::Tls(_) => f.write_str("Transport::Tls(TlsStream)"),
            Transport::Unix(_) => f.write_str("Transport::Unix(UnixStream)"),
        }
    }
}

impl Transport {
    /// Write all bytes to the stream
    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        match self {
            Transport::Tcp(stream) => stream.write_all(buf).await?,
            Transport::Tls(stream) => stream.write_all(buf).await?,
            Transport::Unix(stream) => stream.write_all(buf).await?,
        }
        Ok(())
    }

    /// Flush the stream
    pub async fn flush(&mut self) -> Result<()> {
        match self {
            Transport::Tcp(stream) => stream.flush().await?,
            Transport::Tls(stream) => stream.flush().await?,
            Transport::Unix(stream) => stream.flush().await?,
        }
        Ok(())
    }

    /// Read into buffer, returning the number of bytes read (0 = EOF)
    pub async fn read_buf(&mut self, buf: &mut BytesMut) -> Result<usize> {
        let n = match self {
            Transport::Tcp(stream) => stream.read_buf(buf).await?,
            Transport::Tls(stream) => stream.read_buf(buf).await?,
            Transport::Unix(stream) => stream.read_buf(buf).await?,
        };
        Ok(n)
    }

    /// Shut down the write side of the stream
    pub async fn shutdown(&mut self) -> Result<()> {
        match self {
            Transport::Tcp(stream) => stream.shutdown().await?,
            Transport::Tls(stream) => stream.shutdown().await?,
            Transport::Unix(stream) => stream.shutdown().await?,
        }
        Ok(())
    }

    /// Whether the stream is TLS-encrypted
    pub fn is_tls(&self) -> bool {
        matches!(self, Transport::Tls(_))
    }

    /// The server's DER-encoded leaf certificate, for TLS connections.
    ///
    /// Returns `None` for plain TCP and Unix socket connections. The auth
    /// layer hashes this for channel binding.
    pub fn peer_certificate(&self) -> Option<Vec<u8>> {
        match self {
            Transport::Tls(stream) => {
                let (_tcp, conn) = stream.get_ref();
                let certs = conn.peer_certificates()?;
                certs.first().map(|cert| cert.as_ref().to_vec())
            }
            Transport::Tcp(_) | Transport::Unix(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_write_read() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let server = tokio::spawn(async move {
            let (mut peer, _) = listener.accept().await.expect("accept");
            let mut buf = [0u8; 4];
            peer.read_exact(&mut buf).await.expect("read");
            peer.write_all(&buf).await.expect("echo");
        });

        let stream = TcpStream::connect(addr).await.expect("connect");
        let mut transport = Transport::Tcp(stream);
        transport.write_all(b"ping").await.expect("write");
        transport.flush().await.expect("flush");

        let mut buf = BytesMut::with_capacity(16);
        let n = transport.read_buf(&mut buf).await.expect("read");
        assert_eq!(&buf[..n], b"ping");

        transport.shutdown().await.expect("shutdown");
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_plain_transport_has_no_peer_certificate() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let stream = TcpStream::connect(addr).await.expect("connect");

        let transport = Transport::Tcp(stream);
        assert!(!transport.is_tls());
        assert!(transport.peer_certificate().is_none());
        assert_eq!(format!("{:?}", transport), "Transport::Tcp(TcpStream)");
    }
}
