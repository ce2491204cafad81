//! TLS configuration for encrypted server connections.
//!
//! TLS is recommended for all non-local connections to prevent credential
//! interception during the authentication handshake.

use crate::{Error, Result};
use rustls::ClientConfig;
use rustls::RootCertStore;
use rustls_pemfile::Item;
use std::fs;
use std::sync::Arc;

/// TLS mode matching the MySQL `ssl-mode` vocabulary.
///
/// Controls whether TLS is used and how strictly the server certificate is
/// checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// No TLS (plaintext connection)
    Disabled,
    /// TLS required; certificate must chain to a trusted CA
    #[default]
    Required,
    /// TLS required; certificate must chain to a trusted CA
    VerifyCa,
    /// TLS required; CA check plus hostname verification
    VerifyIdentity,
}

impl TlsMode {
    /// Whether this mode requires an encrypted connection
    pub fn requires_tls(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Whether this mode verifies the server hostname against the certificate
    pub fn verifies_identity(&self) -> bool {
        matches!(self, Self::VerifyIdentity)
    }
}

impl std::fmt::Display for TlsMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => write!(f, "disabled"),
            Self::Required => write!(f, "required"),
            Self::VerifyCa => write!(f, "verify-ca"),
            Self::VerifyIdentity => write!(f, "verify-identity"),
        }
    }
}

impl std::str::FromStr for TlsMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "required" => Ok(Self::Required),
            "verify-ca" => Ok(Self::VerifyCa),
            "verify-identity" => Ok(Self::VerifyIdentity),
            _ => Err(Error::Config(format!(
                "invalid ssl-mode '{}': expected disabled, required, verify-ca, or verify-identity",
                s
            ))),
        }
    }
}

/// TLS configuration for encrypted connections.
///
/// By default the server certificate is validated against the system root
/// store; a custom CA can be supplied for servers with private PKI.
///
/// # Examples
///
/// ```ignore
/// // System root certificates (production)
/// let tls = TlsConfig::builder()
///     .mode(TlsMode::VerifyIdentity)
///     .build()?;
///
/// // Custom CA certificate
/// let tls = TlsConfig::builder()
///     .ca_cert_path("/etc/mysql/ca.pem")
///     .build()?;
/// ```
#[derive(Clone)]
pub struct TlsConfig {
    /// Path to CA certificate file (None = use system roots)
    ca_cert_path: Option<String>,
    /// Verification mode
    mode: TlsMode,
    /// Compiled rustls ClientConfig
    client_config: Arc<ClientConfig>,
}

impl TlsConfig {
    /// Create a new TLS configuration builder.
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }

    /// The rustls ClientConfig for this TLS configuration.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    /// The configured verification mode.
    pub fn mode(&self) -> TlsMode {
        self.mode
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("ca_cert_path", &self.ca_cert_path)
            .field("mode", &self.mode)
            .field("client_config", &"<ClientConfig>")
            .finish()
    }
}

/// Builder for TLS configuration.
#[derive(Default)]
pub struct TlsConfigBuilder {
    ca_cert_path: Option<String>,
    mode: TlsMode,
}

impl TlsConfigBuilder {
    /// Set the path to a custom CA certificate file (PEM format).
    ///
    /// If not set, system root certificates are used.
    pub fn ca_cert_path(mut self, path: impl Into<String>) -> Self {
        self.ca_cert_path = Some(path.into());
        self
    }

    /// Set the verification mode (default: [`TlsMode::Required`]).
    pub fn mode(mut self, mode: TlsMode) -> Self {
        self.mode = mode;
        self
    }

    /// Build the TLS configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the CA certificate file cannot be read or contains
    /// no valid certificates, or if no system roots could be loaded.
    pub fn build(self) -> Result<TlsConfig> {
        let root_store = if let Some(ca_path) = &self.ca_cert_path {
            self.load_custom_ca(ca_path)?
        } else {
            let result = rustls_native_certs::load_native_certs();

            let mut store = RootCertStore::empty();
            for cert in result.certs {
                let _ = store.add_parsable_certificates(std::iter::once(cert));
            }

            if !result.errors.is_empty() && store.is_empty() {
                return Err(Error::Config(
                    "failed to load any system root certificates".to_string(),
                ));
            }

            store
        };

        let client_config = Arc::new(
            ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );

        Ok(TlsConfig {
            ca_cert_path: self.ca_cert_path,
            mode: self.mode,
            client_config,
        })
    }

    /// Load a custom CA certificate from a PEM file.
    fn load_custom_ca(&self, ca_path: &str) -> Result<RootCertStore> {
        let ca_cert_data = fs::read(ca_path).map_err(|e| {
            Error::Config(format!(
                "failed to read CA certificate file '{}': {}",
                ca_path, e
            ))
        })?;

        let mut reader = std::io::Cursor::new(&ca_cert_data);
        let mut root_store = RootCertStore::empty();
        let mut found_certs = 0;

        loop {
            match rustls_pemfile::read_one(&mut reader) {
                Ok(Some(Item::X509Certificate(cert))) => {
                    let _ = root_store.add_parsable_certificates(std::iter::once(cert));
                    found_certs += 1;
                }
                Ok(Some(_)) => {
                    // Skip non-certificate items (private keys, etc.)
                }
                Ok(None) => break,
                Err(_) => {
                    return Err(Error::Config(format!(
                        "failed to parse CA certificate from '{}'",
                        ca_path
                    )));
                }
            }
        }

        if found_certs == 0 {
            return Err(Error::Config(format!(
                "no valid certificates found in '{}'",
                ca_path
            )));
        }

        Ok(root_store)
    }
}

/// Parse a server name from a hostname or IP literal for TLS SNI.
///
/// IP literals (`127.0.0.1`, `::1`) are passed through unchanged; rustls
/// verifies them against the certificate's IP subject alternative names.
///
/// # Errors
///
/// Returns an error if the hostname is empty, too long, or contains
/// characters invalid in a DNS name.
pub fn parse_server_name(hostname: &str) -> Result<String> {
    if hostname.parse::<std::net::IpAddr>().is_ok() {
        return Ok(hostname.to_string());
    }

    let hostname = hostname.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(Error::Config(format!(
            "invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    if !hostname
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '.')
    {
        return Err(Error::Config(format!(
            "invalid hostname for TLS: '{}'",
            hostname
        )));
    }

    Ok(hostname.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_config_builder_defaults() {
        let builder = TlsConfigBuilder::default();
        assert_eq!(builder.mode, TlsMode::Required);
        assert!(builder.ca_cert_path.is_none());
    }

    #[test]
    fn test_tls_config_build_with_system_roots() {
        let tls = TlsConfig::builder()
            .mode(TlsMode::VerifyIdentity)
            .build()
            .expect("failed to build TLS config");

        assert_eq!(tls.mode(), TlsMode::VerifyIdentity);
        assert!(tls.mode().verifies_identity());
    }

    #[test]
    fn test_tls_config_missing_ca_file() {
        let result = TlsConfig::builder()
            .ca_cert_path("/nonexistent/ca.pem")
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_server_name_valid() {
        assert!(parse_server_name("localhost").is_ok());
        assert!(parse_server_name("example.com").is_ok());
        assert!(parse_server_name("db.internal.example.com").is_ok());
    }

    #[test]
    fn test_parse_server_name_trailing_dot() {
        assert_eq!(parse_server_name("example.com.").unwrap(), "example.com");
    }

    #[test]
    fn test_parse_server_name_ip_literals() {
        assert_eq!(parse_server_name("127.0.0.1").unwrap(), "127.0.0.1");
        assert_eq!(parse_server_name("::1").unwrap(), "::1");
        assert_eq!(
            parse_server_name("2001:db8::42").unwrap(),
            "2001:db8::42"
        );
    }

    #[test]
    fn test_parse_server_name_invalid() {
        assert!(parse_server_name("").is_err());
        assert!(parse_server_name("example.com:3306").is_err());
        assert!(parse_server_name(&"a".repeat(300)).is_err());
    }

    #[test]
    fn test_tls_mode_from_str() {
        assert_eq!("disabled".parse::<TlsMode>().unwrap(), TlsMode::Disabled);
        assert_eq!("required".parse::<TlsMode>().unwrap(), TlsMode::Required);
        assert_eq!("verify-ca".parse::<TlsMode>().unwrap(), TlsMode::VerifyCa);
        assert_eq!(
            "verify-identity".parse::<TlsMode>().unwrap(),
            TlsMode::VerifyIdentity
        );
        assert!("preferred".parse::<TlsMode>().is_err());
    }

    #[test]
    fn test_tls_mode_display() {
        assert_eq!(TlsMode::Disabled.to_string(), "disabled");
        assert_eq!(TlsMode::Required.to_string(), "required");
        assert_eq!(TlsMode::VerifyCa.to_string(), "verify-ca");
        assert_eq!(TlsMode::VerifyIdentity.to_string(), "verify-identity");
    }

    #[test]
    fn test_tls_mode_requires_tls() {
        assert!(!TlsMode::Disabled.requires_tls());
        assert!(TlsMode::Required.requires_tls());
        assert!(TlsMode::VerifyCa.requires_tls());
        assert!(TlsMode::VerifyIdentity.requires_tls());
    }

    #[test]
    fn test_tls_config_debug() {
        let tls = TlsConfig::builder()
            .build()
            .expect("failed to build TLS config");
        let debug_str = format!("{:?}", tls);
        assert!(debug_str.contains("TlsConfig"));
        assert!(debug_str.contains("mode"));
    }
}
