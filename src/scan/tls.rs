use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eyre::{Result, WrapErr};
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

use crate::probe::{Probe, ProbeContext, probe_timeout};
use crate::report::Value;
use crate::target::host_only;

pub const MODULE_NAME: &str = "TLS Certificate";

const TLS_PORT: u16 = 443;

pub struct TlsProbe {
    timeout: Duration,
}

impl Default for TlsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TlsProbe {
    pub fn new() -> Self {
        Self {
            timeout: probe_timeout(),
        }
    }

    fn connector() -> Result<TlsConnector> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()
        .map_err(|e| eyre::eyre!("TLS configuration error: {e}"))?
        .with_root_certificates(roots)
        .with_no_client_auth();

        Ok(TlsConnector::from(Arc::new(config)))
    }
}

#[async_trait]
impl Probe for TlsProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        let domain = host_only(&ctx.host).to_string();
        log::debug!(
            "[scan::tls] handshake_starting: domain={} port={} timeout={}ms",
            domain,
            TLS_PORT,
            self.timeout.as_millis()
        );

        let connector = Self::connector()?;
        let server_name = ServerName::try_from(domain.clone())
            .map_err(|_| eyre::eyre!("invalid server name '{domain}'"))?;

        let tcp = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((domain.as_str(), TLS_PORT)),
        )
        .await
        .map_err(|_| eyre::eyre!("connection to {domain}:{TLS_PORT} timed out"))?
        .wrap_err_with(|| format!("could not connect to {domain}:{TLS_PORT}"))?;

        let stream = tokio::time::timeout(self.timeout, connector.connect(server_name, tcp))
            .await
            .map_err(|_| eyre::eyre!("TLS handshake with {domain} timed out"))?
            .wrap_err_with(|| format!("TLS handshake with {domain} failed"))?;

        let (_, session) = stream.get_ref();
        let leaf = session
            .peer_certificates()
            .and_then(|certs| certs.first())
            .ok_or_else(|| eyre::eyre!("no peer certificate presented by {domain}"))?;

        let summary = certificate_summary(leaf.as_ref())?;
        log::debug!("[scan::tls] certificate_retrieved: domain={domain}");
        Ok(summary)
    }
}

/// Decode a DER-encoded leaf certificate into the flat report mapping:
/// subject, issuer, validity window, and DNS-typed subject alternative
/// names.
pub(crate) fn certificate_summary(der: &[u8]) -> Result<Value> {
    let (_, cert) =
        parse_x509_certificate(der).map_err(|e| eyre::eyre!("X.509 parse error: {e}"))?;

    let mut value = Value::map();
    value.insert("Subject", Value::str(cert.subject().to_string()));
    value.insert("Issuer", Value::str(cert.issuer().to_string()));
    value.insert("Serial Number", Value::str(cert.raw_serial_as_string()));

    let validity = cert.validity();
    value.insert("Valid From", Value::str(format_asn1_time(&validity.not_before)));
    value.insert("Valid To", Value::str(format_asn1_time(&validity.not_after)));

    let mut san_names = Vec::new();
    if let Ok(Some(san)) = cert.subject_alternative_name() {
        for name in &san.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                san_names.push(dns.to_string());
            }
        }
    }
    value.insert("Subject Alt Names", Value::list(san_names));

    Ok(value)
}

fn format_asn1_time(time: &ASN1Time) -> String {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| time.timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_der_is_rejected() {
        let error = certificate_summary(&[0x00, 0x01, 0x02]).unwrap_err();
        assert!(error.to_string().contains("X.509 parse error"));
    }

    #[test]
    fn test_connector_builds() {
        assert!(TlsProbe::connector().is_ok());
    }
}
