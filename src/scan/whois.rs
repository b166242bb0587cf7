use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::Client;
use std::sync::Arc;

use crate::probe::{Probe, ProbeContext, http_client, probe_timeout};
use crate::report::Value;
use crate::target::host_only;

pub const MODULE_NAME: &str = "WHOIS";

/// Registration-data capability. Probes are wired to a real backend or to
/// [`UnavailableBackend`] at construction time, so availability is decided
/// once instead of checked inside the probe body.
#[async_trait]
pub trait WhoisBackend: Send + Sync {
    async fn lookup(&self, domain: &str) -> Result<serde_json::Value>;
}

/// RDAP over HTTPS, the structured successor to port-43 WHOIS.
pub struct RdapBackend {
    client: Client,
}

impl Default for RdapBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RdapBackend {
    pub fn new() -> Self {
        Self {
            client: http_client(probe_timeout()),
        }
    }

    fn endpoint(domain: &str) -> String {
        let tld = domain.rsplit('.').next().unwrap_or("");
        match tld.to_lowercase().as_str() {
            "com" | "net" => format!("https://rdap.verisign.com/com/v1/domain/{domain}"),
            "org" => format!("https://rdap.publicinterestregistry.org/rdap/domain/{domain}"),
            "io" => format!("https://rdap.nic.io/domain/{domain}"),
            "uk" => format!("https://rdap.nominet.uk/uk/domain/{domain}"),
            "info" | "biz" => format!("https://rdap.afilias.net/rdap/domain/{domain}"),
            _ => format!("https://rdap.iana.org/domain/{domain}"),
        }
    }
}

#[async_trait]
impl WhoisBackend for RdapBackend {
    async fn lookup(&self, domain: &str) -> Result<serde_json::Value> {
        let url = Self::endpoint(domain);
        log::debug!("[scan::whois] rdap_query: domain={domain} url={url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err("RDAP request failed")?;

        if !response.status().is_success() {
            eyre::bail!("RDAP query failed with status: {}", response.status());
        }

        response.json().await.wrap_err("Failed to parse RDAP response")
    }
}

/// Null backend: always reports the capability as missing.
pub struct UnavailableBackend(pub &'static str);

#[async_trait]
impl WhoisBackend for UnavailableBackend {
    async fn lookup(&self, _domain: &str) -> Result<serde_json::Value> {
        Err(eyre::eyre!("{} not available", self.0))
    }
}

pub struct WhoisProbe {
    backend: Arc<dyn WhoisBackend>,
}

impl Default for WhoisProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisProbe {
    pub fn new() -> Self {
        Self {
            backend: Arc::new(RdapBackend::new()),
        }
    }

    pub fn with_backend(backend: Arc<dyn WhoisBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Probe for WhoisProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        let domain = host_only(&ctx.host);
        let data = self.backend.lookup(domain).await?;
        Ok(summarize_rdap(domain, &data))
    }
}

/// Flatten an RDAP payload into the report shape: every field is a string
/// or a list of strings so the result renders and exports cleanly.
pub(crate) fn summarize_rdap(domain: &str, data: &serde_json::Value) -> Value {
    let mut value = Value::map();

    let name = data
        .get("ldhName")
        .and_then(|n| n.as_str())
        .unwrap_or(domain);
    value.insert("Domain Name", Value::str(name.to_lowercase()));

    if let Some(events) = data.get("events").and_then(|e| e.as_array()) {
        for event in events {
            let (Some(action), Some(date)) = (
                event.get("eventAction").and_then(|a| a.as_str()),
                event.get("eventDate").and_then(|d| d.as_str()),
            ) else {
                continue;
            };
            match action {
                "registration" => value.insert("Registration Date", Value::str(date)),
                "expiration" => value.insert("Expiry Date", Value::str(date)),
                "last changed" => value.insert("Last Updated", Value::str(date)),
                _ => {}
            }
        }
    }

    if let Some(registrar) = registrar_name(data) {
        value.insert("Registrar", Value::str(registrar));
    }

    if let Some(nameservers) = data.get("nameservers").and_then(|ns| ns.as_array()) {
        let names: Vec<String> = nameservers
            .iter()
            .filter_map(|ns| ns.get("ldhName").and_then(|n| n.as_str()))
            .map(|n| n.to_lowercase())
            .collect();
        if !names.is_empty() {
            value.insert("Name Servers", Value::list(names));
        }
    }

    if let Some(status) = data.get("status").and_then(|s| s.as_array()) {
        let statuses: Vec<String> = status
            .iter()
            .filter_map(|s| s.as_str())
            .map(String::from)
            .collect();
        if !statuses.is_empty() {
            value.insert("Status", Value::list(statuses));
        }
    }

    if let Some(signed) = data
        .get("secureDNS")
        .and_then(|s| s.get("delegationSigned"))
        .and_then(|d| d.as_bool())
    {
        value.insert(
            "DNSSEC",
            Value::str(if signed { "signed" } else { "unsigned" }),
        );
    }

    value
}

fn registrar_name(data: &serde_json::Value) -> Option<String> {
    let entities = data.get("entities")?.as_array()?;
    for entity in entities {
        let is_registrar = entity
            .get("roles")
            .and_then(|r| r.as_array())
            .is_some_and(|roles| roles.iter().any(|role| role.as_str() == Some("registrar")));
        if !is_registrar {
            continue;
        }
        // vCard: [["version", ...], ["fn", {}, "text", "<name>"], ...]
        let vcard = entity.get("vcardArray")?.get(1)?.as_array()?;
        for field in vcard {
            let parts = field.as_array()?;
            if parts.first().and_then(|p| p.as_str()) == Some("fn") {
                return parts.get(3).and_then(|p| p.as_str()).map(String::from);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize_rdap_payload() {
        let payload = json!({
            "ldhName": "EXAMPLE.COM",
            "events": [
                {"eventAction": "registration", "eventDate": "1995-08-14T04:00:00Z"},
                {"eventAction": "expiration", "eventDate": "2026-08-13T04:00:00Z"},
                {"eventAction": "last changed", "eventDate": "2025-08-14T07:01:31Z"}
            ],
            "nameservers": [
                {"ldhName": "A.IANA-SERVERS.NET"},
                {"ldhName": "B.IANA-SERVERS.NET"}
            ],
            "status": ["client delete prohibited"],
            "secureDNS": {"delegationSigned": true},
            "entities": [
                {
                    "roles": ["registrar"],
                    "vcardArray": ["vcard", [
                        ["version", {}, "text", "4.0"],
                        ["fn", {}, "text", "RESERVED-Internet Assigned Numbers Authority"]
                    ]]
                }
            ]
        });

        let value = summarize_rdap("example.com", &payload);
        assert_eq!(
            value.get("Domain Name").and_then(Value::as_str),
            Some("example.com")
        );
        assert_eq!(
            value.get("Registration Date").and_then(Value::as_str),
            Some("1995-08-14T04:00:00Z")
        );
        assert_eq!(value.get("DNSSEC").and_then(Value::as_str), Some("signed"));
        assert_eq!(
            value.get("Registrar").and_then(Value::as_str),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(
            value.get("Name Servers"),
            Some(&Value::list(["a.iana-servers.net", "b.iana-servers.net"]))
        );
    }

    #[test]
    fn test_summarize_minimal_payload_keeps_domain() {
        let value = summarize_rdap("example.com", &json!({}));
        assert_eq!(
            value.get("Domain Name").and_then(Value::as_str),
            Some("example.com")
        );
    }

    #[test]
    fn test_rdap_endpoint_selection() {
        assert!(RdapBackend::endpoint("example.com").contains("rdap.verisign.com"));
        assert!(RdapBackend::endpoint("example.org").contains("publicinterestregistry"));
        assert!(RdapBackend::endpoint("example.zz").contains("rdap.iana.org"));
    }

    #[tokio::test]
    async fn test_unavailable_backend_reports_missing_capability() {
        let probe = WhoisProbe::with_backend(Arc::new(UnavailableBackend("RDAP service")));
        let ctx = ProbeContext::new("example.com", None);
        let error = probe.run(&ctx).await.unwrap_err();
        assert_eq!(error.to_string(), "RDAP service not available");
    }
}
