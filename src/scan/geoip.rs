use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;

use crate::probe::{Probe, ProbeContext, http_client, probe_timeout};
use crate::report::Value;

pub const MODULE_NAME: &str = "IP Geolocation";

const MISSING_FIELD: &str = "N/A";

#[derive(Debug, Deserialize)]
pub(crate) struct IpInfoResponse {
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    /// "lat,lon"
    loc: Option<String>,
    /// "AS#### Organization Name"
    org: Option<String>,
}

pub struct GeoIpProbe {
    client: Client,
}

impl Default for GeoIpProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoIpProbe {
    pub fn new() -> Self {
        Self {
            client: http_client(probe_timeout()),
        }
    }
}

#[async_trait]
impl Probe for GeoIpProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        // Depends on the IP the engine resolved once; no network call
        // happens when resolution failed.
        let ip = ctx
            .ip
            .ok_or_else(|| eyre::eyre!("Cannot geolocate without an IP address."))?;

        let url = format!("https://ipinfo.io/{ip}/json");
        log::debug!("[scan::geoip] lookup: ip={ip} url={url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err("API request failed")?
            .error_for_status()
            .wrap_err("API request failed")?;

        let info: IpInfoResponse = response
            .json()
            .await
            .wrap_err("Failed to parse geolocation response")?;

        Ok(location_value(info))
    }
}

pub(crate) fn location_value(info: IpInfoResponse) -> Value {
    let field = |opt: Option<String>| Value::Str(opt.unwrap_or_else(|| MISSING_FIELD.to_string()));

    let mut value = Value::map();
    value.insert("City", field(info.city));
    value.insert("Region", field(info.region));
    value.insert("Country", field(info.country));
    value.insert("Location", field(info.loc));
    value.insert("Organization", field(info.org));
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_short_circuits_without_ip() {
        let probe = GeoIpProbe::new();
        let ctx = ProbeContext::new("example.com", None);
        let error = probe.run(&ctx).await.unwrap_err();
        assert_eq!(error.to_string(), "Cannot geolocate without an IP address.");
    }

    #[test]
    fn test_location_value_complete() {
        let info = IpInfoResponse {
            city: Some("Los Angeles".to_string()),
            region: Some("California".to_string()),
            country: Some("US".to_string()),
            loc: Some("34.0522,-118.2437".to_string()),
            org: Some("AS15133 Edgecast Inc.".to_string()),
        };
        let value = location_value(info);
        assert_eq!(value.get("City").and_then(Value::as_str), Some("Los Angeles"));
        assert_eq!(
            value.get("Organization").and_then(Value::as_str),
            Some("AS15133 Edgecast Inc.")
        );
    }

    #[test]
    fn test_missing_fields_default_to_na() {
        let info = IpInfoResponse {
            city: None,
            region: None,
            country: Some("US".to_string()),
            loc: None,
            org: None,
        };
        let value = location_value(info);
        assert_eq!(value.get("City").and_then(Value::as_str), Some("N/A"));
        assert_eq!(value.get("Country").and_then(Value::as_str), Some("US"));
        assert_eq!(value.get("Location").and_then(Value::as_str), Some("N/A"));
    }
}
