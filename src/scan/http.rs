use async_trait::async_trait;
use eyre::Result;
use reqwest::Client;
use reqwest::header::HeaderMap;

use crate::probe::{Probe, ProbeContext, probe_timeout};
use crate::report::Value;

pub const MODULE_NAME: &str = "HTTP Headers";

const MAX_REDIRECTS: usize = 10;

pub struct HttpHeadersProbe {
    client: Client,
}

impl Default for HttpHeadersProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpHeadersProbe {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(probe_timeout())
            .user_agent(concat!("recon/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl Probe for HttpHeadersProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        // HTTPS first, plain HTTP as the fallback
        let urls = [
            format!("https://{}", ctx.host),
            format!("http://{}", ctx.host),
        ];

        for url in &urls {
            match self.client.head(url).send().await {
                Ok(response) => {
                    log::debug!(
                        "[scan::http] headers_retrieved: url={} status={}",
                        response.url(),
                        response.status()
                    );
                    let mut value = Value::map();
                    value.insert("Final URL", Value::str(response.url().to_string()));
                    value.insert(
                        "Status Code",
                        Value::str(response.status().as_u16().to_string()),
                    );
                    value.insert("Headers", headers_value(response.headers()));
                    return Ok(value);
                }
                Err(e) => {
                    log::debug!("[scan::http] attempt_failed: url={url} error={e}");
                    continue;
                }
            }
        }

        Err(eyre::eyre!("Could not connect to the server."))
    }
}

pub(crate) fn headers_value(headers: &HeaderMap) -> Value {
    let mut value = Value::map();
    for (name, header) in headers {
        let text = header.to_str().unwrap_or("<binary>").to_string();
        value.insert(name.as_str(), Value::str(text));
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SERVER};

    #[test]
    fn test_headers_value_conversion() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("nginx/1.18.0"));
        headers.insert("x-powered-by", HeaderValue::from_static("PHP/8.1"));

        let value = headers_value(&headers);
        assert_eq!(
            value.get("server").and_then(Value::as_str),
            Some("nginx/1.18.0")
        );
        assert_eq!(
            value.get("x-powered-by").and_then(Value::as_str),
            Some("PHP/8.1")
        );
    }

    #[test]
    fn test_empty_headers() {
        assert!(headers_value(&HeaderMap::new()).is_empty_map());
    }
}
