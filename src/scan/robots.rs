use async_trait::async_trait;
use eyre::Result;
use reqwest::{Client, StatusCode};

use crate::probe::{Probe, ProbeContext, http_client, probe_timeout};
use crate::report::Value;

pub const MODULE_NAME: &str = "Robots.txt & Sitemap.xml";

const WELL_KNOWN_FILES: [&str; 2] = ["robots.txt", "sitemap.xml"];
const RETRIEVAL_FAILED: &str = "Failed to retrieve.";

pub struct RobotsProbe {
    client: Client,
}

impl Default for RobotsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotsProbe {
    pub fn new() -> Self {
        Self {
            client: http_client(probe_timeout()),
        }
    }
}

#[async_trait]
impl Probe for RobotsProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        let mut value = Value::map();

        // Each file is fetched independently; one failing never affects
        // the other.
        for file in WELL_KNOWN_FILES {
            let url = format!("https://{}/{}", ctx.host, file);
            let entry = match self.client.get(&url).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    match response.text().await {
                        Ok(body) => Value::str(body.trim()),
                        Err(e) => {
                            log::debug!("[scan::robots] body_read_failed: url={url} error={e}");
                            Value::str(RETRIEVAL_FAILED)
                        }
                    }
                }
                Ok(response) => Value::str(not_found_marker(response.status().as_u16())),
                Err(e) => {
                    log::debug!("[scan::robots] fetch_failed: url={url} error={e}");
                    Value::str(RETRIEVAL_FAILED)
                }
            };
            value.insert(file, entry);
        }

        Ok(value)
    }
}

pub(crate) fn not_found_marker(status: u16) -> String {
    format!("Not found (Status: {status})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_marker_interpolates_status() {
        assert_eq!(not_found_marker(404), "Not found (Status: 404)");
        assert_eq!(not_found_marker(503), "Not found (Status: 503)");
    }

    #[test]
    fn test_both_files_probed() {
        assert_eq!(WELL_KNOWN_FILES, ["robots.txt", "sitemap.xml"]);
    }
}
