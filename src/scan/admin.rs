use async_trait::async_trait;
use eyre::Result;
use futures::StreamExt;
use futures::stream;
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;

use crate::probe::{Probe, ProbeContext};
use crate::report::Value;

pub const MODULE_NAME: &str = "Admin Panel Finder";

const PATH_TIMEOUT_SECS: u64 = 3;
const PATH_CONCURRENCY: usize = 8;

pub struct AdminPanelProbe {
    client: Client,
    paths_file: PathBuf,
    scheme: &'static str,
}

impl AdminPanelProbe {
    pub fn new(paths_file: PathBuf) -> Self {
        // Redirects are not followed: a 3xx answer on a candidate path is
        // itself the signal.
        let client = Client::builder()
            .timeout(Duration::from_secs(PATH_TIMEOUT_SECS))
            .user_agent(concat!("recon/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            paths_file,
            scheme: "https",
        }
    }
}

#[async_trait]
impl Probe for AdminPanelProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        let raw = tokio::fs::read_to_string(&self.paths_file)
            .await
            .map_err(|_| eyre::eyre!("{} not found.", self.paths_file.display()))?;
        let paths = parse_paths(&raw);
        log::debug!(
            "[scan::admin] probing_paths: host={} candidates={}",
            ctx.host,
            paths.len()
        );

        let host = ctx.host.clone();
        let scheme = self.scheme;
        let found: Vec<String> = stream::iter(paths)
            .map(|path| {
                let client = self.client.clone();
                let url = format!("{scheme}://{host}/{path}");
                async move {
                    match client.get(&url).send().await {
                        Ok(response) => {
                            let status = response.status().as_u16();
                            if (200..400).contains(&status) {
                                log::debug!("[scan::admin] panel_found: url={url} status={status}");
                                Some(format!("{url} (Status: {status})"))
                            } else {
                                None
                            }
                        }
                        Err(e) => {
                            log::trace!("[scan::admin] probe_failed: url={url} error={e}");
                            None
                        }
                    }
                }
            })
            // buffered keeps wordlist order in the result
            .buffered(PATH_CONCURRENCY)
            .filter_map(|hit| async move { hit })
            .collect()
            .await;

        Ok(found_value(found))
    }
}

/// One candidate path per line, blank lines ignored.
pub(crate) fn parse_paths(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub(crate) fn found_value(found: Vec<String>) -> Value {
    let mut value = Value::map();
    let panels = if found.is_empty() {
        Value::list(["None"])
    } else {
        Value::list(found)
    };
    value.insert("Found Panels", panels);
    value
}
