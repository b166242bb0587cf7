use async_trait::async_trait;
use eyre::{Result, WrapErr};
use reqwest::Client;
use scraper::{Html, Selector};

use crate::probe::{Probe, ProbeContext, http_client, probe_timeout};
use crate::report::Value;

pub const MODULE_NAME: &str = "HTML Metadata";

const NOTHING_FOUND: &str = "No meta tags found.";

pub struct MetaProbe {
    client: Client,
}

impl Default for MetaProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaProbe {
    pub fn new() -> Self {
        Self {
            client: http_client(probe_timeout()),
        }
    }
}

#[async_trait]
impl Probe for MetaProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        let url = format!("https://{}", ctx.host);
        let body = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err_with(|| format!("could not fetch {url}"))?
            .text()
            .await
            .wrap_err("could not read homepage body")?;

        let tags = extract_meta(&body);
        log::debug!("[scan::meta] tags_extracted: host={} count={}", ctx.host, tags.len());

        if tags.is_empty() {
            return Ok(Value::info(NOTHING_FOUND));
        }

        let mut value = Value::map();
        for (key, content) in tags {
            value.insert(key, Value::str(content));
        }
        Ok(value)
    }
}

/// All `<meta>` tags with a non-empty content attribute, keyed by their
/// name attribute, falling back to property, then "N/A".
pub(crate) fn extract_meta(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("meta").expect("valid selector");

    document
        .select(&selector)
        .filter_map(|el| {
            let tag = el.value();
            let content = tag.attr("content").filter(|c| !c.is_empty())?;
            let key = tag
                .attr("name")
                .or_else(|| tag.attr("property"))
                .unwrap_or("N/A");
            Some((key.to_string(), content.to_string()))
        })
        .collect()
}
