use async_trait::async_trait;
use eyre::{Result, WrapErr};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;

use crate::probe::{Probe, ProbeContext, http_client, probe_timeout};
use crate::report::Value;

pub const MODULE_NAME: &str = "Tech Stack";

const NOTHING_FOUND: &str = "No specific technologies identified.";

/// Where a signature is matched.
enum Check {
    /// Pattern in a specific response header.
    Header(&'static str, &'static Lazy<Regex>),
    /// Pattern in the `<meta name="generator">` content.
    Generator(&'static Lazy<Regex>),
    /// Pattern anywhere in the HTML body.
    Body(&'static Lazy<Regex>),
}

struct Rule {
    tech: &'static str,
    category: &'static str,
    check: Check,
}

static RE_NGINX: Lazy<Regex> = Lazy::new(|| Regex::new(r"nginx(?:/([\d.]+))?").unwrap());
static RE_APACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Apache(?:/([\d.]+))?").unwrap());
static RE_CLOUDFLARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"cloudflare").unwrap());
static RE_LITESPEED: Lazy<Regex> = Lazy::new(|| Regex::new(r"LiteSpeed").unwrap());
static RE_IIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Microsoft-IIS(?:/([\d.]+))?").unwrap());
static RE_PHP: Lazy<Regex> = Lazy::new(|| Regex::new(r"PHP(?:/([\d.]+))?").unwrap());
static RE_EXPRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Express").unwrap());
static RE_ASPNET: Lazy<Regex> = Lazy::new(|| Regex::new(r"([\d.]+)").unwrap());
static RE_WORDPRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"WordPress(?: ([\d.]+))?").unwrap());
static RE_JOOMLA: Lazy<Regex> = Lazy::new(|| Regex::new(r"Joomla!?").unwrap());
static RE_DRUPAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Drupal(?: ([\d.]+))?").unwrap());
static RE_WP_CONTENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/wp-content/|/wp-includes/").unwrap());
static RE_NEXTJS: Lazy<Regex> = Lazy::new(|| Regex::new(r"/_next/static/").unwrap());
static RE_NUXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"__NUXT__").unwrap());
static RE_REACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"data-reactroot|react-dom").unwrap());
static RE_VUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"data-v-app|__VUE_").unwrap());

static RULES: &[Rule] = &[
    Rule { tech: "Nginx", category: "Web Server", check: Check::Header("server", &RE_NGINX) },
    Rule { tech: "Apache", category: "Web Server", check: Check::Header("server", &RE_APACHE) },
    Rule { tech: "Microsoft IIS", category: "Web Server", check: Check::Header("server", &RE_IIS) },
    Rule { tech: "LiteSpeed", category: "Web Server", check: Check::Header("server", &RE_LITESPEED) },
    Rule { tech: "Cloudflare", category: "CDN / WAF", check: Check::Header("server", &RE_CLOUDFLARE) },
    Rule { tech: "PHP", category: "Language", check: Check::Header("x-powered-by", &RE_PHP) },
    Rule { tech: "Express", category: "Framework", check: Check::Header("x-powered-by", &RE_EXPRESS) },
    Rule { tech: "ASP.NET", category: "Framework", check: Check::Header("x-aspnet-version", &RE_ASPNET) },
    Rule { tech: "WordPress", category: "CMS", check: Check::Generator(&RE_WORDPRESS) },
    Rule { tech: "WordPress", category: "CMS", check: Check::Body(&RE_WP_CONTENT) },
    Rule { tech: "Joomla", category: "CMS", check: Check::Generator(&RE_JOOMLA) },
    Rule { tech: "Drupal", category: "CMS", check: Check::Generator(&RE_DRUPAL) },
    Rule { tech: "Next.js", category: "JS Framework", check: Check::Body(&RE_NEXTJS) },
    Rule { tech: "Nuxt.js", category: "JS Framework", check: Check::Body(&RE_NUXT) },
    Rule { tech: "React", category: "JS Library", check: Check::Body(&RE_REACT) },
    Rule { tech: "Vue.js", category: "JS Library", check: Check::Body(&RE_VUE) },
];

pub struct TechProbe {
    client: Client,
}

impl Default for TechProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl TechProbe {
    pub fn new() -> Self {
        Self {
            client: http_client(probe_timeout()),
        }
    }
}

#[async_trait]
impl Probe for TechProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        let url = format!("https://{}", ctx.host);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .wrap_err_with(|| format!("could not fetch {url}"))?;

        let mut headers = HashMap::new();
        for (name, header) in response.headers() {
            if let Ok(text) = header.to_str() {
                headers.insert(name.as_str().to_string(), text.to_string());
            }
        }
        let body = response.text().await.unwrap_or_default();

        let detections = detect(&headers, &body);
        log::debug!(
            "[scan::tech] fingerprint_completed: host={} detections={}",
            ctx.host,
            detections.len()
        );

        if detections.is_empty() {
            return Ok(Value::info(NOTHING_FOUND));
        }

        let mut value = Value::map();
        for (tech, description) in detections {
            value.insert(tech, Value::str(description));
        }
        Ok(value)
    }
}

/// Apply the rule table to lowercase-keyed headers and the HTML body.
/// Returns `(technology, description)` pairs, first match per technology.
pub(crate) fn detect(headers: &HashMap<String, String>, body: &str) -> Vec<(String, String)> {
    let generator = generator_content(body);
    let mut found: Vec<(String, String)> = Vec::new();

    for rule in RULES {
        if found.iter().any(|(tech, _)| tech == rule.tech) {
            continue;
        }

        let captures = match &rule.check {
            Check::Header(name, re) => headers.get(*name).and_then(|v| re.captures(v)),
            Check::Generator(re) => generator.as_deref().and_then(|g| re.captures(g)),
            Check::Body(re) => re.captures(body),
        };

        if let Some(captures) = captures {
            let version = captures.get(1).map(|m| m.as_str()).filter(|v| !v.is_empty());
            let description = match version {
                Some(version) => format!("{} (version {})", rule.category, version),
                None => rule.category.to_string(),
            };
            found.push((rule.tech.to_string(), description));
        }
    }

    found
}

fn generator_content(body: &str) -> Option<String> {
    let document = Html::parse_document(body);
    let selector = Selector::parse(r#"meta[name="generator"]"#).expect("valid selector");
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_server_header_with_version() {
        let detections = detect(&headers(&[("server", "nginx/1.18.0")]), "");
        assert_eq!(
            detections,
            vec![("Nginx".to_string(), "Web Server (version 1.18.0)".to_string())]
        );
    }

    #[test]
    fn test_generator_meta_tag() {
        let body = r#"<html><head><meta name="generator" content="WordPress 6.4.2"></head></html>"#;
        let detections = detect(&HashMap::new(), body);
        assert!(detections
            .iter()
            .any(|(tech, desc)| tech == "WordPress" && desc.contains("6.4.2")));
    }

    #[test]
    fn test_body_signature() {
        let body = r#"<script src="/_next/static/chunks/main.js"></script>"#;
        let detections = detect(&HashMap::new(), body);
        assert!(detections.iter().any(|(tech, _)| tech == "Next.js"));
    }

    #[test]
    fn test_one_match_per_technology() {
        let body = r#"<link href="/wp-content/themes/x.css">
            <meta name="generator" content="WordPress 6.0">"#;
        let detections = detect(&HashMap::new(), body);
        let wordpress: Vec<_> = detections.iter().filter(|(t, _)| t == "WordPress").collect();
        assert_eq!(wordpress.len(), 1);
    }

    #[test]
    fn test_nothing_detected() {
        assert!(detect(&HashMap::new(), "<html></html>").is_empty());
    }

    #[test]
    fn test_powered_by_header() {
        let detections = detect(&headers(&[("x-powered-by", "PHP/8.1.2")]), "");
        assert_eq!(
            detections,
            vec![("PHP".to_string(), "Language (version 8.1.2)".to_string())]
        );
    }
}
