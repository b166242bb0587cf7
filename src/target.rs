use eyre::{Result, WrapErr};
use url::Url;

/// Derive the canonical host from arbitrary user input.
///
/// Accepts bare domains ("example.com"), scheme-qualified URLs, and URLs
/// with paths or query strings; all forms reduce to the same network
/// location. An explicit port is preserved ("example.com:8080"). Performs
/// no network I/O.
pub fn normalize(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        eyre::bail!("invalid target: input is empty");
    }

    // urlparse-style parsing needs a scheme; default to http for bare domains
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&with_scheme)
        .wrap_err_with(|| format!("invalid target: could not parse '{raw}'"))?;

    let host = url
        .host_str()
        .ok_or_else(|| eyre::eyre!("invalid target: no host in '{raw}'"))?;

    let canonical = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };

    log::debug!("[target] normalized: raw={raw} host={canonical}");
    Ok(canonical)
}

/// Split an optional `:port` suffix off a canonical host.
pub fn host_only(host: &str) -> &str {
    host.rsplit_once(':')
        .filter(|(_, port)| port.chars().all(|c| c.is_ascii_digit()))
        .map(|(h, _)| h)
        .unwrap_or(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_domain() {
        assert_eq!(normalize("example.com").unwrap(), "example.com");
    }

    #[test]
    fn test_http_url() {
        assert_eq!(normalize("http://example.com").unwrap(), "example.com");
    }

    #[test]
    fn test_https_url_with_path_and_query() {
        assert_eq!(
            normalize("https://example.com/some/path?q=1").unwrap(),
            "example.com"
        );
    }

    #[test]
    fn test_all_forms_agree() {
        let inputs = [
            "example.com",
            "http://example.com",
            "https://example.com/login?next=/",
        ];
        for input in inputs {
            assert_eq!(normalize(input).unwrap(), "example.com");
        }
    }

    #[test]
    fn test_explicit_port_preserved() {
        assert_eq!(normalize("example.com:8080").unwrap(), "example.com:8080");
        assert_eq!(
            normalize("https://example.com:8443/x").unwrap(),
            "example.com:8443"
        );
    }

    #[test]
    fn test_default_port_stripped() {
        // url treats scheme-default ports as absent
        assert_eq!(normalize("https://example.com:443").unwrap(), "example.com");
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(normalize("  example.com  ").unwrap(), "example.com");
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
    }

    #[test]
    fn test_round_trip_stable() {
        let host = normalize("https://example.com/path").unwrap();
        let again = normalize(&format!("http://{host}")).unwrap();
        assert_eq!(host, again);
    }

    #[test]
    fn test_host_only() {
        assert_eq!(host_only("example.com:8080"), "example.com");
        assert_eq!(host_only("example.com"), "example.com");
    }
}
