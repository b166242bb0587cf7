pub mod admin;
pub mod dns;
pub mod geoip;
pub mod http;
pub mod meta;
pub mod robots;
pub mod tech;
pub mod tls;
pub mod whois;

pub use admin::AdminPanelProbe;
pub use dns::DnsProbe;
pub use geoip::GeoIpProbe;
pub use http::HttpHeadersProbe;
pub use meta::MetaProbe;
pub use robots::RobotsProbe;
pub use tech::TechProbe;
pub use tls::TlsProbe;
pub use whois::WhoisProbe;

use std::path::Path;
use std::sync::Arc;

use crate::probe::Probe;

/// The fixed probe registry. Order is significant only for report
/// readability; results are independent.
pub fn create_default_probes(admin_paths: &Path) -> Vec<Arc<dyn Probe>> {
    vec![
        Arc::new(WhoisProbe::new()),
        Arc::new(DnsProbe::new()),
        Arc::new(GeoIpProbe::new()),
        Arc::new(TlsProbe::new()),
        Arc::new(HttpHeadersProbe::new()),
        Arc::new(RobotsProbe::new()),
        Arc::new(TechProbe::new()),
        Arc::new(MetaProbe::new()),
        Arc::new(AdminPanelProbe::new(admin_paths.to_path_buf())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[test]
    fn test_default_registry() {
        let probes = create_default_probes(&PathBuf::from("assets/common_admin_paths.txt"));
        assert_eq!(probes.len(), 9);

        let names: Vec<&str> = probes.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "WHOIS",
                "DNS Records",
                "IP Geolocation",
                "TLS Certificate",
                "HTTP Headers",
                "Robots.txt & Sitemap.xml",
                "Tech Stack",
                "HTML Metadata",
                "Admin Panel Finder",
            ]
        );

        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
    }
}
