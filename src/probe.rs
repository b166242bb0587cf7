use async_trait::async_trait;
use eyre::Result;
use std::net::IpAddr;
use std::time::Duration;

use crate::report::Value;

/// Default per-request timeout for probe network calls.
pub const PROBE_TIMEOUT_SECS: u64 = 5;

pub fn probe_timeout() -> Duration {
    Duration::from_secs(PROBE_TIMEOUT_SECS)
}

/// Read-only inputs shared by every probe in one scan.
#[derive(Debug, Clone)]
pub struct ProbeContext {
    /// Canonical host from [`crate::target::normalize`].
    pub host: String,
    /// IP resolved once by the engine; `None` when resolution failed.
    pub ip: Option<IpAddr>,
}

impl ProbeContext {
    pub fn new(host: impl Into<String>, ip: Option<IpAddr>) -> Self {
        Self {
            host: host.into(),
            ip,
        }
    }
}

/// One information-gathering module.
///
/// Implementations are stateless across invocations and convert expected
/// network failures into descriptive errors instead of panicking; the
/// engine turns any `Err` into the module's `{error: <message>}` entry.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Report key for this module.
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &ProbeContext) -> Result<Value>;
}

/// Shared reqwest client builder: rustls, short timeout, product UA.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("recon/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
}
