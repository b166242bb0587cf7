use async_trait::async_trait;
use eyre::Result;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::RecordType;
use std::time::{Duration, Instant};

use crate::probe::{Probe, ProbeContext, probe_timeout};
use crate::report::Value;
use crate::target::host_only;

pub const MODULE_NAME: &str = "DNS Records";

/// Record types queried for every target, in report order.
pub const RECORD_TYPES: [RecordType; 6] = [
    RecordType::A,
    RecordType::AAAA,
    RecordType::MX,
    RecordType::NS,
    RecordType::TXT,
    RecordType::CNAME,
];

/// Sentinel for a record type that yielded no answer.
const NO_ANSWER: &str = "N/A";

pub struct DnsProbe {
    timeout: Duration,
}

impl Default for DnsProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsProbe {
    pub fn new() -> Self {
        Self {
            timeout: probe_timeout(),
        }
    }
}

#[async_trait]
impl Probe for DnsProbe {
    fn name(&self) -> &'static str {
        MODULE_NAME
    }

    async fn run(&self, ctx: &ProbeContext) -> Result<Value> {
        let domain = host_only(&ctx.host).to_string();
        log::debug!("[scan::dns] lookup_starting: domain={domain}");

        let mut opts = ResolverOpts::default();
        opts.timeout = self.timeout;
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);

        let mut value = Value::map();
        for rtype in RECORD_TYPES {
            let started = Instant::now();
            // Per-record-type isolation: one type failing or timing out
            // never aborts the module.
            let records = match tokio::time::timeout(
                self.timeout,
                resolver.lookup(domain.as_str(), rtype),
            )
            .await
            {
                Ok(Ok(lookup)) => {
                    let records: Vec<String> =
                        lookup.iter().map(|rdata| rdata.to_string()).collect();
                    log::trace!(
                        "[scan::dns] records_found: domain={} type={} count={} duration={}ms",
                        domain,
                        rtype,
                        records.len(),
                        started.elapsed().as_millis()
                    );
                    records
                }
                Ok(Err(e)) => {
                    log::trace!(
                        "[scan::dns] lookup_failed: domain={domain} type={rtype} error={e}"
                    );
                    Vec::new()
                }
                Err(_) => {
                    log::warn!(
                        "[scan::dns] lookup_timeout: domain={} type={} timeout={}ms",
                        domain,
                        rtype,
                        self.timeout.as_millis()
                    );
                    Vec::new()
                }
            };

            value.insert(rtype.to_string(), records_value(records));
        }

        Ok(value)
    }
}

pub(crate) fn records_value(records: Vec<String>) -> Value {
    if records.is_empty() {
        Value::list([NO_ANSWER])
    } else {
        Value::list(records)
    }
}
