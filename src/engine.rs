use async_trait::async_trait;
use futures::FutureExt;
use std::net::IpAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::lookup_host;
use tokio::sync::{Semaphore, watch};

use crate::probe::{Probe, ProbeContext};
use crate::progress::{ProbeStatus, ProgressEvent, ProgressReporter};
use crate::report::{IP_ADDRESS_KEY, IP_NOT_FOUND, ScanReport, Value};

/// All probes are I/O-bound, so the pool is sized to run a full default
/// registry nearly at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Best-effort host-to-IP resolution, injectable so scans can run against
/// canned addresses in tests.
#[async_trait]
pub trait ResolveIp: Send + Sync {
    async fn resolve(&self, host: &str) -> Option<IpAddr>;
}

/// Resolves through the operating system via `tokio::net::lookup_host`.
pub struct SystemResolver;

#[async_trait]
impl ResolveIp for SystemResolver {
    async fn resolve(&self, host: &str) -> Option<IpAddr> {
        // lookup_host needs a port; canonical hosts may already carry one.
        // Colons inside a bracketed IPv6 literal are not a port.
        let lookup = if crate::target::host_only(host) == host {
            format!("{host}:80")
        } else {
            host.to_string()
        };

        match lookup_host(&lookup).await {
            Ok(mut addrs) => addrs.next().map(|addr| addr.ip()),
            Err(e) => {
                log::debug!("[engine] ip_resolution_failed: host={host} error={e}");
                None
            }
        }
    }
}

/// Scan orchestrator: owns the ordered probe registry, runs each probe with
/// failure isolation, emits progress, and assembles the final report.
pub struct Engine {
    probes: Vec<Arc<dyn Probe>>,
    resolver: Arc<dyn ResolveIp>,
    concurrency: usize,
}

impl Engine {
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Self {
        Self {
            probes,
            resolver: Arc::new(SystemResolver),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ResolveIp>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn module_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Run every registered probe against `host` and return the completed
    /// report. Never fails: probe errors become `{error: <message>}`
    /// entries in the report.
    pub async fn run_full_scan(
        &self,
        host: &str,
        reporter: Arc<dyn ProgressReporter>,
    ) -> ScanReport {
        let (_tx, rx) = watch::channel(false);
        self.run_full_scan_with_cancel(host, reporter, rx).await
    }

    /// As [`run_full_scan`], with cooperative cancellation: when the watch
    /// flag flips to `true`, in-flight probes are abandoned and their slots
    /// filled with a cancellation error. Every module still emits its
    /// terminal progress event.
    ///
    /// [`run_full_scan`]: Engine::run_full_scan
    pub async fn run_full_scan_with_cancel(
        &self,
        host: &str,
        reporter: Arc<dyn ProgressReporter>,
        cancel: watch::Receiver<bool>,
    ) -> ScanReport {
        let scan_start = Instant::now();
        log::info!(
            "[engine] scan_starting: host={} modules={} concurrency={}",
            host,
            self.probes.len(),
            self.concurrency
        );

        // Resolve once; every probe that needs an IP shares this result.
        let ip = self.resolver.resolve(host).await;
        let mut report = ScanReport::new();
        report.insert(
            IP_ADDRESS_KEY,
            Value::str(
                ip.map(|ip| ip.to_string())
                    .unwrap_or_else(|| IP_NOT_FOUND.to_string()),
            ),
        );
        log::debug!(
            "[engine] ip_resolved: host={} ip={}",
            host,
            report.ip_address().unwrap_or(IP_NOT_FOUND)
        );

        let ctx = Arc::new(ProbeContext::new(host, ip));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = Vec::with_capacity(self.probes.len());

        for (index, probe) in self.probes.iter().enumerate() {
            let probe = Arc::clone(probe);
            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);
            let reporter = Arc::clone(&reporter);
            let cancel = cancel.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let name = probe.name();
                let started = Instant::now();
                reporter.report(ProgressEvent::new(name, ProbeStatus::Scanning));

                let outcome = tokio::select! {
                    _ = cancelled(cancel) => Err(eyre::eyre!("Scan cancelled.")),
                    result = AssertUnwindSafe(probe.run(ctx.as_ref())).catch_unwind() => {
                        match result {
                            Ok(inner) => inner,
                            Err(_) => Err(eyre::eyre!("probe '{name}' panicked")),
                        }
                    }
                };

                let value = match outcome {
                    Ok(value) => {
                        log::debug!(
                            "[engine] probe_completed: module={} duration={}ms",
                            name,
                            started.elapsed().as_millis()
                        );
                        reporter.report(ProgressEvent::new(name, ProbeStatus::Done));
                        value
                    }
                    Err(error) => {
                        log::warn!(
                            "[engine] probe_failed: module={} duration={}ms error={}",
                            name,
                            started.elapsed().as_millis(),
                            error
                        );
                        reporter.report(ProgressEvent::new(name, ProbeStatus::Error));
                        Value::error(error.to_string())
                    }
                };

                (index, name, value)
            }));
        }

        // Merge by registration index so the report order matches the
        // registry no matter which probe finishes first.
        let mut slots: Vec<Option<(&'static str, Value)>> = Vec::new();
        slots.resize_with(self.probes.len(), || None);
        for task in tasks {
            match task.await {
                Ok((index, name, value)) => slots[index] = Some((name, value)),
                Err(e) => log::error!("[engine] probe_task_join_failed: error={e}"),
            }
        }
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some((name, value)) => report.insert(name, value),
                // Join failures are already guarded by catch_unwind; keep
                // the one-entry-per-module invariant regardless.
                None => report.insert(self.probes[index].name(), Value::error("probe task failed")),
            }
        }

        log::info!(
            "[engine] scan_completed: host={} entries={} duration={}ms",
            host,
            report.len(),
            scan_start.elapsed().as_millis()
        );
        report
    }
}

/// Resolves when the cancel flag flips to true. Pends forever if the
/// sender is dropped without cancelling, so an unused channel never trips
/// the select arm.
async fn cancelled(mut cancel: watch::Receiver<bool>) {
    if cancel.wait_for(|flag| *flag).await.is_err() {
        futures::future::pending::<()>().await;
    }
}
