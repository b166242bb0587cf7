use std::fmt;

/// Terminal and non-terminal phases of a single probe module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    Scanning,
    Done,
    Error,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Scanning => "Scanning...",
            ProbeStatus::Done => "Done",
            ProbeStatus::Error => "Error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProbeStatus::Scanning)
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One status transition for one module. Consumed immediately by the
/// reporter, never stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub module: String,
    pub status: ProbeStatus,
}

impl ProgressEvent {
    pub fn new(module: impl Into<String>, status: ProbeStatus) -> Self {
        Self {
            module: module.into(),
            status,
        }
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module, self.status)
    }
}

/// Sink for progress events. Implementations must be thread-safe: probes
/// run concurrently and report from separate tasks.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards all events.
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&self, _event: ProgressEvent) {}
}

/// Prints `<module>: <status>` lines to stdout.
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: ProgressEvent) {
        println!("{event}");
    }
}
