pub mod cli;
pub mod engine;
pub mod export;
pub mod logging;
pub mod probe;
pub mod progress;
pub mod report;
pub mod scan;
pub mod target;

// Re-export key types and functions at the crate root
pub use engine::{Engine, ResolveIp, SystemResolver};
pub use logging::init_logging;
pub use probe::{Probe, ProbeContext};
pub use progress::{ConsoleReporter, NullReporter, ProbeStatus, ProgressEvent, ProgressReporter};
pub use report::{ScanReport, Value};
pub use scan::create_default_probes;
pub use target::normalize;
