use chrono::Local;
use eyre::{Result, WrapErr};
use std::fs;
use std::path::Path;

use crate::report::{ScanReport, Value};

const TITLE: &str = "Automated Reconnaissance Report";
const SEPARATOR_WIDTH: usize = 60;

/// Render the report as plain text: a title block, then one section per
/// entry with mapping values pretty-printed and scalars printed as-is.
pub fn render_report(target: &str, report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str(TITLE);
    out.push('\n');
    out.push_str(&"=".repeat(SEPARATOR_WIDTH));
    out.push('\n');
    out.push_str(&format!("Target: {target}\n"));
    out.push_str(&format!(
        "Generated: {}\n\n",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    ));

    for (name, value) in report.iter() {
        out.push_str(name);
        out.push('\n');
        out.push_str(&"-".repeat(name.len()));
        out.push('\n');
        match value {
            Value::Str(s) => out.push_str(s),
            other => out.push_str(&other.render()),
        }
        out.push_str("\n\n");
    }

    out
}

/// Write the text rendering to `destination`. Failure is surfaced as a
/// distinct error and leaves the in-memory report untouched.
pub fn export_report(target: &str, report: &ScanReport, destination: &Path) -> Result<()> {
    let rendered = render_report(target, report);
    fs::write(destination, rendered)
        .wrap_err_with(|| format!("failed to write report to {}", destination.display()))?;
    log::info!("[export] report_written: path={}", destination.display());
    Ok(())
}

/// Write the report as pretty-printed JSON, preserving entry order.
pub fn export_json(report: &ScanReport, destination: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).wrap_err("failed to serialize report")?;
    fs::write(destination, json)
        .wrap_err_with(|| format!("failed to write report to {}", destination.display()))?;
    log::info!("[export] json_written: path={}", destination.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::IP_ADDRESS_KEY;

    fn sample_report() -> ScanReport {
        let mut report = ScanReport::new();
        report.insert(IP_ADDRESS_KEY, Value::str("93.184.216.34"));
        let mut dns = Value::map();
        dns.insert("A", Value::list(["93.184.216.34"]));
        report.insert("DNS Records", dns);
        report.insert("WHOIS", Value::error("RDAP service not available"));
        report
    }

    #[test]
    fn test_render_contains_title_target_and_sections() {
        let rendered = render_report("example.com", &sample_report());
        assert!(rendered.contains("Automated Reconnaissance Report"));
        assert!(rendered.contains("Target: example.com"));
        assert!(rendered.contains("DNS Records\n-----------"));
        assert!(rendered.contains("93.184.216.34"));
        assert!(rendered.contains("RDAP service not available"));
    }

    #[test]
    fn test_scalar_entries_printed_as_is() {
        let rendered = render_report("example.com", &sample_report());
        assert!(rendered.contains("IP Address\n----------\n93.184.216.34"));
    }

    #[test]
    fn test_export_writes_file() {
        let path = std::env::temp_dir().join("recon-export-test.txt");
        export_report("example.com", &sample_report(), &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("Target: example.com"));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_export_json_round_trips() {
        let path = std::env::temp_dir().join("recon-export-test.json");
        export_json(&sample_report(), &path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed[IP_ADDRESS_KEY], "93.184.216.34");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_export_failure_is_an_error() {
        let report = sample_report();
        let result = export_report(
            "example.com",
            &report,
            Path::new("/nonexistent-dir/report.txt"),
        );
        assert!(result.is_err());
        // the report itself is untouched
        assert_eq!(report.len(), 3);
    }
}
