use clap::Parser;
use std::path::PathBuf;

use crate::engine::DEFAULT_CONCURRENCY;

#[derive(Parser)]
#[command(name = "recon")]
#[command(about = "An OSINT reconnaissance engine")]
pub struct Cli {
    /// Target domain or URL to scan
    pub target: String,

    /// Write the report to this path after the scan
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export the report as JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Wordlist of candidate admin panel paths
    #[arg(long, default_value = "assets/common_admin_paths.txt")]
    pub admin_paths: PathBuf,

    /// Maximum number of probe modules running at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["recon", "example.com"]);
        assert_eq!(cli.target, "example.com");
        assert_eq!(cli.concurrency, DEFAULT_CONCURRENCY);
        assert!(!cli.json);
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_output_and_json_flags() {
        let cli = Cli::parse_from(["recon", "example.com", "-o", "report.json", "--json"]);
        assert_eq!(cli.output, Some(PathBuf::from("report.json")));
        assert!(cli.json);
    }
}
