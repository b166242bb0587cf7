use eyre::Result;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    let args = recon::cli::parse();
    recon::init_logging(args.verbose);

    // Fails before any network activity on unusable input
    let host = recon::normalize(&args.target)?;
    println!("Scanning: {host}");

    let probes = recon::create_default_probes(&args.admin_paths);
    let engine = recon::Engine::new(probes).with_concurrency(args.concurrency);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupt received, cancelling scan...");
            let _ = cancel_tx.send(true);
        }
    });

    let reporter = Arc::new(recon::ConsoleReporter);
    let report = engine
        .run_full_scan_with_cancel(&host, reporter, cancel_rx)
        .await;

    println!();
    print!("{}", recon::export::render_report(&host, &report));

    if let Some(path) = &args.output {
        if args.json {
            recon::export::export_json(&report, path)?;
        } else {
            recon::export::export_report(&host, &report, path)?;
        }
        println!("Report written to {}", path.display());
    }

    Ok(())
}
