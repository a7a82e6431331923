use chartscan::cli::CliArgs;
use chartscan::util::{init_logging, LoggingConfig};
use chartscan::{
    CacheDir, ChartScanner, DockerExecutor, HelmRenderer, ScanConfig, ScanError, ScanSummary,
    NAME, VERSION,
};

use anyhow::Context;
use clap::Parser;
use std::process;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::resolve(args.log_level.as_deref(), args.debug));

    debug!("{} v{} starting", NAME, VERSION);

    let exit_code = handle_scan(&args).await;
    process::exit(exit_code);
}

async fn handle_scan(args: &CliArgs) -> i32 {
    let config = args.scan_config(ScanConfig::default());
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return 1;
    }

    match run(args, config).await {
        Ok(summary) => {
            debug!(
                "Scanned {} images of chart {}",
                summary.images.len(),
                summary.chart
            );
            0
        }
        Err(e) => {
            error!("{:#}", e);
            print_guidance(&e);
            1
        }
    }
}

/// Runs the whole pipeline; the cache directory is released before returning
async fn run(args: &CliArgs, config: ScanConfig) -> anyhow::Result<ScanSummary> {
    let executor = DockerExecutor::connect()
        .await
        .map_err(ScanError::ExecutorUnavailable)?;
    let renderer = HelmRenderer::new(config.render_tool.clone());
    let scanner = ChartScanner::new(Arc::new(renderer), Arc::new(executor), config);

    scanner.prepare().await?;

    let cache = CacheDir::acquire(scanner.config().cache_dir.as_deref())?;
    let _watcher = cache.watch_signals().unwrap_or_else(|e| {
        warn!("Signal watcher unavailable: {}", e);
        None
    });
    debug!(
        "Using {} as cache directory for vuln db",
        cache.path().display()
    );
    debug!(
        "Using {} as user for vulnerability scanning",
        scanner.config().scan_user
    );

    let chart = args.chart_reference();
    let mut stdout = std::io::stdout();
    let summary = scanner
        .scan_chart(&chart, cache.path(), &mut stdout)
        .await
        .with_context(|| format!("Scan of chart {} failed", chart.chart))?;

    Ok(summary)
}

fn print_guidance(err: &anyhow::Error) {
    match err.downcast_ref::<ScanError>() {
        Some(ScanError::Render { .. }) => {
            eprintln!("\nDid you run 'helm repo update'?");
        }
        Some(ScanError::ExecutorUnavailable(_)) => {
            eprintln!("\nPossible solutions:");
            eprintln!("  - Ensure the Docker daemon is running");
            eprintln!("  - Check the DOCKER_HOST environment variable");
        }
        Some(ScanError::ImagePull { .. }) => {
            eprintln!("\nUse --no-pull to scan with the locally available scanner image.");
        }
        _ => {}
    }
}
