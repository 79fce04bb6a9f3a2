use pool_watcher::config::Config;
use pool_watcher::scrapers::chromium::ChromiumLauncher;
use pool_watcher::services::snapshot_service::SnapshotService;

use anyhow::Context;
use clap::{App, Arg};
use log::{error, info, LevelFilter};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = App::new("PoolWatcher")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Snapshot mining pool observer dashboards into data.json")
        .arg(
            Arg::with_name("debug")
                .long("debug")
                .help("Enable debug logging")
                .takes_value(false),
        )
        .get_matches();

    // Initialize logger
    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if matches.is_present("debug") {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    // 致命错误（包括 panic）只记录日志，进程仍以成功状态退出
    match tokio::spawn(run()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Fatal error: {:#}", e),
        Err(e) => error!("Snapshot run aborted: {}", e),
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::new();
    let launcher = Arc::new(ChromiumLauncher::new(&config));
    let service = SnapshotService::new(config, launcher);

    let written = service
        .run_to_file()
        .await
        .context("snapshot run failed")?;

    info!(
        "Run finished, {} snapshots in {}",
        written,
        service.config().output_path.display()
    );
    Ok(())
}
