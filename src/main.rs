use anyhow::Context;
use bwmon::{
    config::{Args, APP_NAME, VERSION},
    source::DownloadSource,
    Monitor,
};
use clap::Parser;
use tracing::{debug, info, level_filters::LevelFilter};

fn init_tracing(debug: bool) {
    let level = if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);
    debug!("{APP_NAME} {VERSION}");

    let hostname = sysinfo::System::host_name().context("unable to determine local hostname")?;
    let config = args.into_config(hostname);
    info!(
        url = %config.url,
        interval = ?config.interval,
        measurement = %config.measurement,
        "starting"
    );

    let source = config.source.clone();
    let monitor = Monitor::new(config, move || DownloadSource::new(source.clone()));
    monitor.run().await;
    Ok(())
}
