use std::sync::Arc;

use tokio::{
    sync::mpsc,
    task::{self, JoinHandle},
};
use tracing::{debug, error};

use crate::{
    aggregate::Summary,
    config::Config,
    error::{CycleError, SourceError},
    exporter::HttpExporter,
    point::Point,
    source::SampleSource,
};

const SAMPLE_CHANNEL_SIZE: usize = 64;

/// Drives measure/aggregate/deliver cycles forever.
///
/// A successful cycle is followed by a sleep of `config.interval`. A failed
/// cycle is logged and retried straight away, with no backoff.
#[derive(Debug)]
pub struct Monitor<F> {
    config: Arc<Config>,
    exporter: HttpExporter,
    new_source: F,
}
impl<F, S> Monitor<F>
where
    F: Fn() -> S,
    S: SampleSource,
{
    /// `new_source` is called once per cycle.
    pub fn new(config: Config, new_source: F) -> Self {
        let exporter =
            HttpExporter::new(config.url.clone(), config.timeout).with_debug(config.debug);
        Self {
            config: Arc::new(config),
            exporter,
            new_source,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self) {
        loop {
            if let Err(e) = self.cycle().await {
                error!("cycle failed: {e}");
                continue;
            }
            debug!(interval = ?self.config.interval, "sleeping");
            tokio::time::sleep(self.config.interval).await;
        }
    }

    /// One full cycle. Returns once the point has been delivered or the
    /// cycle has been abandoned.
    pub async fn cycle(&self) -> Result<(), CycleError> {
        let mut source = (self.new_source)();
        let (mut source, endpoints) = task::spawn_blocking(move || {
            source.init()?;
            let endpoints = source.endpoints()?;
            Ok::<_, SourceError>((source, endpoints))
        })
        .await?
        .map_err(CycleError::Init)?;
        debug!(?endpoints, "measuring");

        let (sink, samples) = mpsc::channel(SAMPLE_CHANNEL_SIZE);
        let measuring = task::spawn_blocking(move || source.measure(&endpoints, sink));
        let worker = tokio::spawn(report(
            Arc::clone(&self.config),
            self.exporter.clone(),
            samples,
            measuring,
        ));
        worker.await?
    }
}

async fn report(
    config: Arc<Config>,
    exporter: HttpExporter,
    mut samples: mpsc::Receiver<f64>,
    measuring: JoinHandle<Result<(), SourceError>>,
) -> Result<(), CycleError> {
    let summary = Summary::collect(&mut samples).await;
    // Partial samples from a failed measurement are discarded.
    measuring.await?.map_err(CycleError::Measure)?;
    let summary = summary?;
    debug!(?summary, "measured");

    let mut point = Point::new(&config);
    summary.write_fields(&mut point.fields);
    task::spawn_blocking(move || exporter.export(&point)).await??;
    Ok(())
}
