mod failures;
mod writer;

use std::io::Write;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

pub use failures::{FailureSource, FetchFailure};

use crate::error::{Error, Result};
use crate::models::{JobRecord, WorkflowRun};
use crate::providers::RunSource;

const RECORD_BUFFER: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectStats {
    pub pages: u32,
    pub runs: usize,
    pub rows: u64,
}

/// Fans job fetches out over at most `max_workers` concurrent tasks and funnels
/// the resulting records into a single table writer.
pub struct Collector<S: ?Sized> {
    source: Arc<S>,
    max_pages: u32,
    max_workers: usize,
}

impl<S> Collector<S>
where
    S: RunSource + ?Sized + 'static,
{
    pub fn new(source: Arc<S>, max_pages: u32, max_workers: usize) -> Self {
        Self {
            source,
            max_pages,
            max_workers: max_workers.max(1),
        }
    }

    /// Collects every page into `sink`.
    ///
    /// A failed page or run is recorded and skipped; the remaining work still
    /// runs and the failures come back together as [`Error::Collection`]. A
    /// sink failure stops dispatching and is returned as is.
    pub async fn collect<W>(&self, sink: W) -> Result<CollectStats>
    where
        W: Write + Send + 'static,
    {
        let (records_tx, records_rx) = mpsc::channel(RECORD_BUFFER);
        let (failures_tx, failures_rx) = mpsc::unbounded_channel();
        let writer = writer::spawn(sink, records_rx);

        let permits = Arc::new(Semaphore::new(self.max_workers));
        let mut workers = JoinSet::new();
        let mut stats = CollectStats::default();

        for page in 1..=self.max_pages {
            if records_tx.is_closed() {
                warn!("Job table writer stopped, not dispatching page {page}");
                break;
            }

            let runs = match self.source.list_runs(page).await {
                Ok(runs) => runs,
                Err(e) => {
                    warn!("Failed to fetch runs page {page}: {e}");
                    failures_tx
                        .send(FetchFailure::new(FailureSource::Page(page), e))
                        .ok();
                    continue;
                }
            };

            if runs.is_empty() {
                info!("No more runs returned by API, stopping");
                break;
            }

            stats.pages += 1;
            stats.runs += runs.len();
            info!("Page {page}: dispatching {} runs", runs.len());

            for run in runs {
                // Released when the worker finishes, not when it is spawned
                let permit = Arc::clone(&permits)
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Task(format!("Worker pool closed: {e}")))?;

                if records_tx.is_closed() {
                    warn!("Job table writer stopped, not dispatching run {}", run.id);
                    break;
                }

                let source = Arc::clone(&self.source);
                let records_tx = records_tx.clone();
                let failures_tx = failures_tx.clone();

                workers.spawn(async move {
                    let _permit = permit;
                    fetch_run(source.as_ref(), run, &records_tx, &failures_tx).await;
                });

                while let Some(joined) = workers.try_join_next() {
                    joined.map_err(|e| Error::Task(format!("Job fetch worker failed: {e}")))?;
                }
            }
        }

        // Workers hold the remaining clones; the channels close when the last one finishes
        drop(records_tx);
        drop(failures_tx);

        while let Some(joined) = workers.join_next().await {
            joined.map_err(|e| Error::Task(format!("Job fetch worker failed: {e}")))?;
        }

        stats.rows = writer
            .await
            .map_err(|e| Error::Task(format!("Job table writer failed: {e}")))??;

        let failures = failures::drain(failures_rx).await;
        info!(
            "Collected {} rows from {} runs across {} pages",
            stats.rows, stats.runs, stats.pages
        );

        if failures.is_empty() {
            Ok(stats)
        } else {
            Err(Error::Collection(failures))
        }
    }
}

async fn fetch_run<S>(
    source: &S,
    run: WorkflowRun,
    records_tx: &mpsc::Sender<JobRecord>,
    failures_tx: &mpsc::UnboundedSender<FetchFailure>,
) where
    S: RunSource + ?Sized,
{
    let jobs = match source.list_jobs(&run).await {
        Ok(jobs) => jobs,
        Err(e) => {
            warn!("Failed to fetch jobs for run {}: {e}", run.id);
            failures_tx
                .send(FetchFailure::new(FailureSource::Run(run.id), e))
                .ok();
            return;
        }
    };

    for job in jobs {
        if records_tx.send(JobRecord::new(&run, job)).await.is_err() {
            debug!("Writer gone, dropping remaining jobs for run {}", run.id);
            return;
        }
    }
}
