use std::io::Write;

use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::JobRecord;

/// Starts the only task allowed to touch `sink`. It writes the header, then
/// every record in arrival order until all senders are dropped, and finally
/// flushes. Resolves to the number of rows written.
pub fn spawn<W>(sink: W, rx: mpsc::Receiver<JobRecord>) -> JoinHandle<Result<u64>>
where
    W: Write + Send + 'static,
{
    tokio::task::spawn_blocking(move || write_all(sink, rx))
}

fn write_all<W: Write>(sink: W, mut rx: mpsc::Receiver<JobRecord>) -> Result<u64> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);
    writer.write_record(JobRecord::HEADERS)?;

    let mut rows = 0;
    while let Some(record) = rx.blocking_recv() {
        writer.serialize(&record)?;
        rows += 1;
    }

    writer.flush()?;
    debug!("Job table flushed after {rows} rows");
    Ok(rows)
}
