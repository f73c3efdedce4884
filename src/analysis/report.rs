use std::io::Write;

use crate::error::Result;
use crate::models::SummaryRow;

pub const HEADERS: [&str; 7] = [
    "Job Name", "Count", "Avg (s)", "Min (s)", "Max (s)", "P90 (s)", "P99 (s)",
];

/// Writes the report table. The header is written even when `rows` is empty.
pub fn write_report<W: Write>(rows: &[SummaryRow], sink: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(HEADERS)?;

    for row in rows {
        writer.write_record([
            row.job_name.clone(),
            row.count.to_string(),
            format!("{:.2}", row.avg_seconds),
            row.min_seconds.to_string(),
            row.max_seconds.to_string(),
            row.p90_seconds.to_string(),
            row.p99_seconds.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
