mod report;
mod stats;

use std::io::Read;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use log::{debug, info, warn};

pub use report::write_report;

use crate::error::{Error, Result};
use crate::models::SummaryRow;

/// Inclusive window on a job's start time. It only filters when both bounds
/// are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= ts && ts <= end,
            _ => true,
        }
    }
}

/// Result of one analysis pass over the job table.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub rows: Vec<SummaryRow>,
    /// Rows dropped because a required field could not be parsed.
    pub skipped_rows: usize,
    /// Well-formed rows outside the date window.
    pub filtered_rows: usize,
}

struct Columns {
    job_name: usize,
    started_at: usize,
    duration: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        match (find("job_name"), find("started_at"), find("duration_seconds")) {
            (Some(job_name), Some(started_at), Some(duration)) => Ok(Self {
                job_name,
                started_at,
                duration,
            }),
            _ => Err(Error::InvalidTable(
                "expected 'job_name', 'duration_seconds', and 'started_at' columns".to_string(),
            )),
        }
    }
}

enum Row<'a> {
    Kept { job_name: &'a str, duration: i64 },
    Filtered,
    Malformed,
}

fn classify<'a>(record: &'a csv::StringRecord, columns: &Columns, window: &DateWindow) -> Row<'a> {
    let (Some(job_name), Some(started_at), Some(duration)) = (
        record.get(columns.job_name),
        record.get(columns.started_at),
        record.get(columns.duration),
    ) else {
        return Row::Malformed;
    };

    let Ok(started_at) = DateTime::parse_from_rfc3339(started_at.trim()) else {
        return Row::Malformed;
    };
    let Ok(duration) = duration.trim().parse::<i64>() else {
        return Row::Malformed;
    };

    if window.contains(started_at.with_timezone(&Utc)) {
        Row::Kept { job_name, duration }
    } else {
        Row::Filtered
    }
}

/// Streams the job table and summarizes durations per job name.
///
/// Rows with an unparseable start time or duration are skipped and counted
/// rather than failing the pass. Only a missing header column is an error.
/// Summary rows come out in the order each job name was first seen.
pub fn analyze<R: Read>(input: R, window: &DateWindow) -> Result<Analysis> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
    let columns = Columns::locate(reader.headers()?)?;

    let mut groups: IndexMap<String, Vec<i64>> = IndexMap::new();
    let mut skipped_rows = 0;
    let mut filtered_rows = 0;
    let mut record = csv::StringRecord::new();

    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                debug!("Skipping unreadable row: {e}");
                skipped_rows += 1;
                continue;
            }
        }

        match classify(&record, &columns, window) {
            Row::Kept { job_name, duration } => {
                if let Some(durations) = groups.get_mut(job_name) {
                    durations.push(duration);
                } else {
                    groups.insert(job_name.to_string(), vec![duration]);
                }
            }
            Row::Filtered => filtered_rows += 1,
            Row::Malformed => skipped_rows += 1,
        }
    }

    if skipped_rows > 0 {
        warn!("Skipped {skipped_rows} malformed row(s)");
    }
    if filtered_rows > 0 {
        info!("Excluded {filtered_rows} row(s) outside the date window");
    }

    let rows: Vec<SummaryRow> = groups
        .iter_mut()
        .filter_map(|(job_name, durations)| stats::summarize(job_name, durations))
        .collect();

    info!("Summarized {} job(s)", rows.len());

    Ok(Analysis {
        rows,
        skipped_rows,
        filtered_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEADER: &str =
        "run_id,workflow_name,job_name,status,conclusion,started_at,completed_at,duration_seconds";

    fn table(rows: &[(&str, &str, &str)]) -> String {
        let mut text = format!("{HEADER}\n");
        for (job, started_at, duration) in rows {
            text.push_str(&format!(
                "1,CI,{job},completed,success,{started_at},{started_at},{duration}\n"
            ));
        }
        text
    }

    fn report(analysis: &Analysis) -> String {
        let mut out = Vec::new();
        write_report(&analysis.rows, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_end_to_end_report() {
        let input = table(&[
            ("build", "2024-05-01T10:00:00Z", "10"),
            ("build", "2024-05-02T10:00:00Z", "20"),
            ("test", "2024-05-02T11:00:00Z", "5"),
            ("build", "2024-05-03T10:00:00Z", "30"),
        ]);

        let analysis = analyze(input.as_bytes(), &DateWindow::default()).unwrap();
        let text = report(&analysis);

        assert_eq!(
            text,
            "Job Name,Count,Avg (s),Min (s),Max (s),P90 (s),P99 (s)\n\
             build,3,20.00,10,30,20,20\n\
             test,1,5.00,5,5,5,5\n"
        );
        assert_eq!(analysis.skipped_rows, 0);
    }

    #[test]
    fn test_malformed_rows_are_skipped_and_counted() {
        let input = table(&[
            ("build", "2024-05-01T10:00:00Z", "10"),
            ("build", "2024-05-01T11:00:00Z", "ten"),
            ("build", "yesterday", "40"),
            ("build", "2024-05-01T12:00:00Z", "30"),
        ]) + "1,CI,short\n";

        let analysis = analyze(input.as_bytes(), &DateWindow::default()).unwrap();

        assert_eq!(analysis.skipped_rows, 3);
        assert_eq!(analysis.rows.len(), 1);
        assert_eq!(analysis.rows[0].count, 2);
        assert_eq!(analysis.rows[0].max_seconds, 30);
    }

    #[test]
    fn test_window_keeps_inclusive_range() {
        let input = table(&[
            ("build", "2024-04-30T23:59:59Z", "1"),
            ("build", "2024-05-01T00:00:00Z", "2"),
            ("build", "2024-05-02T12:00:00Z", "3"),
            ("build", "2024-05-03T00:00:00Z", "4"),
            ("build", "2024-05-03T00:00:01Z", "5"),
        ]);
        let window = DateWindow::new(Some(day(1)), Some(day(3)));

        let analysis = analyze(input.as_bytes(), &window).unwrap();

        assert_eq!(analysis.filtered_rows, 2);
        assert_eq!(analysis.rows[0].count, 3);
        assert_eq!(analysis.rows[0].min_seconds, 2);
        assert_eq!(analysis.rows[0].max_seconds, 4);
    }

    #[test]
    fn test_half_open_window_does_not_filter() {
        let input = table(&[
            ("build", "2023-01-01T00:00:00Z", "1"),
            ("build", "2030-01-01T00:00:00Z", "2"),
        ]);

        for window in [
            DateWindow::new(Some(day(1)), None),
            DateWindow::new(None, Some(day(1))),
        ] {
            let analysis = analyze(input.as_bytes(), &window).unwrap();

            assert_eq!(analysis.filtered_rows, 0);
            assert_eq!(analysis.rows[0].count, 2);
        }
    }

    #[test]
    fn test_grouping_ignores_row_order() {
        let rows = [
            ("build", "2024-05-01T10:00:00Z", "12"),
            ("lint", "2024-05-01T10:00:00Z", "3"),
            ("build", "2024-05-01T10:00:00Z", "7"),
            ("lint", "2024-05-01T10:00:00Z", "9"),
            ("build", "2024-05-01T10:00:00Z", "40"),
        ];
        let mut reversed = rows;
        reversed.reverse();

        let mut forward = analyze(table(&rows).as_bytes(), &DateWindow::default())
            .unwrap()
            .rows;
        let mut backward = analyze(table(&reversed).as_bytes(), &DateWindow::default())
            .unwrap()
            .rows;
        forward.sort_by(|a, b| a.job_name.cmp(&b.job_name));
        backward.sort_by(|a, b| a.job_name.cmp(&b.job_name));

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_same_job_across_runs_shares_group() {
        let input = format!(
            "{HEADER}\n\
             1,CI,deploy,completed,success,2024-05-01T10:00:00Z,2024-05-01T10:01:00Z,60\n\
             2,Release,deploy,completed,failure,2024-05-01T11:00:00Z,2024-05-01T11:02:00Z,120\n"
        );

        let analysis = analyze(input.as_bytes(), &DateWindow::default()).unwrap();

        assert_eq!(analysis.rows.len(), 1);
        assert_eq!(analysis.rows[0].count, 2);
    }

    #[test]
    fn test_empty_table_yields_no_rows() {
        let input = format!("{HEADER}\n");

        let analysis = analyze(input.as_bytes(), &DateWindow::default()).unwrap();

        assert!(analysis.rows.is_empty());
        assert_eq!(
            report(&analysis),
            "Job Name,Count,Avg (s),Min (s),Max (s),P90 (s),P99 (s)\n"
        );
    }

    #[test]
    fn test_missing_columns_is_rejected() {
        let input = "run_id,job_name\n1,build\n";

        let result = analyze(input.as_bytes(), &DateWindow::default());

        assert!(matches!(result, Err(Error::InvalidTable(_))));
    }

    #[test]
    fn test_window_contains() {
        let window = DateWindow::new(Some(day(2)), Some(day(4)));

        assert!(window.contains(day(2)));
        assert!(window.contains(day(4)));
        assert!(!window.contains(day(1)));
        assert!(!window.contains(day(5)));
        assert!(DateWindow::default().contains(day(1)));
    }
}
