use crate::models::SummaryRow;

/// Nearest-rank percentile over an ascending slice: the element at
/// `floor((len - 1) * p)`. Returns `None` for an empty slice.
pub fn percentile(sorted: &[i64], p: f64) -> Option<i64> {
    if sorted.is_empty() {
        return None;
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let index = ((sorted.len() - 1) as f64 * p.clamp(0.0, 1.0)).floor() as usize;
    sorted.get(index).copied()
}

/// Summarizes one group. `durations` is sorted in place; `None` when empty.
pub fn summarize(job_name: &str, durations: &mut [i64]) -> Option<SummaryRow> {
    durations.sort_unstable();

    let min_seconds = *durations.first()?;
    let max_seconds = *durations.last()?;
    let count = durations.len();

    // Summed in i128 so durations near i64::MAX cannot overflow
    #[allow(clippy::cast_precision_loss)]
    let avg_seconds =
        durations.iter().map(|&d| i128::from(d)).sum::<i128>() as f64 / count as f64;

    Some(SummaryRow {
        job_name: job_name.to_string(),
        count,
        avg_seconds,
        min_seconds,
        max_seconds,
        p90_seconds: percentile(durations, 0.90)?,
        p99_seconds: percentile(durations, 0.99)?,
    })
}
