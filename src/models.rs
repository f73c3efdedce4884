use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// A top-level workflow run returned by the paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: String,
}

/// A job belonging to a [`WorkflowRun`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub status: String,
    pub conclusion: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl Job {
    /// Seconds between start and completion. Negative when the source reports
    /// a completion before the start.
    pub fn duration_seconds(&self) -> i64 {
        (self.completed_at - self.started_at).num_seconds()
    }
}

/// One row of the persisted job table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub run_id: u64,
    pub workflow_name: String,
    pub job_name: String,
    pub status: String,
    pub conclusion: String,
    #[serde(serialize_with = "rfc3339")]
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "rfc3339")]
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: i64,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn rfc3339<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}

impl JobRecord {
    pub const HEADERS: [&'static str; 8] = [
        "run_id",
        "workflow_name",
        "job_name",
        "status",
        "conclusion",
        "started_at",
        "completed_at",
        "duration_seconds",
    ];

    pub fn new(run: &WorkflowRun, job: Job) -> Self {
        let duration_seconds = job.duration_seconds();

        Self {
            run_id: run.id,
            workflow_name: run.name.clone(),
            job_name: job.name,
            status: job.status,
            conclusion: job.conclusion,
            started_at: job.started_at,
            completed_at: job.completed_at,
            duration_seconds,
        }
    }
}

/// Latency summary for every execution of one job name.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub job_name: String,
    pub count: usize,
    pub avg_seconds: f64,
    pub min_seconds: i64,
    pub max_seconds: i64,
    pub p90_seconds: i64,
    pub p99_seconds: i64,
}
