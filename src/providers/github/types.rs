use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{Job, WorkflowRun};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowRunsResponse {
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRunDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowRunDto {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobsResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub jobs: Vec<JobDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct JobDto {
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<WorkflowRunDto> for WorkflowRun {
    fn from(dto: WorkflowRunDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name.unwrap_or_default(),
        }
    }
}

impl JobDto {
    /// Queued and in-progress jobs have no completion time and are dropped.
    pub fn into_job(self) -> Option<Job> {
        Some(Job {
            started_at: self.started_at?,
            completed_at: self.completed_at?,
            name: self.name,
            status: self.status,
            conclusion: self.conclusion.unwrap_or_default(),
        })
    }
}
