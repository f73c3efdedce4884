pub mod github;

use crate::error::Result;
use crate::models::{Job, WorkflowRun};
use async_trait::async_trait;

/// A paginated source of workflow runs and their jobs.
#[async_trait]
pub trait RunSource: Send + Sync {
    /// Lists page `page` (1-based) of workflow runs. An empty page means there
    /// is no more data.
    async fn list_runs(&self, page: u32) -> Result<Vec<WorkflowRun>>;

    async fn list_jobs(&self, run: &WorkflowRun) -> Result<Vec<Job>>;
}
