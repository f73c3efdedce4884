use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use super::types::{JobDto, JobsResponse, WorkflowRunsResponse};
use crate::auth::Token;
use crate::error::{Error, Result};
use crate::models::{Job, WorkflowRun};
use crate::providers::RunSource;

const JOBS_PER_PAGE: u32 = 100;

pub struct GitHubClient {
    client: Client,
    repo_url: Url,
    per_page: u32,
    token: Option<Token>,
}

impl GitHubClient {
    pub fn new(api_url: &str, repo: &str, per_page: u32, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("ci-job-stats/0.1.0")
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        // Url::join replaces the last path segment unless it ends with '/'
        let mut base = api_url.to_owned();
        if !base.ends_with('/') {
            base.push('/');
        }

        let repo_url = Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid API URL: {e}")))?
            .join(&format!("repos/{}/", repo.trim_matches('/')))
            .map_err(|e| Error::Config(format!("Invalid repository URL: {e}")))?;

        Ok(Self {
            client,
            repo_url,
            per_page,
            token,
        })
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(token) = &self.token {
            request.bearer_auth(token.as_str())
        } else {
            request
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.repo_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid endpoint URL: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, u32)]) -> Result<T> {
        debug!("Fetching {url}");

        let request = self.auth_request(self.client.get(url).query(query));
        let response = Self::check_status(request.send().await?).await?;
        let body = response.bytes().await?;

        Ok(serde_json::from_slice(&body)?)
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        Err(Error::Api(format!("GET {url} returned {status} - {body}")))
    }
}

#[async_trait]
impl RunSource for GitHubClient {
    async fn list_runs(&self, page: u32) -> Result<Vec<WorkflowRun>> {
        let url = self.endpoint("actions/runs")?;
        let response: WorkflowRunsResponse = self
            .get_json(url, &[("per_page", self.per_page), ("page", page)])
            .await?;

        Ok(response
            .workflow_runs
            .into_iter()
            .map(WorkflowRun::from)
            .collect())
    }

    /// Pages through the run's jobs until `total_count` jobs have been seen or
    /// a page comes back empty.
    async fn list_jobs(&self, run: &WorkflowRun) -> Result<Vec<Job>> {
        let url = self.endpoint(&format!("actions/runs/{}/jobs", run.id))?;
        let mut dtos = Vec::new();
        let mut page = 1;

        loop {
            let response: JobsResponse = self
                .get_json(url.clone(), &[("per_page", JOBS_PER_PAGE), ("page", page)])
                .await?;

            let fetched = response.jobs.len();
            dtos.extend(response.jobs);

            if fetched == 0 || dtos.len() as u64 >= response.total_count {
                break;
            }
            page += 1;
        }

        let total = dtos.len();
        let jobs: Vec<Job> = dtos.into_iter().filter_map(JobDto::into_job).collect();

        if jobs.len() < total {
            debug!(
                "Run {}: skipped {} unfinished job(s)",
                run.id,
                total - jobs.len()
            );
        }

        Ok(jobs)
    }
}
