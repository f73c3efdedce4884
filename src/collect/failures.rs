use std::fmt;

use tokio::sync::mpsc;

use crate::error::Error;

/// What a failed fetch was trying to retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureSource {
    Page(u32),
    Run(u64),
}

impl fmt::Display for FailureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "runs page {page}"),
            Self::Run(id) => write!(f, "jobs for run {id}"),
        }
    }
}

#[derive(Debug)]
pub struct FetchFailure {
    pub source: FailureSource,
    pub cause: Error,
}

impl FetchFailure {
    pub fn new(source: FailureSource, cause: Error) -> Self {
        Self { source, cause }
    }

    pub fn join(failures: &[Self]) -> String {
        failures
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.cause)
    }
}

/// Drains the failure channel. Only completes once every sender is gone.
pub async fn drain(mut rx: mpsc::UnboundedReceiver<FetchFailure>) -> Vec<FetchFailure> {
    let mut failures = Vec::new();
    while let Some(failure) = rx.recv().await {
        failures.push(failure);
    }
    failures
}
