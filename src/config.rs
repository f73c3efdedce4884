use std::path::{Path, PathBuf};

use crate::analysis::DateWindow;
use crate::auth::Token;
use crate::error::{Error, Result};

pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug)]
pub struct CollectConfig {
    /// Repository as `owner/name`.
    pub repo: String,
    pub api_url: String,
    pub token: Option<Token>,
    pub max_pages: u32,
    pub max_workers: usize,
    pub per_page: u32,
    pub output: PathBuf,
}

impl CollectConfig {
    pub fn validate(&self) -> Result<()> {
        let mut parts = self.repo.split('/');
        let well_formed = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(owner), Some(name), None) if !owner.trim().is_empty() && !name.trim().is_empty()
        );
        if !well_formed {
            return Err(Error::Config(format!(
                "Repository must look like 'owner/name', got '{}'",
                self.repo
            )));
        }

        if self.max_pages == 0 {
            return Err(Error::Config("max pages must be at least 1".to_string()));
        }
        if self.max_workers == 0 {
            return Err(Error::Config("max workers must be at least 1".to_string()));
        }
        if !(1..=MAX_PER_PAGE).contains(&self.per_page) {
            return Err(Error::Config(format!(
                "per page must be between 1 and {MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }

        Ok(())
    }
}

#[derive(Debug)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub window: DateWindow,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.window.start, self.window.end) {
            if start > end {
                return Err(Error::Config(format!(
                    "Analysis start date {start} is after end date {end}"
                )));
            }
        }
        Ok(())
    }
}

/// Relative paths live under `data_dir`; absolute paths are used as given.
pub fn resolve(data_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}
