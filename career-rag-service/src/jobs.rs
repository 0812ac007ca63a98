//! Remote job listings.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_JOBS_URL: &str =
    "https://jobicy.com/api/v2/remote-jobs?count=10&geo=canada&industry=dev";
pub const JOBS_TIMEOUT: Duration = Duration::from_secs(20);

/// Listings kept for the report and the email.
pub const MAX_JOBS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(alias = "jobTitle", default)]
    pub title: String,
    #[serde(alias = "companyName", default)]
    pub company: String,
    #[serde(default)]
    pub url: String,
}

impl JobPosting {
    /// `title - company`, with `N/A` for missing fields.
    pub fn headline(&self) -> String {
        format!("{} - {}", or_na(&self.title), or_na(&self.company))
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

/// Job section of the analysis report, serialized as `jobMatches`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMatches {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub jobs: Vec<JobPosting>,
}

impl JobMatches {
    pub fn found(mut jobs: Vec<JobPosting>) -> Self {
        jobs.truncate(MAX_JOBS);
        Self { error: None, jobs }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            jobs: Vec::new(),
        }
    }
}

#[async_trait]
pub trait JobBoard: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>>;
}

/// Jobicy remote-jobs API client.
pub struct JobicyBoard {
    client: reqwest::Client,
    url: String,
}

impl JobicyBoard {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(JOBS_TIMEOUT)
            .build()
            .context("failed to build jobs HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<JobPosting>,
}

#[async_trait]
impl JobBoard for JobicyBoard {
    async fn fetch_jobs(&self) -> Result<Vec<JobPosting>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("failed to call jobs API")?;
        if !response.status().is_success() {
            bail!("jobs API returned {}", response.status());
        }
        let parsed: JobsResponse = response
            .json()
            .await
            .context("failed to parse jobs API response")?;
        Ok(parsed.jobs)
    }
}
