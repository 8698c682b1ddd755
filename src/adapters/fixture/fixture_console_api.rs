//! In-memory [`ConsoleApi`] backed by a fixture file.
//!
//! Serves jobs, execution detail files and the user's SQL roles from a
//! YAML (or JSON) document. Collecting execution details appends a fresh
//! set of generated artifacts to the job's listing, the way the server
//! reports newly gathered files on the next listing request.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CollectExecutionDetailsRequest, ExecutionDetailFile, JobId, JobResponse,
    ListJobProfilerExecutionDetailsResponse, UserSqlRolesResponse,
};
use crate::domain::ports::ConsoleApi;

/// Artifacts produced by one collection request.
const COLLECTED_ARTIFACTS: [&str; 3] = ["distsql", "goroutines", "resumer-trace"];

/// Fixture document layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleFixture {
    #[serde(default)]
    pub jobs: Vec<JobResponse>,
    #[serde(default)]
    pub execution_details: Vec<ExecutionDetailsFixture>,
    #[serde(default)]
    pub user_sql_roles: Vec<String>,
}

/// Files already gathered for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionDetailsFixture {
    pub job_id: JobId,
    #[serde(default)]
    pub files: Vec<FixtureFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureFile {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default)]
struct FixtureState {
    jobs: HashMap<JobId, JobResponse>,
    files: HashMap<JobId, BTreeMap<String, Vec<u8>>>,
    roles: Vec<String>,
}

/// Fixture-backed console API.
#[derive(Debug)]
pub struct FixtureConsoleApi {
    state: RwLock<FixtureState>,
    latency: Duration,
    unavailable: AtomicBool,
    job_fetches: AtomicUsize,
    collect_requests: AtomicUsize,
}

impl FixtureConsoleApi {
    pub fn new(fixture: ConsoleFixture) -> Self {
        let files = fixture
            .execution_details
            .into_iter()
            .map(|details| {
                let files = details
                    .files
                    .into_iter()
                    .map(|file| (file.name, file.content.into_bytes()))
                    .collect();
                (details.job_id, files)
            })
            .collect();

        Self {
            state: RwLock::new(FixtureState {
                jobs: fixture.jobs.into_iter().map(|job| (job.id, job)).collect(),
                files,
                roles: fixture.user_sql_roles,
            }),
            latency: Duration::ZERO,
            unavailable: AtomicBool::new(false),
            job_fetches: AtomicUsize::new(0),
            collect_requests: AtomicUsize::new(0),
        }
    }

    /// Load a fixture document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file {}", path.display()))?;
        let fixture: ConsoleFixture = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture file {}", path.display()))?;
        Ok(Self::new(fixture))
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every call fail as if the server could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn insert_job(&self, job: JobResponse) {
        self.state.write().await.jobs.insert(job.id, job);
    }

    pub async fn set_user_sql_roles(&self, roles: Vec<String>) {
        self.state.write().await.roles = roles;
    }

    /// Number of `get_job` calls served so far.
    pub fn job_fetches(&self) -> usize {
        self.job_fetches.load(Ordering::SeqCst)
    }

    /// Number of accepted collection requests.
    pub fn collect_requests(&self) -> usize {
        self.collect_requests.load(Ordering::SeqCst)
    }

    async fn simulate_call(&self) -> DomainResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::Upstream("service unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ConsoleApi for FixtureConsoleApi {
    async fn get_job(&self, job_id: JobId) -> DomainResult<JobResponse> {
        self.job_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_call().await?;
        self.state
            .read()
            .await
            .jobs
            .get(&job_id)
            .cloned()
            .ok_or(DomainError::JobNotFound(job_id))
    }

    async fn list_execution_detail_files(
        &self,
        job_id: JobId,
    ) -> DomainResult<ListJobProfilerExecutionDetailsResponse> {
        self.simulate_call().await?;
        let state = self.state.read().await;
        if !state.jobs.contains_key(&job_id) {
            return Err(DomainError::JobNotFound(job_id));
        }
        let files = state
            .files
            .get(&job_id)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default();
        Ok(ListJobProfilerExecutionDetailsResponse { files })
    }

    async fn collect_execution_details(
        &self,
        request: &CollectExecutionDetailsRequest,
    ) -> DomainResult<()> {
        self.simulate_call().await?;
        let mut state = self.state.write().await;
        if !state.jobs.contains_key(&request.job_id) {
            return Err(DomainError::JobNotFound(request.job_id));
        }

        let stamp = Utc::now().format("%Y-%m-%dT%H_%M_%S%.6fZ");
        let files = state.files.entry(request.job_id).or_default();
        for artifact in COLLECTED_ARTIFACTS {
            let ext = if artifact == "distsql" { "html" } else { "txt" };
            let name = format!("{artifact}.{stamp}.{ext}");
            let content = format!("{artifact} for job {}\n", request.job_id);
            files.insert(name, content.into_bytes());
        }
        self.collect_requests.fetch_add(1, Ordering::SeqCst);
        debug!(job_id = %request.job_id, "fixture gathered execution details");
        Ok(())
    }

    async fn get_execution_detail_file(
        &self,
        job_id: JobId,
        filename: &str,
    ) -> DomainResult<ExecutionDetailFile> {
        self.simulate_call().await?;
        let state = self.state.read().await;
        let data = state
            .files
            .get(&job_id)
            .and_then(|files| files.get(filename))
            .cloned()
            .ok_or_else(|| DomainError::FileNotFound {
                job_id,
                filename: filename.to_string(),
            })?;
        Ok(ExecutionDetailFile {
            job_id,
            filename: filename.to_string(),
            data,
        })
    }

    async fn get_user_sql_roles(&self) -> DomainResult<UserSqlRolesResponse> {
        self.simulate_call().await?;
        Ok(UserSqlRolesResponse {
            roles: self.state.read().await.roles.clone(),
        })
    }
}
