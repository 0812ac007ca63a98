use std::sync::Arc;
use tracing::{info, warn};

use super::state::AnalysisState;
use crate::jobs::{JobBoard, JobMatches};

pub struct JobsStep {
    board: Arc<dyn JobBoard>,
}

impl JobsStep {
    pub fn new(board: Arc<dyn JobBoard>) -> Self {
        Self { board }
    }

    pub async fn run(&self, state: &mut AnalysisState) {
        let matches = match self.board.fetch_jobs().await {
            Ok(jobs) => {
                info!("Fetched {} job listings", jobs.len());
                JobMatches::found(jobs)
            }
            Err(err) => {
                warn!("Fetching jobs failed: {:#}", err);
                JobMatches::failed(format!("{err:#}"))
            }
        };
        state.job_matches = Some(matches);
    }
}
