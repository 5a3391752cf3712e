use std::path::PathBuf;
use std::time::{Duration, Instant};

use strum::Display;
use uuid::Uuid;

/// Lifecycle of a single conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

/// One conversion, owned by the request that started it.
#[derive(Debug)]
pub struct ConversionJob {
    pub id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
    pub transform: &'static str,
    status: JobStatus,
    started: Instant,
}

impl ConversionJob {
    pub fn new(input: PathBuf, output: PathBuf, transform: &'static str) -> Self {
        Self {
            id: Uuid::new_v4(),
            input,
            output,
            transform,
            status: JobStatus::Pending,
            started: Instant::now(),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Pending → Done. A finished job keeps its terminal status.
    pub fn complete(&mut self) {
        if self.status == JobStatus::Pending {
            self.status = JobStatus::Done;
        }
    }

    /// Pending → Failed. A finished job keeps its terminal status.
    pub fn fail(&mut self) {
        if self.status == JobStatus::Pending {
            self.status = JobStatus::Failed;
        }
    }
}
