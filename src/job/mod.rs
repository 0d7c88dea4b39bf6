//! Batch crunch job controller
//!
//! A resumable state machine driven by repeated [`JobController::step`] calls
//! from the host's tick loop:
//!
//! ```text
//! Idle --start--> Running --step--> Completed
//!                    |                  |
//!                 cancel            take_finished --> Idle
//!                    v                  ^
//!                Cancelled -------------+
//! ```
//!
//! Each step crunches up to `processing_speed` assets and then returns, so the
//! host stays responsive. An asset is never split across steps.

mod progress;

pub use progress::{AssetFailure, Progress};

use crate::config::{ConfigError, JobConfig};
use crate::host::{AssetHandle, TextureHost};
use crate::textures::crunch_texture;
use tracing::{debug, info, warn};

/// Lifecycle state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Result of one `step` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// No job
    Idle,
    /// Work remains; call `step` again on the next tick
    Continue,
    /// All assets have been handled
    Completed,
    /// The job was cancelled
    Cancelled,
}

/// Why a job could not start
#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("A crunch job is already running")]
    AlreadyRunning,

    #[error("Failed to query textures: {0:#}")]
    Query(anyhow::Error),
}

/// Final state of a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub status: JobStatus,
    pub progress: Progress,
    pub failures: Vec<AssetFailure>,
}

/// State of one job, from `start` until its terminal state is consumed
#[derive(Debug)]
struct JobState {
    config: JobConfig,
    pending: Vec<AssetHandle>,
    cursor: usize,
    processed: usize,
    cancel_requested: bool,
    failures: Vec<AssetFailure>,
}

impl JobState {
    fn progress(&self) -> Progress {
        Progress::new(self.processed, self.pending.len())
    }
}

/// Drives a crunch job across many ticks
#[derive(Debug, Default)]
pub struct JobController {
    status: JobStatus,
    job: Option<JobState>,
}

impl JobController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    /// Start a job over every asset in scope whose compression differs from the target.
    ///
    /// Rejects the request while a job is running; the running job is left alone.
    /// A finished job that was not yet consumed is replaced. With nothing to
    /// crunch the job is Completed immediately.
    pub fn start<H>(&mut self, host: &H, config: &JobConfig) -> Result<Progress, StartError>
    where
        H: TextureHost + ?Sized,
    {
        if self.is_running() {
            return Err(StartError::AlreadyRunning);
        }
        config.validate()?;

        let target = config.target_compression();
        let candidates = host.query_textures(config.scope).map_err(StartError::Query)?;
        let found = candidates.len();

        let pending: Vec<AssetHandle> = candidates
            .into_iter()
            .filter(|asset| match host.compression_state(asset) {
                Ok(state) => state != target,
                Err(e) => {
                    // Keep it so the failure is reported when the asset is processed
                    debug!("Could not read compression state of {}: {:#}", asset, e);
                    true
                }
            })
            .collect();

        info!(
            "Crunch job: {} of {} textures eligible (quality {}, max size {}, {} per tick)",
            pending.len(),
            found,
            config.compression_quality,
            config.max_size,
            config.processing_speed
        );

        self.status = if pending.is_empty() {
            JobStatus::Completed
        } else {
            JobStatus::Running
        };

        let job = JobState {
            config: config.clone(),
            pending,
            cursor: 0,
            processed: 0,
            cancel_requested: false,
            failures: Vec::new(),
        };
        let progress = job.progress();
        self.job = Some(job);

        Ok(progress)
    }

    /// Do one tick of work.
    ///
    /// Crunches up to `processing_speed` assets. A failed asset is logged,
    /// recorded and counted as processed; the batch carries on.
    pub fn step<H>(&mut self, host: &mut H) -> StepResult
    where
        H: TextureHost + ?Sized,
    {
        match self.status {
            JobStatus::Idle => return StepResult::Idle,
            JobStatus::Completed => return StepResult::Completed,
            JobStatus::Cancelled => return StepResult::Cancelled,
            JobStatus::Running => {}
        }

        let Some(job) = self.job.as_mut() else {
            self.status = JobStatus::Idle;
            return StepResult::Idle;
        };

        if job.cancel_requested {
            info!("Crunch job cancelled at {}", job.progress());
            self.status = JobStatus::Cancelled;
            return StepResult::Cancelled;
        }

        let budget = job.config.processing_speed.max(1) as usize;
        for _ in 0..budget {
            let Some(asset) = job.pending.get(job.cursor).cloned() else {
                break;
            };
            job.cursor += 1;

            match crunch_texture(host, &asset, &job.config) {
                Ok(outcome) => match outcome.padded {
                    Some(size) => debug!("Crunched {} (padded {} -> {})", asset, outcome.original, size),
                    None => debug!("Crunched {}", asset),
                },
                Err(e) => {
                    warn!("Skipping {}: {:#}", asset, e);
                    job.failures.push(AssetFailure {
                        asset,
                        error: format!("{:#}", e),
                    });
                }
            }
            job.processed += 1;
        }

        if job.progress().is_done() {
            info!(
                "Crunch job complete: {} textures, {} failed",
                job.processed,
                job.failures.len()
            );
            self.status = JobStatus::Completed;
            StepResult::Completed
        } else {
            StepResult::Continue
        }
    }

    /// Request cancellation; takes effect on the next `step`.
    /// Returns false when no job is running.
    pub fn cancel(&mut self) -> bool {
        match (self.status, self.job.as_mut()) {
            (JobStatus::Running, Some(job)) => {
                job.cancel_requested = true;
                true
            }
            _ => false,
        }
    }

    /// Current progress; zero when idle
    pub fn progress(&self) -> Progress {
        self.job.as_ref().map(JobState::progress).unwrap_or_default()
    }

    /// Assets that failed so far
    pub fn failures(&self) -> &[AssetFailure] {
        self.job.as_ref().map(|job| job.failures.as_slice()).unwrap_or(&[])
    }

    /// Consume a Completed or Cancelled job and return to Idle
    pub fn take_finished(&mut self) -> Option<JobReport> {
        if !matches!(self.status, JobStatus::Completed | JobStatus::Cancelled) {
            return None;
        }

        let status = std::mem::take(&mut self.status);
        let job = self.job.take()?;
        Some(JobReport {
            status,
            progress: job.progress(),
            failures: job.failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetScope;
    use crate::host::{HostOp, ImportSettings, MemoryHost};
    use crate::textures::Dimensions;

    fn host_with(count: usize) -> MemoryHost {
        let mut host = MemoryHost::new();
        for i in 0..count {
            host.insert_filled(&format!("Assets/tex_{:02}.png", i), 10, 7, ImportSettings::default());
        }
        host
    }

    fn config(speed: u32) -> JobConfig {
        JobConfig {
            processing_speed: speed,
            ..JobConfig::default()
        }
    }

    #[test]
    fn test_completes_after_rate_limited_steps() {
        let mut host = host_with(7);
        let mut controller = JobController::new();

        let progress = controller.start(&host, &config(3)).unwrap();
        assert_eq!(progress, Progress::new(0, 7));
        assert_eq!(controller.status(), JobStatus::Running);

        assert_eq!(controller.step(&mut host), StepResult::Continue);
        assert_eq!(controller.progress(), Progress::new(3, 7));
        assert_eq!(controller.step(&mut host), StepResult::Continue);
        assert_eq!(controller.progress(), Progress::new(6, 7));
        assert_eq!(controller.step(&mut host), StepResult::Completed);
        assert_eq!(controller.progress(), Progress::new(7, 7));

        // further steps do no work
        assert_eq!(controller.step(&mut host), StepResult::Completed);

        for handle in host.query_textures(AssetScope::All).unwrap() {
            let texture = host.texture(&handle).unwrap();
            assert_eq!(texture.pixels.dimensions(), Dimensions::new(12, 8));
            assert_eq!(texture.persist_count, 1);
        }
    }

    #[test]
    fn test_exact_multiple_completes_on_last_batch() {
        let mut host = host_with(4);
        let mut controller = JobController::new();
        controller.start(&host, &config(2)).unwrap();

        assert_eq!(controller.step(&mut host), StepResult::Continue);
        assert_eq!(controller.step(&mut host), StepResult::Completed);
        assert_eq!(controller.progress(), Progress::new(4, 4));
    }

    #[test]
    fn test_empty_snapshot_completes_immediately() {
        let mut host = MemoryHost::new();
        let mut controller = JobController::new();

        let progress = controller.start(&host, &JobConfig::default()).unwrap();
        assert_eq!(progress, Progress::new(0, 0));
        assert_eq!(controller.status(), JobStatus::Completed);
        assert_eq!(controller.step(&mut host), StepResult::Completed);
    }

    #[test]
    fn test_already_crunched_assets_are_skipped() {
        let mut host = host_with(2);
        let config = JobConfig::default();
        host.insert_filled("Assets/done.png", 4, 4, config.target_import_settings());

        let mut controller = JobController::new();
        assert_eq!(controller.start(&host, &config).unwrap().total, 2);

        // same quality but not crunched is still eligible
        let mut host = MemoryHost::new();
        host.insert_filled(
            "Assets/uncrunched.png",
            4,
            4,
            ImportSettings {
                quality: config.compression_quality,
                crunched: false,
                ..ImportSettings::default()
            },
        );
        let mut controller = JobController::new();
        assert_eq!(controller.start(&host, &config).unwrap().total, 1);
    }

    #[test]
    fn test_cancel_freezes_progress() {
        let mut host = host_with(10);
        let mut controller = JobController::new();
        controller.start(&host, &config(3)).unwrap();

        assert_eq!(controller.step(&mut host), StepResult::Continue);
        assert!(controller.cancel());
        assert_eq!(controller.step(&mut host), StepResult::Cancelled);
        assert_eq!(controller.step(&mut host), StepResult::Cancelled);
        assert_eq!(controller.progress(), Progress::new(3, 10));

        let untouched = host
            .query_textures(AssetScope::All)
            .unwrap()
            .into_iter()
            .filter(|h| host.texture(h).unwrap().persist_count == 0)
            .count();
        assert_eq!(untouched, 7);

        let report = controller.take_finished().unwrap();
        assert_eq!(report.status, JobStatus::Cancelled);
        assert_eq!(report.progress, Progress::new(3, 10));
        assert_eq!(controller.status(), JobStatus::Idle);
        assert_eq!(controller.step(&mut host), StepResult::Idle);
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let mut controller = JobController::new();
        assert!(!controller.cancel());
        assert_eq!(controller.status(), JobStatus::Idle);
    }

    #[test]
    fn test_duplicate_start_rejected() {
        let mut host = host_with(5);
        let mut controller = JobController::new();
        controller.start(&host, &config(2)).unwrap();
        controller.step(&mut host);

        let err = controller.start(&host, &config(1)).unwrap_err();
        assert!(matches!(err, StartError::AlreadyRunning));
        assert_eq!(controller.progress(), Progress::new(2, 5));
        assert!(controller.is_running());
    }

    #[test]
    fn test_invalid_config_does_not_start() {
        let host = host_with(1);
        let mut controller = JobController::new();

        let err = controller.start(&host, &config(0)).unwrap_err();
        assert!(matches!(
            err,
            StartError::InvalidConfiguration(ConfigError::SpeedOutOfRange(0))
        ));
        assert_eq!(controller.status(), JobStatus::Idle);
    }

    #[test]
    fn test_failed_asset_is_skipped_and_counted() {
        let mut host = host_with(3);
        let broken = AssetHandle::new("Assets/tex_01.png");
        host.fail_on(&broken, HostOp::Persist);

        let mut controller = JobController::new();
        controller.start(&host, &config(10)).unwrap();
        assert_eq!(controller.step(&mut host), StepResult::Completed);
        assert_eq!(controller.progress(), Progress::new(3, 3));

        let failures = controller.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].asset, broken);
        assert!(failures[0].error.contains("Failed to save"));

        assert_eq!(host.texture(&AssetHandle::new("Assets/tex_02.png")).unwrap().persist_count, 1);
    }

    #[test]
    fn test_asset_failing_to_save_is_picked_up_again() {
        let mut host = host_with(2);
        let broken = AssetHandle::new("Assets/tex_00.png");
        host.fail_on(&broken, HostOp::Persist);

        let mut controller = JobController::new();
        controller.start(&host, &config(5)).unwrap();
        assert_eq!(controller.step(&mut host), StepResult::Completed);
        let report = controller.take_finished().unwrap();
        assert_eq!(report.failures.len(), 1);

        let texture = host.texture(&broken).unwrap();
        assert_eq!(texture.persist_count, 0);
        assert_eq!(texture.settings, ImportSettings::default());
        assert_eq!(texture.pixels.dimensions(), Dimensions::new(10, 7));

        // only the asset that never reached storage is left to do
        let progress = controller.start(&host, &config(5)).unwrap();
        assert_eq!(progress, Progress::new(0, 1));
    }

    #[test]
    fn test_unreadable_state_still_processed() {
        let mut host = host_with(1);
        let handle = AssetHandle::new("Assets/tex_00.png");
        host.fail_on(&handle, HostOp::CompressionState);

        let mut controller = JobController::new();
        assert_eq!(controller.start(&host, &config(1)).unwrap().total, 1);
        assert_eq!(controller.step(&mut host), StepResult::Completed);
        assert!(controller.failures().is_empty());
    }

    #[test]
    fn test_finished_job_can_be_replaced() {
        let mut host = host_with(1);
        let mut controller = JobController::new();
        controller.start(&host, &config(1)).unwrap();
        assert_eq!(controller.step(&mut host), StepResult::Completed);

        // everything is crunched now, so a new job has nothing to do
        let progress = controller.start(&host, &config(1)).unwrap();
        assert_eq!(progress.total, 0);
        assert_eq!(controller.status(), JobStatus::Completed);
        assert!(controller.take_finished().is_some());
        assert!(controller.take_finished().is_none());
    }
}
