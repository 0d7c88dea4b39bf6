//! Tick-driven crunch session
//!
//! Owns a host, a job controller and a status notifier, and advances both
//! from a single `tick()` call. When a job finishes or is cancelled the
//! session posts the matching status message and keeps the final report.

use crate::config::JobConfig;
use crate::host::TextureHost;
use crate::job::{JobController, JobReport, JobStatus, Progress, StartError, StepResult};
use crate::notifier::StatusNotifier;
use tracing::debug;

/// How long the completion message stays up
pub const COMPLETE_MESSAGE_SECS: f32 = 6.0;

/// How long the cancellation message stays up
pub const CANCEL_MESSAGE_SECS: f32 = 4.0;

/// A host plus the job and message state that run against it
pub struct CrunchSession<H: TextureHost> {
    host: H,
    config: JobConfig,
    controller: JobController,
    notifier: StatusNotifier,
    last_report: Option<JobReport>,
}

impl<H: TextureHost> CrunchSession<H> {
    pub fn new(host: H, config: JobConfig) -> Self {
        Self {
            host,
            config,
            controller: JobController::new(),
            notifier: StatusNotifier::new(),
            last_report: None,
        }
    }

    /// Start a job with the current config, clearing any old message and report
    pub fn begin(&mut self) -> Result<Progress, StartError> {
        let progress = self.controller.start(&self.host, &self.config)?;
        self.notifier.clear();
        self.last_report = None;
        Ok(progress)
    }

    /// Begin when idle, cancel when running. Returns true if a job was started.
    pub fn toggle(&mut self) -> Result<bool, StartError> {
        if self.controller.is_running() {
            self.cancel();
            Ok(false)
        } else {
            self.begin().map(|_| true)
        }
    }

    /// Request cancellation of the running job
    pub fn cancel(&mut self) -> bool {
        self.controller.cancel()
    }

    /// Advance the job and the status message by one tick
    pub fn tick(&mut self) -> StepResult {
        let result = self.controller.step(&mut self.host);

        if matches!(result, StepResult::Completed | StepResult::Cancelled) {
            if let Some(report) = self.controller.take_finished() {
                self.announce(&report);
                self.last_report = Some(report);
            }
        }

        self.notifier.tick();
        result
    }

    fn announce(&mut self, report: &JobReport) {
        match report.status {
            JobStatus::Completed => {
                self.notifier.show("Crunching complete!", COMPLETE_MESSAGE_SECS);
            }
            JobStatus::Cancelled => {
                self.notifier.show(
                    format!("Cancelled. {} complete!", report.progress),
                    CANCEL_MESSAGE_SECS,
                );
            }
            JobStatus::Idle | JobStatus::Running => {
                debug!("No message for job status {:?}", report.status);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    /// Progress of the running job, or of the last finished one
    pub fn progress(&self) -> Progress {
        match (&self.last_report, self.controller.status()) {
            (Some(report), JobStatus::Idle) => report.progress,
            _ => self.controller.progress(),
        }
    }

    pub fn status_message(&self) -> Option<&str> {
        self.notifier.message()
    }

    /// Report of the most recently finished job
    pub fn last_report(&self) -> Option<&JobReport> {
        self.last_report.as_ref()
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Replace the config used by the next `begin`
    pub fn set_config(&mut self, config: JobConfig) {
        self.config = config;
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostOp, ImportSettings, MemoryHost};
    use crate::notifier::TICK_QUANTUM;

    fn session(count: usize, speed: u32) -> CrunchSession<MemoryHost> {
        let mut host = MemoryHost::new();
        for i in 0..count {
            host.insert_filled(&format!("Assets/t{}.png", i), 6, 6, ImportSettings::default());
        }
        CrunchSession::new(
            host,
            JobConfig {
                processing_speed: speed,
                ..JobConfig::default()
            },
        )
    }

    #[test]
    fn test_completion_posts_message() {
        let mut session = session(5, 2);
        session.begin().unwrap();

        assert_eq!(session.tick(), StepResult::Continue);
        assert_eq!(session.tick(), StepResult::Continue);
        assert!(session.status_message().is_none());
        assert_eq!(session.tick(), StepResult::Completed);

        assert_eq!(session.status_message(), Some("Crunching complete!"));
        assert!(!session.is_running());
        assert_eq!(session.progress(), Progress::new(5, 5));

        let report = session.last_report().unwrap();
        assert_eq!(report.status, JobStatus::Completed);

        // controller is back to idle once the report is taken
        assert_eq!(session.tick(), StepResult::Idle);
        assert_eq!(session.status_message(), Some("Crunching complete!"));
    }

    #[test]
    fn test_cancel_posts_progress_message() {
        let mut session = session(4, 1);
        session.begin().unwrap();
        session.tick();

        assert!(!session.toggle().unwrap());
        assert_eq!(session.tick(), StepResult::Cancelled);
        assert_eq!(session.status_message(), Some("Cancelled. 25.00% complete!"));
        assert_eq!(session.progress(), Progress::new(1, 4));
    }

    #[test]
    fn test_message_expires_after_its_duration() {
        let mut session = session(0, 1);
        session.begin().unwrap();
        session.tick();
        assert!(session.status_message().is_some());

        let ticks = (COMPLETE_MESSAGE_SECS / TICK_QUANTUM).ceil() as usize;
        for _ in 0..ticks {
            session.tick();
        }
        assert!(session.status_message().is_none());
    }

    #[test]
    fn test_begin_clears_previous_state() {
        let mut session = session(1, 1);
        session.begin().unwrap();
        session.tick();
        assert!(session.last_report().is_some());

        session.host_mut().insert_filled("Assets/new.png", 3, 3, ImportSettings::default());
        assert!(session.toggle().unwrap());
        assert!(session.status_message().is_none());
        assert!(session.last_report().is_none());
        assert_eq!(session.progress(), Progress::new(0, 1));
    }

    #[test]
    fn test_failures_are_kept_in_report() {
        let mut session = session(2, 5);
        let broken = crate::host::AssetHandle::new("Assets/t0.png");
        session.host_mut().fail_on(&broken, HostOp::Read);

        session.begin().unwrap();
        assert_eq!(session.tick(), StepResult::Completed);

        let report = session.last_report().unwrap();
        assert_eq!(report.progress, Progress::new(2, 2));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].asset, broken);
        assert_eq!(session.status_message(), Some("Crunching complete!"));
    }

    #[test]
    fn test_rerun_retries_assets_that_failed_to_save() {
        let mut session = session(3, 5);
        let broken = crate::host::AssetHandle::new("Assets/t1.png");
        session.host_mut().fail_on(&broken, HostOp::Persist);

        session.begin().unwrap();
        assert_eq!(session.tick(), StepResult::Completed);
        assert_eq!(session.last_report().unwrap().failures.len(), 1);

        assert!(session.toggle().unwrap());
        assert_eq!(session.progress(), Progress::new(0, 1));
        assert_eq!(session.tick(), StepResult::Completed);
        assert_eq!(session.last_report().unwrap().failures[0].asset, broken);
    }

    #[test]
    fn test_set_config_applies_to_next_begin() {
        let mut session = session(1, 1);
        session.set_config(JobConfig {
            compression_quality: 200,
            ..JobConfig::default()
        });
        assert!(matches!(
            session.begin(),
            Err(StartError::InvalidConfiguration(_))
        ));
        assert_eq!(session.config().compression_quality, 200);
    }
}
