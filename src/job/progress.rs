//! Progress and failure reporting for crunch jobs

use crate::host::AssetHandle;
use std::fmt;

/// Snapshot of job progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    /// Assets handled so far, including failed ones
    pub processed: usize,
    /// Assets in the job snapshot
    pub total: usize,
}

impl Progress {
    pub fn new(processed: usize, total: usize) -> Self {
        Self { processed, total }
    }

    /// Fraction done in [0, 1]; an empty job counts as done
    pub fn normalized(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f32 / self.total as f32
        }
    }

    /// Percentage done in [0, 100]
    pub fn percent(&self) -> f32 {
        self.normalized() * 100.0
    }

    pub fn is_done(&self) -> bool {
        self.processed >= self.total
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percent())
    }
}

/// An asset that could not be crunched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFailure {
    pub asset: AssetHandle,
    pub error: String,
}
