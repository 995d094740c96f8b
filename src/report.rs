use crate::error::AppError;
use std::fmt;

/// Outcome counters for one batch command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    /// Records that could not be handled: no date, bad date, missing source.
    pub skipped: usize,
    /// Destination already present; source left in place.
    pub collisions: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn success(&mut self) {
        self.processed += 1;
    }

    /// Logs a per-record error and counts it.
    pub fn record(&mut self, err: &AppError) {
        match err {
            AppError::DestinationCollision(_) => {
                log::info!("{}", err);
                self.collisions += 1;
            }
            AppError::RecordSkipped { .. } => {
                log::warn!("{}", err);
                self.skipped += 1;
            }
            _ => {
                log::warn!("{}", err);
                self.failed += 1;
            }
        }
    }

    /// Collisions do not count.
    pub fn has_failures(&self) -> bool {
        self.skipped > 0 || self.failed > 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} already present, {} skipped, {} failed",
            self.processed, self.collisions, self.skipped, self.failed
        )
    }
}
