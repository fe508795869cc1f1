use crate::services::logger::Logger;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferDirection {
    Put,
    Get,
}

/// Receives transfer progress on the calling thread.
///
/// `count` gets the size of each chunk just moved; returning `false`
/// cancels the transfer.
pub trait ProgressMonitor {
    fn init(&mut self, direction: TransferDirection, source: &str, destination: &str, total: u64);

    fn count(&mut self, bytes: u64) -> bool;

    fn end(&mut self);
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressMonitor for SilentProgress {
    fn init(&mut self, _: TransferDirection, _: &str, _: &str, _: u64) {}

    fn count(&mut self, _: u64) -> bool {
        true
    }

    fn end(&mut self) {}
}

/// Logs progress at debug level every `step_percent` percent.
#[derive(Debug, Clone)]
pub struct LoggingProgress {
    logger: Logger,
    step_percent: u64,
    total: u64,
    transferred: u64,
    next_report: u64,
}

impl LoggingProgress {
    pub fn new(logger: Logger, step_percent: u64) -> Self {
        Self {
            logger: logger.child("progress"),
            step_percent: step_percent.clamp(1, 100),
            total: 0,
            transferred: 0,
            next_report: 0,
        }
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }
}

impl ProgressMonitor for LoggingProgress {
    fn init(&mut self, direction: TransferDirection, source: &str, destination: &str, total: u64) {
        self.total = total;
        self.transferred = 0;
        self.next_report = self.step_percent;
        self.logger.info(
            "transfer started",
            Some(&serde_json::json!({
                "direction": direction,
                "source": source,
                "destination": destination,
                "bytes": total,
            })),
        );
    }

    fn count(&mut self, bytes: u64) -> bool {
        self.transferred += bytes;
        if self.total > 0 {
            let percent = self.transferred.saturating_mul(100) / self.total;
            if percent >= self.next_report {
                self.logger.debug(
                    "transfer progress",
                    Some(&serde_json::json!({"percent": percent, "bytes": self.transferred})),
                );
                self.next_report = percent + self.step_percent;
            }
        }
        true
    }

    fn end(&mut self) {
        self.logger.info(
            "transfer finished",
            Some(&serde_json::json!({"bytes": self.transferred})),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::logger::LogLevel;

    #[test]
    fn logging_progress_tracks_bytes() {
        let logger = Logger::with_level("test", LogLevel::Error);
        let mut progress = LoggingProgress::new(logger.clone(), 25);
        progress.init(TransferDirection::Get, "/files/a.tar", "a.tar", 100);
        for _ in 0..4 {
            assert!(progress.count(25));
        }
        progress.end();
        assert_eq!(progress.transferred(), 100);
        assert_eq!(logger.stats()["info"], 0);
    }
}
