//! Wall-clock timing of test methods

use std::time::{Duration, Instant};

/// Started on construction; `stop` reports the elapsed time at debug level
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn stop(self) -> Duration {
        let elapsed = self.start.elapsed();
        tracing::debug!("{} took {}ms", self.label, elapsed.as_millis());
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_reports_elapsed() {
        let timer = Timer::start("Nap.test_sleep");
        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.stop() >= Duration::from_millis(10));
    }
}
