use chrono::Utc;
use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::warn;

/// Point-in-time memory reading. Ephemeral; only threshold crossings
/// matter to the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSample {
    /// Used/total memory ratio in [0, 1].
    pub used_ratio: f64,
    pub timestamp: String,
}

/// Samples memory pressure before each page visit. Advisory only: a
/// crossing is logged and counted, and never blocks or drops crawl work.
pub struct ResourceGuard {
    system: System,
    warn_percent: f64,
    warnings: usize,
}

impl ResourceGuard {
    pub fn new(warn_percent: f64) -> Self {
        Self {
            system: System::new(),
            warn_percent,
            warnings: 0,
        }
    }

    pub fn sample(&mut self) -> ResourceSample {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        let used = self.system.used_memory();
        let used_ratio = if total == 0 {
            0.0
        } else {
            (used as f64 / total as f64).clamp(0.0, 1.0)
        };
        ResourceSample {
            used_ratio,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn should_warn(&self, sample: &ResourceSample) -> bool {
        sample.used_ratio * 100.0 > self.warn_percent
    }

    /// Sample and log a degradation hint on a crossing. Returns the
    /// sample either way; visiting proceeds regardless.
    pub fn check(&mut self) -> ResourceSample {
        let sample = self.sample();
        if self.should_warn(&sample) {
            self.warnings += 1;
            warn!(
                "memory pressure {:.1}% exceeds {:.1}% threshold",
                sample.used_ratio * 100.0,
                self.warn_percent
            );
        }
        sample
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_ratio_in_unit_range() {
        let mut guard = ResourceGuard::new(65.0);
        let sample = guard.sample();
        assert!((0.0..=1.0).contains(&sample.used_ratio));
        assert!(!sample.timestamp.is_empty());
    }

    #[test]
    fn test_should_warn_threshold() {
        let guard = ResourceGuard::new(65.0);
        let low = ResourceSample {
            used_ratio: 0.10,
            timestamp: String::new(),
        };
        let high = ResourceSample {
            used_ratio: 0.90,
            timestamp: String::new(),
        };
        assert!(!guard.should_warn(&low));
        assert!(guard.should_warn(&high));
    }

    #[test]
    fn test_negative_threshold_always_warns() {
        let mut guard = ResourceGuard::new(-1.0);
        guard.check();
        assert_eq!(guard.warning_count(), 1);
    }
}
