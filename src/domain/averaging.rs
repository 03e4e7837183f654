// Averaging interval selection for historic data requests
use crate::domain::error::{MonitoringError, MonitoringResult};
use serde::Deserialize;

/// One row of the averaging table: spans up to `max_hours` use `avg_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AveragingStep {
    pub max_hours: f64,
    pub avg_seconds: u32,
}

/// Monotonic step function from requested span to PRTG `avg` value.
///
/// Steps are checked in order; the first whose `max_hours` is not exceeded
/// wins, and spans beyond the last step use `fallback_seconds`.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragingPolicy {
    steps: Vec<AveragingStep>,
    fallback_seconds: u32,
}

impl AveragingPolicy {
    pub fn new(steps: Vec<AveragingStep>, fallback_seconds: u32) -> MonitoringResult<Self> {
        let mut previous: Option<AveragingStep> = None;
        for step in &steps {
            if !step.max_hours.is_finite() || step.max_hours <= 0.0 {
                return Err(MonitoringError::Config(format!(
                    "averaging threshold must be a positive number of hours, got {}",
                    step.max_hours
                )));
            }
            if let Some(prev) = previous {
                if step.max_hours <= prev.max_hours {
                    return Err(MonitoringError::Config(
                        "averaging thresholds must be strictly increasing".to_string(),
                    ));
                }
                if step.avg_seconds < prev.avg_seconds {
                    return Err(MonitoringError::Config(
                        "averaging intervals must not decrease as the span grows".to_string(),
                    ));
                }
            }
            previous = Some(*step);
        }
        if let Some(last) = previous {
            if fallback_seconds < last.avg_seconds {
                return Err(MonitoringError::Config(
                    "fallback averaging interval is finer than the last step".to_string(),
                ));
            }
        }
        Ok(Self {
            steps,
            fallback_seconds,
        })
    }

    pub fn select(&self, span_hours: f64) -> u32 {
        self.steps
            .iter()
            .find(|step| span_hours <= step.max_hours)
            .map(|step| step.avg_seconds)
            .unwrap_or(self.fallback_seconds)
    }
}

impl Default for AveragingPolicy {
    /// Raw values up to half a day, 5 minutes up to 36h, hourly up to ~31 days,
    /// daily beyond.
    fn default() -> Self {
        Self {
            steps: vec![
                AveragingStep {
                    max_hours: 12.0,
                    avg_seconds: 0,
                },
                AveragingStep {
                    max_hours: 36.0,
                    avg_seconds: 300,
                },
                AveragingStep {
                    max_hours: 745.0,
                    avg_seconds: 3600,
                },
            ],
            fallback_seconds: 86_400,
        }
    }
}
