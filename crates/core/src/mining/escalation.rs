//! Threshold escalation shared by the miner and the rule generator.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::errors::DomainError;

/// Which pass a threshold ladder drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Support,
    Confidence,
}

impl Stage {
    fn pass_event(self) -> &'static str {
        match self {
            Self::Support => "mining.support.escalated",
            Self::Confidence => "mining.confidence.escalated",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Support => f.write_str("support"),
            Self::Confidence => f.write_str("confidence"),
        }
    }
}

/// A non-empty, strictly decreasing list of thresholds in `(0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ThresholdLadder {
    stage: Stage,
    thresholds: Vec<f64>,
}

impl ThresholdLadder {
    pub fn new(stage: Stage, thresholds: Vec<f64>) -> Result<Self, DomainError> {
        if thresholds.is_empty() {
            return Err(DomainError::EmptyThresholds { stage });
        }
        for &value in &thresholds {
            if !(value > 0.0 && value <= 1.0) {
                return Err(DomainError::ThresholdOutOfRange { stage, value });
            }
        }
        for pair in thresholds.windows(2) {
            if pair[1] >= pair[0] {
                return Err(DomainError::ThresholdsNotDecreasing {
                    stage,
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        Ok(Self { stage, thresholds })
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }
}

/// Support and confidence ladders for one mining run.
///
/// Immutable once built, so independent runs with different schedules can
/// coexist.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EscalationSchedule {
    support: ThresholdLadder,
    confidence: ThresholdLadder,
}

impl EscalationSchedule {
    pub fn new(support: Vec<f64>, confidence: Vec<f64>) -> Result<Self, DomainError> {
        Ok(Self {
            support: ThresholdLadder::new(Stage::Support, support)?,
            confidence: ThresholdLadder::new(Stage::Confidence, confidence)?,
        })
    }

    pub fn support(&self) -> &ThresholdLadder {
        &self.support
    }

    pub fn confidence(&self) -> &ThresholdLadder {
        &self.confidence
    }
}

impl Default for EscalationSchedule {
    fn default() -> Self {
        Self {
            support: ThresholdLadder {
                stage: Stage::Support,
                thresholds: super::DEFAULT_SUPPORT_THRESHOLDS.to_vec(),
            },
            confidence: ThresholdLadder {
                stage: Stage::Confidence,
                thresholds: super::DEFAULT_CONFIDENCE_THRESHOLDS.to_vec(),
            },
        }
    }
}

/// Output of a single mining or generation pass.
pub trait PassResult: Default {
    fn result_len(&self) -> usize;
}

/// One rung tried by [`escalate`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Attempt {
    pub threshold: f64,
    pub result_len: usize,
}

/// Result of an escalated pass plus the rungs it took to get there.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Escalated<T> {
    pub value: T,
    /// Threshold that produced a non-empty result, `None` when the ladder was
    /// exhausted or never tried.
    pub settled_at: Option<f64>,
    pub attempts: Vec<Attempt>,
}

impl<T> Escalated<T> {
    /// A result that never ran any pass.
    pub fn skipped(value: T) -> Self {
        Self { value, settled_at: None, attempts: Vec::new() }
    }

    pub fn escalated(&self) -> bool {
        self.attempts.len() > 1
    }

    /// Threshold of the last rung tried.
    pub fn last_threshold(&self) -> Option<f64> {
        self.attempts.last().map(|attempt| attempt.threshold)
    }
}

/// Runs `pass` at each threshold of `ladder` in order and stops at the first
/// non-empty result. An exhausted ladder yields the empty result of the last
/// rung; that is a legitimate outcome, not an error.
pub fn escalate<T, F>(ladder: &ThresholdLadder, mut pass: F) -> Escalated<T>
where
    T: PassResult,
    F: FnMut(f64) -> T,
{
    let stage = ladder.stage();
    let mut attempts = Vec::with_capacity(ladder.thresholds().len());
    let mut last = None;

    for (rung, &threshold) in ladder.thresholds().iter().enumerate() {
        let result = pass(threshold);
        let result_len = result.result_len();
        attempts.push(Attempt { threshold, result_len });
        debug!(
            event_name = stage.pass_event(),
            stage = %stage,
            rung,
            threshold,
            result_len,
            "escalation pass finished"
        );

        if result_len > 0 {
            if rung > 0 {
                info!(
                    event_name = "mining.escalation.settled",
                    stage = %stage,
                    threshold,
                    result_len,
                    "found results after loosening threshold"
                );
            }
            return Escalated { value: result, settled_at: Some(threshold), attempts };
        }

        info!(
            event_name = "mining.escalation.empty_pass",
            stage = %stage,
            threshold,
            "pass returned nothing, trying next threshold"
        );
        last = Some(result);
    }

    info!(
        event_name = "mining.escalation.exhausted",
        stage = %stage,
        rungs = attempts.len(),
        "threshold ladder exhausted without results"
    );
    Escalated { value: last.unwrap_or_default(), settled_at: None, attempts }
}
