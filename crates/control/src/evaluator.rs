//! Compliance evaluator
//!
//! Memoryless: a reading is judged only against the enterprise's current
//! limits. A value equal to its limit is compliant.

use ecoctl_core::{Limits, Reading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub metric1_exceeded: bool,
    pub metric2_exceeded: bool,
}

impl Verdict {
    pub fn exceeded(&self) -> bool {
        self.metric1_exceeded || self.metric2_exceeded
    }
}

pub struct ComplianceEvaluator;

impl ComplianceEvaluator {
    pub fn evaluate(reading: Reading, limits: Limits) -> Verdict {
        Verdict {
            metric1_exceeded: reading.metric1 > limits.metric1,
            metric2_exceeded: reading.metric2 > limits.metric2,
        }
    }

    pub fn exceeded(reading: Reading, limits: Limits) -> bool {
        Self::evaluate(reading, limits).exceeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: Limits = Limits::new(100, 20);

    #[test]
    fn test_within_limits() {
        assert!(!ComplianceEvaluator::exceeded(Reading::new(50, 10), LIMITS));
    }

    #[test]
    fn test_equal_to_limit_is_compliant() {
        assert!(!ComplianceEvaluator::exceeded(Reading::new(100, 20), LIMITS));
    }

    #[test]
    fn test_either_metric_triggers() {
        let first = ComplianceEvaluator::evaluate(Reading::new(101, 0), LIMITS);
        assert!(first.metric1_exceeded && !first.metric2_exceeded);
        assert!(first.exceeded());

        let second = ComplianceEvaluator::evaluate(Reading::new(0, 21), LIMITS);
        assert!(!second.metric1_exceeded && second.metric2_exceeded);
        assert!(second.exceeded());
    }

    #[test]
    fn test_zero_limits() {
        let zero = Limits::new(0, 0);
        assert!(!ComplianceEvaluator::exceeded(Reading::new(0, 0), zero));
        assert!(ComplianceEvaluator::exceeded(Reading::new(1, 0), zero));
    }
}
