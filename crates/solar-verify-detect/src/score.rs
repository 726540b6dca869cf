//! Weighted confidence and the approve/reject decision.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.45;

const COVERAGE_WEIGHT: f64 = 0.4;
const SIMILARITY_WEIGHT: f64 = 0.3;
const PANEL_WEIGHT: f64 = 0.3;
/// Coverage (percent) at which the coverage term saturates.
const COVERAGE_SATURATION: f64 = 10.0;
/// Region count at which the panel term saturates.
const PANEL_SATURATION: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Approved,
    Rejected,
}

impl Verdict {
    pub fn is_approved(self) -> bool {
        matches!(self, Verdict::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Approved => "APPROVED",
            Verdict::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Individual terms of a confidence score, each already in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub coverage_score: f64,
    pub similarity: f64,
    pub panel_score: f64,
    pub confidence: f64,
    pub verdict: Verdict,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConfidenceScorer {
    threshold: f64,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE)
    }
}

impl ConfidenceScorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `0.4 * min(1, coverage / 10) + 0.3 * similarity + 0.3 * min(1, panels / 5)`.
    ///
    /// `similarity` is `None` without a reference photo and contributes 0.
    pub fn confidence(&self, coverage: f64, similarity: Option<f64>, panel_count: usize) -> f64 {
        self.score(coverage, similarity, panel_count).confidence
    }

    /// `confidence >= threshold`.
    pub fn verdict(&self, confidence: f64) -> Verdict {
        if confidence >= self.threshold {
            Verdict::Approved
        } else {
            Verdict::Rejected
        }
    }

    pub fn score(&self, coverage: f64, similarity: Option<f64>, panel_count: usize) -> ScoreBreakdown {
        let coverage_score = (sanitize(coverage) / COVERAGE_SATURATION).min(1.0);
        let similarity = similarity.map(sanitize).unwrap_or(0.0).min(1.0);
        let panel_score = (panel_count as f64 / PANEL_SATURATION).min(1.0);
        let confidence = COVERAGE_WEIGHT * coverage_score
            + SIMILARITY_WEIGHT * similarity
            + PANEL_WEIGHT * panel_score;
        ScoreBreakdown {
            coverage_score,
            similarity,
            panel_score,
            confidence,
            verdict: self.verdict(confidence),
        }
    }
}

/// Negative and NaN inputs count as zero.
fn sanitize(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        0.0
    } else {
        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn saturated_inputs_give_full_confidence() {
        let s = ConfidenceScorer::default();
        assert_relative_eq!(s.confidence(20.0, Some(1.0), 9), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_reference_caps_confidence() {
        let s = ConfidenceScorer::default();
        let c = s.confidence(100.0, None, 100);
        assert_relative_eq!(c, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn weighted_terms_add_up() {
        let s = ConfidenceScorer::default();
        let b = s.score(5.0, Some(0.5), 2);
        assert_relative_eq!(b.coverage_score, 0.5);
        assert_relative_eq!(b.panel_score, 0.4);
        assert_relative_eq!(b.confidence, 0.2 + 0.15 + 0.12, epsilon = 1e-12);
        assert_eq!(b.verdict, Verdict::Approved);
    }

    #[test]
    fn threshold_is_inclusive() {
        let s = ConfidenceScorer::new(0.5);
        assert_eq!(s.verdict(0.5), Verdict::Approved);
        assert_eq!(s.verdict(0.499_999), Verdict::Rejected);
    }

    #[test]
    fn bad_inputs_count_as_zero() {
        let s = ConfidenceScorer::default();
        assert_eq!(s.confidence(f64::NAN, Some(-3.0), 0), 0.0);
        assert_relative_eq!(s.confidence(-1.0, Some(7.0), 0), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn confidence_is_monotonic_in_each_input() {
        let s = ConfidenceScorer::default();
        let grid = [0.0, 0.5, 2.0, 9.9, 10.0, 40.0];
        for &cov in &grid {
            for sim in [0.0, 0.25, 0.8, 1.0] {
                for n in 0..7 {
                    let c = s.confidence(cov, Some(sim), n);
                    assert!(s.confidence(cov + 1.0, Some(sim), n) >= c);
                    assert!(s.confidence(cov, Some((sim + 0.1).min(1.0)), n) >= c);
                    assert!(s.confidence(cov, Some(sim), n + 1) >= c);
                }
            }
        }
    }

    #[test]
    fn verdict_serializes_in_upper_case() {
        let json = serde_json::to_string(&Verdict::Rejected).expect("json");
        assert_eq!(json, "\"REJECTED\"");
        assert_eq!(Verdict::Approved.to_string(), "APPROVED");
    }
}
