use super::copy_move;
use crate::verification::domain::{CaptureClass, CheckResult};

/// Hard ceiling on the total forensic deduction.
pub const PENALTY_CEILING: f64 = 15.0;

const ELA_PENALTY: f64 = 5.0;
const JPEG_QUALITY_PENALTY: f64 = 3.0;
const METADATA_PENALTY: f64 = 2.0;
const RESOLUTION_PENALTY: f64 = 2.0;
const HISTOGRAM_PENALTY: f64 = 1.5;
const NOISE_PENALTY: f64 = 1.5;

/// Reduces the check battery's output to one capped penalty.
///
/// Contributions are additive step functions of each check's suspicion, so
/// the penalty is monotone in every input, and a zero-confidence result
/// (check could not run) contributes nothing rather than reading as a
/// clean bill.
pub fn aggregate(checks: &[CheckResult], capture_class: CaptureClass) -> f64 {
    let mut penalty = 0.0;

    for check in checks {
        if check.confidence <= 0.0 || !check.suspicious {
            continue;
        }
        penalty += match check.check_name.as_str() {
            "error_level_analysis" => ELA_PENALTY,
            "copy_move" => {
                copy_move::penalty_contribution(check.confidence * 100.0, capture_class)
            }
            "jpeg_quality" => JPEG_QUALITY_PENALTY,
            "metadata" | "pdf_metadata" => METADATA_PENALTY,
            "resolution_consistency" => RESOLUTION_PENALTY,
            "color_histogram" => HISTOGRAM_PENALTY,
            "noise_pattern" => NOISE_PENALTY,
            // Integrity digests and unknown future checks carry no step.
            _ => 0.0,
        };
    }

    penalty.clamp(0.0, PENALTY_CEILING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flagged(name: &str, confidence: f64) -> CheckResult {
        CheckResult::new(name, 40.0, true, confidence, json!({}))
    }

    #[test]
    fn neutral_battery_costs_nothing() {
        let checks: Vec<CheckResult> = [
            "metadata",
            "error_level_analysis",
            "copy_move",
            "jpeg_quality",
        ]
        .iter()
        .map(|name| CheckResult::neutral(name, "unreadable"))
        .collect();
        assert_eq!(aggregate(&checks, CaptureClass::Photographed), 0.0);
    }

    #[test]
    fn zero_confidence_suspicion_is_ignored() {
        let checks = vec![CheckResult::new(
            "error_level_analysis",
            10.0,
            true,
            0.0,
            json!({}),
        )];
        assert_eq!(aggregate(&checks, CaptureClass::Photographed), 0.0);
    }

    #[test]
    fn contributions_sum_and_clamp_at_ceiling() {
        let checks = vec![
            flagged("error_level_analysis", 0.9),
            flagged("copy_move", 0.8),
            flagged("jpeg_quality", 0.85),
            flagged("metadata", 0.8),
            flagged("pdf_metadata", 0.85),
            flagged("resolution_consistency", 0.7),
            flagged("color_histogram", 0.7),
            flagged("noise_pattern", 0.65),
        ];
        // 5 + 7 + 3 + 2 + 2 + 2 + 1.5 + 1.5 = 24 before the cap.
        assert_eq!(aggregate(&checks, CaptureClass::Photographed), PENALTY_CEILING);
    }

    #[test]
    fn penalty_is_monotone_in_copy_move_confidence() {
        let mut previous = 0.0;
        for step in 0..=10 {
            let confidence = step as f64 / 10.0;
            let penalty = aggregate(
                &[flagged("copy_move", confidence)],
                CaptureClass::Photographed,
            );
            assert!(penalty + 1e-12 >= previous);
            previous = penalty;
        }
    }

    #[test]
    fn severe_copy_move_with_ela_stays_under_ceiling() {
        let checks = vec![
            flagged("error_level_analysis", 0.9),
            flagged("copy_move", 1.0),
        ];
        let penalty = aggregate(&checks, CaptureClass::Photographed);
        assert_eq!(penalty, 12.0);
    }
}
