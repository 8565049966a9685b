use tracing::warn;

use super::profiles::ScoringProfile;
use crate::verification::domain::{Decision, ScoreBreakdown};

/// Maps the numeric score to a verdict, after the name-floor overrides.
///
/// The overrides exist because weighted averaging dilutes a single
/// catastrophic mismatch: a document naming the wrong company entirely can
/// still post a high aggregate when every other component is clean. The
/// hard floor is applied before the soft floor so the worst band cannot be
/// absorbed into REVIEW.
pub(crate) fn decide(
    breakdown: &ScoreBreakdown,
    primary_name_similarity: Option<f64>,
    profile: &ScoringProfile,
) -> Decision {
    if let Some(name_similarity) = primary_name_similarity {
        if name_similarity < profile.hard_name_floor {
            warn!(
                name_similarity,
                floor = profile.hard_name_floor,
                "legal name similarity below hard floor, forcing FAIL"
            );
            return Decision::Fail;
        }
        if name_similarity < profile.soft_name_floor {
            warn!(
                name_similarity,
                floor = profile.soft_name_floor,
                "legal name similarity below soft floor, forcing REVIEW"
            );
            return Decision::Review;
        }
    }

    if breakdown.final_score >= profile.pass_threshold {
        Decision::Pass
    } else if breakdown.final_score >= profile.review_threshold {
        Decision::Review
    } else {
        Decision::Fail
    }
}
