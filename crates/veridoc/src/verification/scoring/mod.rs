mod policy;
pub mod profiles;
mod rules;

pub use profiles::{ComparisonField, FieldWeight, ScoringProfile};

use super::comparison::{self, ComparisonOutcome};
use super::domain::{Decision, MerchantDetails, OcrExtraction, RegistryRecord, ScoreBreakdown};

/// Stateless fusion of the component scores into a bounded breakdown and
/// verdict, per the document type's profile.
pub struct ScoringEngine {
    profile: ScoringProfile,
}

impl ScoringEngine {
    pub fn new(profile: ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    /// Computes every sub-score, subtracts the forensic penalty, and clamps
    /// into [0, 100].
    pub fn score(
        &self,
        ocr: &OcrExtraction,
        registry: &RegistryRecord,
        merchant: &MerchantDetails,
        forensic_penalty: f64,
    ) -> (ScoreBreakdown, ComparisonOutcome) {
        let comparison = comparison::compare_all(&self.profile, ocr, registry, merchant);

        let ocr_score = rules::ocr_score(ocr.raw_confidence, &self.profile);
        let registry_score = rules::registry_score(ocr, registry, &self.profile);
        let forensic_penalty = forensic_penalty.clamp(0.0, super::forensics::PENALTY_CEILING);

        let component_sum =
            ocr_score + registry_score + comparison.comparison_score + comparison.provided_score;
        let final_score = (component_sum - forensic_penalty).clamp(0.0, 100.0);

        let breakdown = ScoreBreakdown {
            ocr_score,
            registry_score,
            comparison_score: comparison.comparison_score,
            provided_score: comparison.provided_score,
            forensic_penalty,
            final_score,
        };

        (breakdown, comparison)
    }

    pub fn decide(
        &self,
        breakdown: &ScoreBreakdown,
        primary_name_similarity: Option<f64>,
    ) -> Decision {
        policy::decide(breakdown, primary_name_similarity, &self.profile)
    }
}
