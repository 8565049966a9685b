use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{VerificationOutcome, VerificationRequest};
use super::forensics::{BatteryConfig, ForensicBattery};
use super::scoring::{ScoringEngine, ScoringProfile};

/// Composes the forensic battery, comparison engine, and scoring engine
/// into one synchronous verification pass. Stateless between requests:
/// every call owns its asset snapshot and produces a fresh outcome.
pub struct VerificationService {
    battery: ForensicBattery,
}

impl VerificationService {
    pub fn new(battery_config: BatteryConfig) -> Self {
        Self {
            battery: ForensicBattery::standard(battery_config),
        }
    }

    /// Runs the full pipeline: capture classification and tamper battery
    /// over the raw bytes, field comparisons over the resolved collaborator
    /// values, then score fusion and the decision policy.
    pub fn verify(&self, request: VerificationRequest) -> VerificationOutcome {
        let VerificationRequest {
            document_type,
            asset,
            ocr,
            registry,
            merchant,
        } = request;

        let document_id = asset.document_id.clone();
        let forensic = self.battery.analyze(Arc::new(asset));

        let engine = ScoringEngine::new(ScoringProfile::for_document(document_type));
        let (breakdown, comparison) =
            engine.score(&ocr, &registry, &merchant, forensic.penalty);
        let decision = engine.decide(&breakdown, comparison.primary_name_similarity);

        info!(
            document_id = %document_id.0,
            document_type = document_type.label(),
            final_score = breakdown.final_score,
            forensic_penalty = breakdown.forensic_penalty,
            decision = decision.label(),
            "verification complete"
        );

        VerificationOutcome {
            document_id,
            document_type,
            breakdown,
            decision,
            primary_name_similarity: comparison.primary_name_similarity,
            comparisons: comparison.comparisons,
            forensic,
            completed_at: Utc::now(),
        }
    }
}

impl Default for VerificationService {
    fn default() -> Self {
        Self::new(BatteryConfig::default())
    }
}
