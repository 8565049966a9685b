//! Document verification core: forensic tamper analysis plus multi-factor
//! trust scoring over already-resolved OCR, registry, and merchant inputs.

pub mod comparison;
pub mod domain;
pub mod forensics;
pub mod identifiers;
pub mod router;
pub mod scoring;
pub mod service;
pub mod similarity;

#[cfg(test)]
mod tests;

pub use comparison::ComparisonOutcome;
pub use domain::{
    CaptureClass, CheckResult, Decision, DocumentAsset, DocumentId, DocumentType, FieldComparison,
    ForensicReport, MerchantDetails, OcrExtraction, RasterPage, RegistryRecord, ScoreBreakdown,
    StrictnessProfile, VerificationOutcome, VerificationRequest,
};
pub use forensics::{BatteryConfig, ForensicBattery, ForensicCheck, PENALTY_CEILING};
pub use router::verification_router;
pub use scoring::{ScoringEngine, ScoringProfile};
pub use service::VerificationService;
