use tracing::info;

use super::profiles::ScoringProfile;
use crate::verification::domain::{OcrExtraction, RegistryRecord};
use crate::verification::identifiers;
use crate::verification::similarity::similarity;

/// OCR engine confidence mapped linearly into the profile's point cap.
pub(crate) fn ocr_score(raw_confidence: f64, profile: &ScoringProfile) -> f64 {
    if raw_confidence <= 0.0 {
        return 0.0;
    }
    ((raw_confidence / 100.0) * profile.ocr_cap).min(profile.ocr_cap)
}

/// Registry match score: the extracted identifier against the canonical
/// one, both normalized first so 7-digit and 8-digit renderings of the
/// same company agree. Exact match takes the whole cap; near-misses decay
/// with similarity; a missing side scores nothing.
pub(crate) fn registry_score(
    ocr: &OcrExtraction,
    registry: &RegistryRecord,
    profile: &ScoringProfile,
) -> f64 {
    let extracted = ocr.field(profile.number_field_name());
    let canonical = registry
        .found
        .then(|| registry.canonical_number.as_deref())
        .flatten()
        .filter(|value| !value.trim().is_empty());

    let (Some(extracted), Some(canonical)) = (extracted, canonical) else {
        return 0.0;
    };

    let kind = profile.identifier_kind();
    let (Some(left), Some(right)) = (
        identifiers::normalize(extracted, kind),
        identifiers::normalize(canonical, kind),
    ) else {
        return 0.0;
    };

    if left == right {
        info!(number = %left, "registry identifier match");
        return profile.registry_cap;
    }

    similarity(&left, &right) * profile.registry_cap
}
