//! Field-triple comparison: OCR-extracted and merchant-declared values
//! against the authoritative registry record, weighted per document type.

use super::domain::{
    FieldComparison, MerchantDetails, OcrExtraction, RegistryRecord, StrictnessProfile,
};
use super::identifiers;
use super::scoring::profiles::{ComparisonField, FieldWeight, ScoringProfile};
use super::similarity::{similarity, weight_factor};

/// Everything the scoring engine needs from the comparison pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOutcome {
    pub comparison_score: f64,
    pub provided_score: f64,
    pub comparisons: Vec<FieldComparison>,
    /// OCR-vs-registry legal-name similarity, when both sides exist;
    /// drives the hard/soft decision overrides.
    pub primary_name_similarity: Option<f64>,
}

pub fn compare_all(
    profile: &ScoringProfile,
    ocr: &OcrExtraction,
    registry: &RegistryRecord,
    merchant: &MerchantDetails,
) -> ComparisonOutcome {
    let mut comparisons = Vec::new();

    let (comparison_score, primary_name_similarity) = scored_triple(
        profile,
        &profile.ocr_registry_weights,
        profile.comparison_cap,
        "ocr",
        |field| ocr_value(profile, ocr, field),
        registry,
        &mut comparisons,
    );

    let (provided_score, _) = scored_triple(
        profile,
        &profile.merchant_registry_weights,
        profile.provided_cap,
        "merchant",
        |field| merchant_value(merchant, field),
        registry,
        &mut comparisons,
    );

    ComparisonOutcome {
        comparison_score,
        provided_score,
        comparisons,
        primary_name_similarity,
    }
}

/// Weighted comparison of one triple against the registry. Pairs with a
/// missing side are recorded at zero weight and excluded from the
/// denominator, so absence never reads as contradiction; the present
/// fields are renormalized over the remaining weight.
fn scored_triple(
    profile: &ScoringProfile,
    weights: &[FieldWeight],
    budget: f64,
    source_label: &str,
    value_of: impl Fn(ComparisonField) -> Option<String>,
    registry: &RegistryRecord,
    comparisons: &mut Vec<FieldComparison>,
) -> (f64, Option<f64>) {
    let mut awarded_weight = 0.0;
    let mut present_weight = 0.0;
    let mut name_similarity = None;

    for entry in weights {
        let field_name = format!(
            "{source_label}_registry_{}",
            field_label(profile, entry.field)
        );
        let value_a = value_of(entry.field);
        let value_b = registry_value(registry, entry.field);

        let (Some(a), Some(b)) = (value_a.clone(), value_b.clone()) else {
            comparisons.push(FieldComparison {
                field_name,
                value_a,
                value_b,
                similarity: 0.0,
                weight: 0.0,
                strictness: entry.strictness,
                awarded: 0.0,
            });
            continue;
        };

        let (sim, factor) = match entry.field {
            ComparisonField::Number => number_similarity(profile, &a, &b),
            _ => {
                let sim = similarity(&a, &b);
                (sim, weight_factor(sim, entry.strictness))
            }
        };

        if entry.field == ComparisonField::Name && source_label == "ocr" {
            name_similarity = Some(sim);
        }

        present_weight += entry.weight;
        awarded_weight += entry.weight * factor;
        comparisons.push(FieldComparison {
            field_name,
            value_a: Some(a),
            value_b: Some(b),
            similarity: sim,
            weight: entry.weight,
            strictness: entry.strictness,
            awarded: factor.clamp(0.0, 1.0),
        });
    }

    let score = if present_weight > 0.0 {
        (budget * awarded_weight / present_weight).clamp(0.0, budget)
    } else {
        0.0
    };

    (score, name_similarity)
}

/// Identifiers are compared post-normalization. A side that fails to
/// normalize scores zero similarity at full weight: a malformed number is
/// a contradiction, not a missing field.
fn number_similarity(profile: &ScoringProfile, a: &str, b: &str) -> (f64, f64) {
    let kind = profile.identifier_kind();
    match (
        identifiers::normalize(a, kind),
        identifiers::normalize(b, kind),
    ) {
        (Some(left), Some(right)) => {
            let sim = if left == right {
                1.0
            } else {
                similarity(&left, &right)
            };
            (sim, weight_factor(sim, StrictnessProfile::Exact))
        }
        _ => (0.0, 0.0),
    }
}

fn field_label(profile: &ScoringProfile, field: ComparisonField) -> &'static str {
    match field {
        ComparisonField::Number => profile.number_field_name(),
        other => other.label(),
    }
}

fn ocr_value(profile: &ScoringProfile, ocr: &OcrExtraction, field: ComparisonField) -> Option<String> {
    let key = match field {
        ComparisonField::Name => "company_name",
        ComparisonField::Number => profile.number_field_name(),
        ComparisonField::Address => "address",
    };
    ocr.field(key).map(str::to_string)
}

fn merchant_value(merchant: &MerchantDetails, field: ComparisonField) -> Option<String> {
    let value = match field {
        ComparisonField::Name => merchant.declared_name.as_deref(),
        ComparisonField::Number => merchant.declared_number.as_deref(),
        ComparisonField::Address => merchant.declared_address.as_deref(),
    };
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn registry_value(registry: &RegistryRecord, field: ComparisonField) -> Option<String> {
    if !registry.found {
        return None;
    }
    let value = match field {
        ComparisonField::Name => registry.canonical_name.as_deref(),
        ComparisonField::Number => registry.canonical_number.as_deref(),
        ComparisonField::Address => registry.canonical_address.as_deref(),
    };
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
