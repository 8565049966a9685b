use serde::{Deserialize, Serialize};

use crate::verification::domain::{DocumentType, StrictnessProfile};
use crate::verification::identifiers::IdentifierKind;

/// Field slot inside a comparison triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonField {
    Name,
    Number,
    Address,
}

impl ComparisonField {
    pub const fn label(self) -> &'static str {
        match self {
            ComparisonField::Name => "name",
            ComparisonField::Number => "number",
            ComparisonField::Address => "address",
        }
    }
}

/// One weighted field inside a triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldWeight {
    pub field: ComparisonField,
    pub weight: f64,
    pub strictness: StrictnessProfile,
}

/// Per-document-type scoring rubric: component point caps, comparison
/// weights, and decision thresholds. Built once per type, read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub document_type: DocumentType,
    pub ocr_cap: f64,
    pub registry_cap: f64,
    pub comparison_cap: f64,
    pub provided_cap: f64,
    pub ocr_registry_weights: Vec<FieldWeight>,
    pub merchant_registry_weights: Vec<FieldWeight>,
    pub hard_name_floor: f64,
    pub soft_name_floor: f64,
    pub pass_threshold: f64,
    pub review_threshold: f64,
}

impl ScoringProfile {
    pub fn for_document(document_type: DocumentType) -> Self {
        match document_type {
            DocumentType::CompanyRegistration | DocumentType::VatCertificate => Self {
                document_type,
                ocr_cap: 30.0,
                registry_cap: 40.0,
                comparison_cap: 30.0,
                provided_cap: 30.0,
                ocr_registry_weights: standard_weights(0.5, 0.3, 0.2),
                merchant_registry_weights: standard_weights(0.4, 0.4, 0.2),
                hard_name_floor: 0.85,
                soft_name_floor: 0.90,
                pass_threshold: 75.0,
                review_threshold: 50.0,
            },
            // Appointment evidence leans on the extracted text itself; the
            // registry carries no officer-level detail to cross-check, so
            // the name/number pairing is tracked for overrides but earns
            // no separate comparison points.
            DocumentType::DirectorAppointment => Self {
                document_type,
                ocr_cap: 40.0,
                registry_cap: 30.0,
                comparison_cap: 0.0,
                provided_cap: 30.0,
                ocr_registry_weights: standard_weights(0.6, 0.4, 0.0),
                merchant_registry_weights: standard_weights(0.4, 0.4, 0.2),
                hard_name_floor: 0.85,
                soft_name_floor: 0.90,
                pass_threshold: 75.0,
                review_threshold: 50.0,
            },
        }
    }

    /// Which OCR field and normalization the number slot uses.
    pub fn identifier_kind(&self) -> IdentifierKind {
        match self.document_type {
            DocumentType::VatCertificate => IdentifierKind::VatNumber,
            _ => IdentifierKind::CompanyNumber,
        }
    }

    pub fn number_field_name(&self) -> &'static str {
        match self.document_type {
            DocumentType::VatCertificate => "vat_number",
            _ => "company_number",
        }
    }
}

fn standard_weights(name: f64, number: f64, address: f64) -> Vec<FieldWeight> {
    let mut weights = vec![
        FieldWeight {
            field: ComparisonField::Name,
            weight: name,
            strictness: StrictnessProfile::Strict,
        },
        FieldWeight {
            field: ComparisonField::Number,
            weight: number,
            strictness: StrictnessProfile::Exact,
        },
    ];
    if address > 0.0 {
        weights.push(FieldWeight {
            field: ComparisonField::Address,
            weight: address,
            strictness: StrictnessProfile::Lenient,
        });
    }
    weights
}
