use std::collections::BTreeMap;

use veridoc::verification::{
    CaptureClass, Decision, DocumentAsset, DocumentId, DocumentType, MerchantDetails,
    OcrExtraction, RasterPage, RegistryRecord, VerificationRequest, VerificationService,
};

fn ocr_fields(entries: &[(&str, &str)], confidence: f64) -> OcrExtraction {
    let mut fields = BTreeMap::new();
    for (key, value) in entries {
        fields.insert(key.to_string(), value.to_string());
    }
    OcrExtraction {
        fields,
        raw_confidence: confidence,
    }
}

fn registry(name: &str, number: &str, address: &str) -> RegistryRecord {
    RegistryRecord {
        canonical_name: Some(name.to_string()),
        canonical_number: Some(number.to_string()),
        canonical_address: Some(address.to_string()),
        found: true,
    }
}

/// Grayscale scanner-style page with deterministic grain.
fn scanned_page() -> RasterPage {
    let width = 192u32;
    let height = 192u32;
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    let mut state = 0xB5297A4Du32;
    for y in 0..height {
        for x in 0..width {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let ink = x % 19 < 2 && y % 9 < 3;
            let value = if ink {
                28 + (state % 8) as u8
            } else {
                249 + (state % 7) as u8
            };
            pixels.extend_from_slice(&[value, value, value]);
        }
    }
    RasterPage {
        width,
        height,
        pixels,
    }
}

fn request(document_type: DocumentType, ocr: OcrExtraction, registry: RegistryRecord) -> VerificationRequest {
    VerificationRequest {
        document_type,
        asset: DocumentAsset::with_pages(
            DocumentId("flow-1".to_string()),
            "image/png",
            vec![0x89, 0x50, 0x4E, 0x47],
            vec![scanned_page()],
        ),
        ocr,
        registry,
        merchant: MerchantDetails::default(),
    }
}

#[test]
fn strong_certificate_passes_end_to_end() {
    let outcome = VerificationService::default().verify(request(
        DocumentType::CompanyRegistration,
        ocr_fields(
            &[
                ("company_name", "E & C HOLDEN LIMITED"),
                ("company_number", "640918"),
                ("address", "12 High Street, Leeds"),
            ],
            97.0,
        ),
        registry("E. & C. HOLDEN LIMITED", "00640918", "12 High Street, Leeds"),
    ));

    assert_eq!(outcome.decision, Decision::Pass);
    assert!(outcome.breakdown.final_score >= 95.0);
    assert_eq!(outcome.breakdown.forensic_penalty, 0.0);
    assert_eq!(outcome.forensic.capture_class, CaptureClass::ScannedDocument);
    assert_eq!(outcome.document_id, DocumentId("flow-1".to_string()));
}

#[test]
fn registry_mismatch_and_garbled_name_hard_fail() {
    let outcome = VerificationService::default().verify(request(
        DocumentType::CompanyRegistration,
        ocr_fields(
            &[
                ("company_name", "TOTALLY DIFFERENT TRADING"),
                ("company_number", "11112222"),
                ("address", "99 Nowhere Lane"),
            ],
            97.0,
        ),
        registry("E. & C. HOLDEN LIMITED", "00640918", "12 High Street, Leeds"),
    ));

    assert_eq!(outcome.decision, Decision::Fail);
    assert!(outcome.primary_name_similarity.expect("name compared") < 0.85);
}

#[test]
fn missing_registry_bounds_the_score_without_crashing() {
    let outcome = VerificationService::default().verify(request(
        DocumentType::CompanyRegistration,
        ocr_fields(&[("company_name", "ACME LIMITED")], 80.0),
        RegistryRecord::not_found(),
    ));

    // Only the OCR component can contribute; registry absence is not a
    // contradiction, so no override fires and the low total decides.
    assert_eq!(outcome.primary_name_similarity, None);
    assert!(outcome.breakdown.final_score <= 30.0);
    assert_eq!(outcome.decision, Decision::Fail);
}

#[test]
fn outcome_serializes_for_downstream_consumers() {
    let outcome = VerificationService::default().verify(request(
        DocumentType::VatCertificate,
        ocr_fields(
            &[
                ("company_name", "ACME LIMITED"),
                ("vat_number", "123456789"),
                ("address", "1 Acme Way"),
            ],
            92.0,
        ),
        registry("ACME LIMITED", "GB123456789", "1 Acme Way"),
    ));

    let json = serde_json::to_value(&outcome).expect("outcome serializes");
    assert_eq!(json["document_type"], "vat_certificate");
    assert_eq!(json["decision"], "PASS");
    assert!(json["forensic"]["checks"].as_array().expect("checks").len() >= 9);
    assert!(json["comparisons"].as_array().expect("comparisons").len() >= 5);
}
