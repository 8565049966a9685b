use std::collections::BTreeMap;

use crate::verification::domain::{
    DocumentAsset, DocumentId, DocumentType, MerchantDetails, OcrExtraction, RasterPage,
    RegistryRecord, VerificationRequest,
};

/// Synthetic scanner output: paper white with sparse ink strokes, plus a
/// little sensor grain so block statistics behave like a real capture.
pub(super) fn scanned_page(width: u32, height: u32) -> RasterPage {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    let mut state = 0x2F6E2B1u32;
    for y in 0..height {
        for x in 0..width {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let ink = x % 23 < 2 && y % 7 < 3;
            let value = if ink {
                25 + (state % 10) as u8
            } else {
                248 + (state % 8) as u8
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

pub(super) fn asset_with_page(document_id: &str, page: RasterPage) -> DocumentAsset {
    DocumentAsset::with_pages(
        DocumentId(document_id.to_string()),
        "image/png",
        vec![0x89, 0x50, 0x4E, 0x47, 0, 0, 0, 0],
        vec![page],
    )
}

pub(super) fn holden_ocr(confidence: f64) -> OcrExtraction {
    let mut fields = BTreeMap::new();
    fields.insert("company_name".to_string(), "E & C HOLDEN LIMITED".to_string());
    fields.insert("company_number".to_string(), "640918".to_string());
    fields.insert(
        "address".to_string(),
        "12 High Street, Leeds, LS1 4AB".to_string(),
    );
    OcrExtraction {
        fields,
        raw_confidence: confidence,
    }
}

pub(super) fn holden_registry() -> RegistryRecord {
    RegistryRecord {
        canonical_name: Some("E. & C. HOLDEN LIMITED".to_string()),
        canonical_number: Some("00640918".to_string()),
        canonical_address: Some("14 High Street, Leeds, LS1 4AB".to_string()),
        found: true,
    }
}

pub(super) fn holden_merchant() -> MerchantDetails {
    MerchantDetails {
        declared_name: Some("E & C Holden Limited".to_string()),
        declared_number: Some("640918".to_string()),
        declared_address: Some("12 High St, Leeds".to_string()),
    }
}

pub(super) fn holden_request(document_id: &str, confidence: f64) -> VerificationRequest {
    VerificationRequest {
        document_type: DocumentType::CompanyRegistration,
        asset: asset_with_page(document_id, scanned_page(256, 256)),
        ocr: holden_ocr(confidence),
        registry: holden_registry(),
        merchant: holden_merchant(),
    }
}
