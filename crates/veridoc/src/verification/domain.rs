use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier wrapper for verification requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub String);

/// Business document categories with distinct scoring profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    CompanyRegistration,
    VatCertificate,
    DirectorAppointment,
}

impl DocumentType {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentType::CompanyRegistration => "company_registration",
            DocumentType::VatCertificate => "vat_certificate",
            DocumentType::DirectorAppointment => "director_appointment",
        }
    }
}

/// One decoded raster page: interleaved RGB8 rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RasterPage {
    pub fn from_dynamic(image: &image::DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        Self {
            width: rgb.width(),
            height: rgb.height(),
            pixels: rgb.into_raw(),
        }
    }

    /// Luma plane via the BT.601 integer approximation.
    pub fn luma(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(3)
            .map(|px| {
                let y = 299 * px[0] as u32 + 587 * px[1] as u32 + 114 * px[2] as u32;
                (y / 1000) as u8
            })
            .collect()
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    pub fn to_gray_image(&self) -> Option<image::GrayImage> {
        image::GrayImage::from_raw(self.width, self.height, self.luma())
    }

    /// Share of pixels whose channel spread stays within `tolerance`.
    pub fn grayscale_ratio(&self, tolerance: u8) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let total = self.pixels.len() / 3;
        let near = self
            .pixels
            .chunks_exact(3)
            .filter(|px| {
                let max = px.iter().copied().max().unwrap_or(0);
                let min = px.iter().copied().min().unwrap_or(0);
                max - min <= tolerance
            })
            .count();
        near as f64 / total as f64
    }
}

/// Immutable snapshot of the uploaded file for one analysis pass.
#[derive(Debug, Clone)]
pub struct DocumentAsset {
    pub document_id: DocumentId,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub pages: Vec<RasterPage>,
}

impl DocumentAsset {
    /// Build an asset, decoding raster pages from the bytes where the MIME
    /// type names a supported image format. PDF rasterization happens
    /// upstream; PDF assets keep whatever pages the caller supplied.
    pub fn decode(document_id: DocumentId, mime: &str, bytes: Vec<u8>) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        let pages = if Self::is_raster_mime(&mime) {
            image::load_from_memory(&bytes)
                .map(|decoded| vec![RasterPage::from_dynamic(&decoded)])
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        Self {
            document_id,
            mime,
            bytes,
            pages,
        }
    }

    pub fn with_pages(
        document_id: DocumentId,
        mime: &str,
        bytes: Vec<u8>,
        pages: Vec<RasterPage>,
    ) -> Self {
        Self {
            document_id,
            mime: mime.trim().to_ascii_lowercase(),
            bytes,
            pages,
        }
    }

    pub fn first_page(&self) -> Option<&RasterPage> {
        self.pages.first()
    }

    pub fn is_pdf(&self) -> bool {
        self.mime == mime::APPLICATION_PDF.essence_str() || self.bytes.starts_with(b"%PDF")
    }

    pub fn is_jpeg(&self) -> bool {
        self.mime == mime::IMAGE_JPEG.essence_str() || self.bytes.starts_with(&[0xFF, 0xD8, 0xFF])
    }

    fn is_raster_mime(mime: &str) -> bool {
        matches!(
            mime,
            "image/jpeg" | "image/jpg" | "image/png" | "image/bmp" | "image/tiff"
        )
    }
}

/// Scanner output versus camera capture; relaxes pixel-statistic thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureClass {
    ScannedDocument,
    Photographed,
}

impl CaptureClass {
    pub fn classify(page: Option<&RasterPage>) -> Self {
        match page {
            Some(page) if page.grayscale_ratio(12) >= 0.92 => CaptureClass::ScannedDocument,
            _ => CaptureClass::Photographed,
        }
    }

    pub const fn is_scan(self) -> bool {
        matches!(self, CaptureClass::ScannedDocument)
    }
}

/// Outcome of a single forensic check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_name: String,
    pub score: f64,
    pub suspicious: bool,
    pub confidence: f64,
    pub detail: Value,
}

impl CheckResult {
    pub fn new(check_name: &str, score: f64, suspicious: bool, confidence: f64, detail: Value) -> Self {
        Self {
            check_name: check_name.to_string(),
            score: score.clamp(0.0, 100.0),
            suspicious,
            confidence: confidence.clamp(0.0, 1.0),
            detail,
        }
    }

    /// Result for a check that could not run: treated as absent evidence,
    /// never as evidence of innocence.
    pub fn neutral(check_name: &str, reason: &str) -> Self {
        Self {
            check_name: check_name.to_string(),
            score: 100.0,
            suspicious: false,
            confidence: 0.0,
            detail: serde_json::json!({ "skipped": reason }),
        }
    }
}

/// Ordered check results plus the derived capped penalty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicReport {
    pub capture_class: CaptureClass,
    pub checks: Vec<CheckResult>,
    pub penalty: f64,
}

impl ForensicReport {
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|check| check.check_name == name)
    }
}

/// Similarity-to-weight curve selection per field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrictnessProfile {
    Strict,
    Lenient,
    Exact,
}

/// Audit record of one field pairing inside a comparison triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldComparison {
    pub field_name: String,
    pub value_a: Option<String>,
    pub value_b: Option<String>,
    pub similarity: f64,
    pub weight: f64,
    pub strictness: StrictnessProfile,
    /// Fraction of `weight` granted after the strictness curve.
    pub awarded: f64,
}

/// Component scores feeding the final bounded trust score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub ocr_score: f64,
    pub registry_score: f64,
    pub comparison_score: f64,
    pub provided_score: f64,
    pub forensic_penalty: f64,
    pub final_score: f64,
}

impl ScoreBreakdown {
    pub fn component_sum(&self) -> f64 {
        self.ocr_score + self.registry_score + self.comparison_score + self.provided_score
    }
}

/// Terminal verdict for a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Pass,
    Review,
    Fail,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Decision::Pass => "PASS",
            Decision::Review => "REVIEW",
            Decision::Fail => "FAIL",
        }
    }
}

/// OCR collaborator output: extracted fields plus engine confidence 0-100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrExtraction {
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub raw_confidence: f64,
}

impl OcrExtraction {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|value| !value.trim().is_empty())
    }
}

/// Registry collaborator output (Companies House / VAT authority).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub canonical_name: Option<String>,
    pub canonical_number: Option<String>,
    pub canonical_address: Option<String>,
    #[serde(default)]
    pub found: bool,
}

impl RegistryRecord {
    pub fn not_found() -> Self {
        Self::default()
    }
}

/// Merchant-declared company details; any subset may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MerchantDetails {
    pub declared_name: Option<String>,
    pub declared_number: Option<String>,
    pub declared_address: Option<String>,
}

impl MerchantDetails {
    pub fn is_empty(&self) -> bool {
        self.declared_name.is_none()
            && self.declared_number.is_none()
            && self.declared_address.is_none()
    }
}

/// Everything the core needs for one verification pass, already resolved.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub document_type: DocumentType,
    pub asset: DocumentAsset,
    pub ocr: OcrExtraction,
    pub registry: RegistryRecord,
    pub merchant: MerchantDetails,
}

/// Final immutable record handed to persistence and display layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub document_id: DocumentId,
    pub document_type: DocumentType,
    pub breakdown: ScoreBreakdown,
    pub decision: Decision,
    pub primary_name_similarity: Option<f64>,
    pub comparisons: Vec<FieldComparison>,
    pub forensic: ForensicReport,
    pub completed_at: DateTime<Utc>,
}
