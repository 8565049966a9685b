use chrono::NaiveDateTime;
use serde_json::json;

use super::{CheckContext, ForensicCheck};
use crate::verification::domain::{CheckResult, DocumentAsset};

/// Raster editors whose fingerprints in embedded metadata are a strong
/// tamper signal on documents that should come straight from a scanner or
/// registry download.
const EDITOR_SIGNATURES: &[&str] = &[
    "adobe photoshop",
    "photoshop",
    "gimp",
    "canva",
    "pixlr",
    "photopea",
    "paint.net",
    "affinity photo",
    "coreldraw",
    "inkscape",
];

/// Online PDF manipulation services; legitimate issuers do not route
/// certificates through them.
const PDF_EDITOR_SIGNATURES: &[&str] = &[
    "ilovepdf",
    "sejda",
    "smallpdf",
    "pdfescape",
    "pdf-xchange editor",
    "foxit phantompdf",
];

const CREATE_KEYS: &[&str] = &["xmp:createdate", "photoshop:datecreated", "createdate"];
const MODIFY_KEYS: &[&str] = &["xmp:modifydate", "modifydate", "metadatadate"];

const ANOMALY_PENALTY: f64 = 25.0;
const MISSING_METADATA_PENALTY: f64 = 10.0;

/// Inspects embedded image metadata (EXIF, XMP, PNG text chunks) for editor
/// software signatures and date-order inversions.
pub struct MetadataCheck;

impl ForensicCheck for MetadataCheck {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn run(&self, asset: &DocumentAsset, _ctx: &CheckContext) -> CheckResult {
        if asset.bytes.is_empty() {
            return CheckResult::neutral(self.name(), "empty asset");
        }
        if asset.is_pdf() {
            return CheckResult::neutral(self.name(), "pdf asset handled by pdf_metadata");
        }

        let haystack = metadata_window(&asset.bytes);
        let mut anomalies = Vec::new();

        for signature in EDITOR_SIGNATURES {
            if find_case_insensitive(haystack, signature) {
                anomalies.push(format!("editor signature '{signature}'"));
            }
        }

        let created = labeled_datetime(haystack, CREATE_KEYS);
        let modified = labeled_datetime(haystack, MODIFY_KEYS);
        if let (Some(created), Some(modified)) = (created, modified) {
            if created > modified {
                anomalies.push(format!(
                    "creation date {created} after modification date {modified}"
                ));
            }
        }

        let missing_exif = asset.is_jpeg() && !find_case_insensitive(haystack, "exif");
        let suspicious = !anomalies.is_empty();
        let mut score = 100.0 - ANOMALY_PENALTY * anomalies.len() as f64;
        if missing_exif {
            score -= MISSING_METADATA_PENALTY;
        }

        CheckResult::new(
            self.name(),
            score,
            suspicious,
            0.8,
            json!({
                "anomalies": anomalies,
                "missing_exif": missing_exif,
                "created": created.map(|d| d.to_string()),
                "modified": modified.map(|d| d.to_string()),
            }),
        )
    }
}

/// PDF information-dictionary scan: authoring tool names and timestamps
/// inconsistent with an issued certificate.
pub struct PdfMetadataCheck;

impl ForensicCheck for PdfMetadataCheck {
    fn name(&self) -> &'static str {
        "pdf_metadata"
    }

    fn run(&self, asset: &DocumentAsset, _ctx: &CheckContext) -> CheckResult {
        if !asset.is_pdf() {
            return CheckResult::neutral(self.name(), "not a pdf");
        }

        let mut anomalies = Vec::new();
        let producer = pdf_string_value(&asset.bytes, "/Producer");
        let creator = pdf_string_value(&asset.bytes, "/Creator");

        for value in [&producer, &creator].into_iter().flatten() {
            let lowered = value.to_ascii_lowercase();
            for signature in EDITOR_SIGNATURES.iter().chain(PDF_EDITOR_SIGNATURES) {
                if lowered.contains(signature) {
                    anomalies.push(format!("authoring tool '{value}'"));
                    break;
                }
            }
        }

        let created = pdf_string_value(&asset.bytes, "/CreationDate").and_then(|v| parse_pdf_date(&v));
        let modified = pdf_string_value(&asset.bytes, "/ModDate").and_then(|v| parse_pdf_date(&v));
        if let (Some(created), Some(modified)) = (created, modified) {
            if modified < created {
                anomalies.push(format!(
                    "modification date {modified} precedes creation date {created}"
                ));
            }
        }

        let suspicious = !anomalies.is_empty();
        let score = 100.0 - ANOMALY_PENALTY * anomalies.len() as f64;

        CheckResult::new(
            self.name(),
            score,
            suspicious,
            0.85,
            json!({
                "anomalies": anomalies,
                "producer": producer,
                "creator": creator,
                "created": created.map(|d| d.to_string()),
                "modified": modified.map(|d| d.to_string()),
            }),
        )
    }
}

/// Metadata lives near the head of every supported container; scanning a
/// bounded window keeps the check O(1) on large uploads.
fn metadata_window(bytes: &[u8]) -> &[u8] {
    const WINDOW: usize = 512 * 1024;
    &bytes[..bytes.len().min(WINDOW)]
}

fn find_case_insensitive(haystack: &[u8], needle: &str) -> bool {
    find_offset(haystack, needle).is_some()
}

fn find_offset(haystack: &[u8], needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Finds a labeled timestamp: any of `keys` followed within a short span by
/// an EXIF (`2021:03:04 10:11:12`) or ISO-8601 datetime.
fn labeled_datetime(haystack: &[u8], keys: &[&str]) -> Option<NaiveDateTime> {
    for key in keys {
        if let Some(offset) = find_offset(haystack, key) {
            let start = offset + key.len();
            let end = (start + 48).min(haystack.len());
            if let Some(parsed) = first_datetime(&haystack[start..end]) {
                return Some(parsed);
            }
        }
    }
    None
}

fn first_datetime(window: &[u8]) -> Option<NaiveDateTime> {
    let text: String = window
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { ' ' })
        .collect();
    for start in 0..text.len().saturating_sub(19) {
        let candidate = &text[start..start + 19];
        for format in ["%Y:%m:%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(candidate, format) {
                return Some(parsed);
            }
        }
    }
    None
}

/// Extracts a literal-string value following an info-dictionary key, e.g.
/// `/Producer (Acrobat Distiller 21.0)`.
fn pdf_string_value(bytes: &[u8], key: &str) -> Option<String> {
    let offset = find_offset(bytes, key)?;
    let tail = &bytes[offset + key.len()..];
    let open = tail.iter().take(16).position(|&b| b == b'(')?;
    let rest = &tail[open + 1..];
    let close = rest.iter().take(256).position(|&b| b == b')')?;
    let value: String = rest[..close]
        .iter()
        .filter(|b| b.is_ascii() && !b.is_ascii_control())
        .map(|&b| b as char)
        .collect();
    let trimmed = value.trim().to_string();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// PDF dates look like `D:20230104093000+00'00'`; the leading `D:` and the
/// timezone suffix are both optional in the wild.
fn parse_pdf_date(value: &str) -> Option<NaiveDateTime> {
    let digits: String = value
        .trim_start_matches("D:")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() < 8 {
        return None;
    }
    let padded = format!("{:0<14}", &digits[..digits.len().min(14)]);
    NaiveDateTime::parse_from_str(&padded, "%Y%m%d%H%M%S").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::domain::DocumentId;

    fn jpeg_asset(extra: &[u8]) -> DocumentAsset {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE1];
        bytes.extend_from_slice(b"Exif\0\0");
        bytes.extend_from_slice(extra);
        DocumentAsset::with_pages(DocumentId("doc-1".into()), "image/jpeg", bytes, Vec::new())
    }

    #[test]
    fn flags_editor_signatures() {
        let asset = jpeg_asset(b"Software\0Adobe Photoshop 24.1");
        let result = MetadataCheck.run(&asset, &CheckContext::default());
        assert!(result.suspicious);
        assert!(result.score < 100.0);
    }

    #[test]
    fn flags_inverted_dates() {
        let asset = jpeg_asset(b"xmp:CreateDate=\"2024-05-10T12:00:00\" xmp:ModifyDate=\"2023-01-01T08:00:00\"");
        let result = MetadataCheck.run(&asset, &CheckContext::default());
        assert!(result.suspicious);
    }

    #[test]
    fn clean_scan_is_not_suspicious() {
        let asset = jpeg_asset(b"Software\0CanonScan 9000F");
        let result = MetadataCheck.run(&asset, &CheckContext::default());
        assert!(!result.suspicious);
    }

    #[test]
    fn empty_asset_is_neutral() {
        let asset =
            DocumentAsset::with_pages(DocumentId("doc-2".into()), "image/jpeg", Vec::new(), Vec::new());
        let result = MetadataCheck.run(&asset, &CheckContext::default());
        assert!(!result.suspicious);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn pdf_check_reads_info_dictionary() {
        let bytes = b"%PDF-1.7\n1 0 obj\n<< /Producer (iLovePDF) /CreationDate (D:20240105120000Z) /ModDate (D:20230101080000Z) >>\nendobj".to_vec();
        let asset = DocumentAsset::with_pages(DocumentId("doc-3".into()), "application/pdf", bytes, Vec::new());
        let result = PdfMetadataCheck.run(&asset, &CheckContext::default());
        assert!(result.suspicious);
        let anomalies = result.detail["anomalies"].as_array().expect("anomaly array");
        assert_eq!(anomalies.len(), 2);
    }

    #[test]
    fn pdf_check_skips_images() {
        let asset = jpeg_asset(b"");
        let result = PdfMetadataCheck.run(&asset, &CheckContext::default());
        assert_eq!(result.confidence, 0.0);
    }
}
