use serde_json::json;

use super::{CheckContext, ForensicCheck};
use crate::verification::domain::{CheckResult, DocumentAsset, RasterPage};

const ELA_QUALITY: u8 = 90;
const ELA_SUSPICION_THRESHOLD: f64 = 50.0;
const LOW_QUALITY_THRESHOLD: f64 = 30.0;

/// Error Level Analysis: locally re-saved regions compress differently, so
/// a fixed-quality re-encode diffs loudly against a tampered original.
pub struct ErrorLevelCheck;

impl ForensicCheck for ErrorLevelCheck {
    fn name(&self) -> &'static str {
        "error_level_analysis"
    }

    fn run(&self, asset: &DocumentAsset, _ctx: &CheckContext) -> CheckResult {
        let Some(page) = asset.first_page() else {
            return CheckResult::neutral(self.name(), "no decoded pages");
        };

        let Some(mean_difference) = ela_mean_difference(page) else {
            return CheckResult::neutral(self.name(), "re-encode failed");
        };

        let suspicion = (mean_difference * 10.0).min(100.0);
        let suspicious = suspicion > ELA_SUSPICION_THRESHOLD;

        CheckResult::new(
            self.name(),
            100.0 - suspicion,
            suspicious,
            0.9,
            json!({
                "mean_difference": mean_difference,
                "suspicion": suspicion,
                "re_encode_quality": ELA_QUALITY,
            }),
        )
    }
}

fn ela_mean_difference(page: &RasterPage) -> Option<f64> {
    let original = page.luma();
    if original.is_empty() {
        return None;
    }

    let mut encoded = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut encoded, ELA_QUALITY);
    encoder
        .encode(&original, page.width, page.height, image::ColorType::L8)
        .ok()?;

    let reloaded = image::load_from_memory_with_format(&encoded, image::ImageFormat::Jpeg)
        .ok()?
        .to_luma8();
    let reloaded = reloaded.as_raw();
    if reloaded.len() != original.len() {
        return None;
    }

    let total: u64 = original
        .iter()
        .zip(reloaded)
        .map(|(&a, &b)| (a as i16 - b as i16).unsigned_abs() as u64)
        .sum();
    Some(total as f64 / original.len() as f64)
}

/// Estimates the JPEG quality the asset was last saved at. A certificate
/// claimed to be an original download that arrives heavily re-compressed
/// has been through an editing round-trip.
pub struct JpegQualityCheck;

impl ForensicCheck for JpegQualityCheck {
    fn name(&self) -> &'static str {
        "jpeg_quality"
    }

    fn run(&self, asset: &DocumentAsset, _ctx: &CheckContext) -> CheckResult {
        let (quality, method, confidence) = if asset.is_jpeg() {
            match estimate_quality_from_quant_tables(&asset.bytes) {
                Some(quality) => (quality, "quantization_tables", 0.85),
                None => match asset.first_page().map(block_variance_quality) {
                    Some(quality) => (quality, "block_variance", 0.6),
                    None => return CheckResult::neutral(self.name(), "no quantization tables or pages"),
                },
            }
        } else {
            match asset.first_page().map(block_variance_quality) {
                Some(quality) => (quality, "block_variance", 0.6),
                None => return CheckResult::neutral(self.name(), "no decoded pages"),
            }
        };

        let suspicious = quality < LOW_QUALITY_THRESHOLD;

        CheckResult::new(
            self.name(),
            quality,
            suspicious,
            confidence,
            json!({
                "estimated_quality": quality,
                "method": method,
            }),
        )
    }
}

/// Standard luminance quantization table from the JPEG specification,
/// natural (row-major) order.
#[rustfmt::skip]
const STANDARD_LUMINANCE_TABLE: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// Zigzag scan order: position in the DQT stream -> natural index.
#[rustfmt::skip]
const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10,
    17, 24, 32, 25, 18, 11, 4, 5,
    12, 19, 26, 33, 40, 48, 41, 34,
    27, 20, 13, 6, 7, 14, 21, 28,
    35, 42, 49, 56, 57, 50, 43, 36,
    29, 22, 15, 23, 30, 37, 44, 51,
    58, 59, 52, 45, 38, 31, 39, 46,
    53, 60, 61, 54, 47, 55, 62, 63,
];

/// Walks JPEG markers for the first 8-bit luminance DQT segment and inverts
/// the libjpeg scaling formula to recover the save quality.
fn estimate_quality_from_quant_tables(bytes: &[u8]) -> Option<f64> {
    let table = first_luminance_table(bytes)?;

    let ratio: f64 = table
        .iter()
        .zip(STANDARD_LUMINANCE_TABLE.iter())
        .map(|(&value, &reference)| value as f64 / reference as f64)
        .sum::<f64>()
        / 64.0;

    let quality = if ratio <= 1.0 {
        100.0 - 50.0 * ratio
    } else {
        50.0 / ratio
    };
    Some(quality.clamp(1.0, 100.0))
}

fn first_luminance_table(bytes: &[u8]) -> Option<[u16; 64]> {
    let mut cursor = 2usize;
    while cursor + 4 <= bytes.len() {
        if bytes[cursor] != 0xFF {
            cursor += 1;
            continue;
        }
        let marker = bytes[cursor + 1];
        // Standalone markers carry no length word.
        if (0xD0..=0xD9).contains(&marker) || marker == 0x01 || marker == 0xFF {
            cursor += 2;
            continue;
        }
        let length = u16::from_be_bytes([bytes[cursor + 2], bytes[cursor + 3]]) as usize;
        if length < 2 || cursor + 2 + length > bytes.len() {
            return None;
        }
        if marker == 0xDB {
            let mut payload = &bytes[cursor + 4..cursor + 2 + length];
            while !payload.is_empty() {
                let descriptor = payload[0];
                let precision = descriptor >> 4;
                let id = descriptor & 0x0F;
                let entry_size = if precision == 0 { 1 } else { 2 };
                let table_len = 1 + 64 * entry_size;
                if payload.len() < table_len {
                    break;
                }
                if id == 0 && precision == 0 {
                    let mut table = [0u16; 64];
                    for (stream_index, &value) in payload[1..65].iter().enumerate() {
                        table[ZIGZAG[stream_index]] = value as u16;
                    }
                    return Some(table);
                }
                payload = &payload[table_len..];
            }
        }
        if marker == 0xDA {
            // Entropy-coded data follows; tables precede the scan.
            return None;
        }
        cursor += 2 + length;
    }
    None
}

/// Re-compression proxy for non-JPEG sources: repeated saves flatten 8x8
/// blocks, so low mean block variance reads as low effective quality.
fn block_variance_quality(page: &RasterPage) -> f64 {
    const BLOCK: usize = 8;
    let luma = page.luma();
    let width = page.width as usize;
    let height = page.height as usize;
    if width < BLOCK || height < BLOCK {
        return 100.0;
    }

    let mut variances = Vec::new();
    for by in (0..height - BLOCK).step_by(BLOCK) {
        for bx in (0..width - BLOCK).step_by(BLOCK) {
            let mut sum = 0.0f64;
            let mut sum_sq = 0.0f64;
            for y in by..by + BLOCK {
                for x in bx..bx + BLOCK {
                    let value = luma[y * width + x] as f64;
                    sum += value;
                    sum_sq += value * value;
                }
            }
            let n = (BLOCK * BLOCK) as f64;
            let mean = sum / n;
            variances.push(sum_sq / n - mean * mean);
        }
    }

    if variances.is_empty() {
        return 100.0;
    }
    let average = variances.iter().sum::<f64>() / variances.len() as f64;
    average.min(100.0)
}
