use image::imageops::FilterType;
use image::GrayImage;
use serde_json::json;

use super::{CheckContext, ForensicCheck};
use crate::verification::domain::{CheckResult, DocumentAsset};

const GRID: u32 = 4;
const REGION_SIZE: u32 = 32;
/// Coefficients with u+v at or above this index count as high frequency.
const HIGH_FREQUENCY_CUTOFF: usize = 24;
/// A region this far below the median is treated as locally upscaled.
const ENERGY_RATIO_FLOOR: f64 = 0.25;
/// Blank paper has no high-frequency content to judge.
const MIN_REGION_VARIANCE: f64 = 25.0;
const SUSPICIOUS_REGION_COUNT: usize = 2;

/// Localized upscaling detector: pasted-in regions sourced from a lower
/// resolution lose high-frequency energy relative to the rest of the page.
pub struct ResolutionConsistencyCheck;

impl ForensicCheck for ResolutionConsistencyCheck {
    fn name(&self) -> &'static str {
        "resolution_consistency"
    }

    fn run(&self, asset: &DocumentAsset, ctx: &CheckContext) -> CheckResult {
        let Some(page) = asset.first_page() else {
            return CheckResult::neutral(self.name(), "no decoded pages");
        };
        let Some(gray) = page.to_gray_image() else {
            return CheckResult::neutral(self.name(), "page buffer mismatch");
        };

        let (width, height) = gray.dimensions();
        if width < GRID * REGION_SIZE || height < GRID * REGION_SIZE {
            return CheckResult::neutral(self.name(), "page too small for region grid");
        }

        let region_width = width / GRID;
        let region_height = height / GRID;
        let mut energies = Vec::new();
        for gy in 0..GRID {
            if ctx.is_cancelled() {
                return CheckResult::neutral(self.name(), "cancelled");
            }
            for gx in 0..GRID {
                let region =
                    image::imageops::crop_imm(&gray, gx * region_width, gy * region_height, region_width, region_height)
                        .to_image();
                let region = image::imageops::resize(&region, REGION_SIZE, REGION_SIZE, FilterType::Triangle);
                if region_variance(&region) < MIN_REGION_VARIANCE {
                    continue;
                }
                energies.push(((gx, gy), high_frequency_energy(&region)));
            }
        }

        if energies.len() < 4 {
            return CheckResult::neutral(self.name(), "too few textured regions");
        }

        let mut sorted: Vec<f64> = energies.iter().map(|(_, energy)| *energy).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = sorted[sorted.len() / 2];
        if median <= f64::EPSILON {
            return CheckResult::neutral(self.name(), "no high-frequency content");
        }

        let flagged: Vec<_> = energies
            .iter()
            .filter(|(_, energy)| energy / median < ENERGY_RATIO_FLOOR)
            .map(|((gx, gy), energy)| json!({ "region": [gx, gy], "ratio": energy / median }))
            .collect();

        let suspicious = flagged.len() >= SUSPICIOUS_REGION_COUNT;
        let score = 100.0 - 20.0 * flagged.len() as f64;

        CheckResult::new(
            self.name(),
            score,
            suspicious,
            0.7,
            json!({
                "regions_compared": energies.len(),
                "median_energy": median,
                "flagged_regions": flagged,
            }),
        )
    }
}

fn region_variance(region: &GrayImage) -> f64 {
    let n = (region.width() * region.height()) as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for pixel in region.pixels() {
        let value = pixel.0[0] as f64;
        sum += value;
        sum_sq += value * value;
    }
    let mean = sum / n;
    sum_sq / n - mean * mean
}

/// Sum of absolute DCT coefficients in the high-frequency corner.
fn high_frequency_energy(region: &GrayImage) -> f64 {
    let size = REGION_SIZE as usize;
    let mut samples = vec![0.0f64; size * size];
    for (x, y, pixel) in region.enumerate_pixels() {
        samples[y as usize * size + x as usize] = pixel.0[0] as f64 - 128.0;
    }

    let coefficients = dct_2d(&samples, size);
    let mut energy = 0.0;
    for v in 0..size {
        for u in 0..size {
            if u + v >= HIGH_FREQUENCY_CUTOFF {
                energy += coefficients[v * size + u].abs();
            }
        }
    }
    energy
}

/// Separable DCT-II over a square tile: rows first, then columns.
fn dct_2d(samples: &[f64], size: usize) -> Vec<f64> {
    let mut rows = vec![0.0f64; size * size];
    for y in 0..size {
        let row = &samples[y * size..(y + 1) * size];
        let transformed = dct_1d(row);
        rows[y * size..(y + 1) * size].copy_from_slice(&transformed);
    }

    let mut output = vec![0.0f64; size * size];
    let mut column = vec![0.0f64; size];
    for x in 0..size {
        for y in 0..size {
            column[y] = rows[y * size + x];
        }
        let transformed = dct_1d(&column);
        for y in 0..size {
            output[y * size + x] = transformed[y];
        }
    }
    output
}

fn dct_1d(input: &[f64]) -> Vec<f64> {
    let n = input.len();
    let mut output = vec![0.0f64; n];
    for (k, slot) in output.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (i, &sample) in input.iter().enumerate() {
            acc += sample * ((std::f64::consts::PI / n as f64) * (i as f64 + 0.5) * k as f64).cos();
        }
        *slot = acc;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::domain::{DocumentId, RasterPage};

    fn textured_page(width: u32, height: u32) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                // Checker texture that survives the 2:1 region downsample.
                let value = if (x / 2 + y / 2) % 2 == 0 { 30 } else { 220 };
                pixels.extend_from_slice(&[value, value, value]);
            }
        }
        pixels
    }

    fn smooth_quadrant(pixels: &mut [u8], width: u32, x0: u32, y0: u32, span: u32) {
        for y in y0..y0 + span {
            for x in x0..x0 + span {
                let offset = ((y * width + x) * 3) as usize;
                let value = 90 + ((x / 24 + y / 24) % 3) as u8 * 20;
                pixels[offset] = value;
                pixels[offset + 1] = value;
                pixels[offset + 2] = value;
            }
        }
    }

    #[test]
    fn uniform_texture_passes() {
        let page = RasterPage {
            width: 256,
            height: 256,
            pixels: textured_page(256, 256),
        };
        let asset =
            DocumentAsset::with_pages(DocumentId("freq-1".into()), "image/png", vec![0u8; 4], vec![page]);
        let result = ResolutionConsistencyCheck.run(&asset, &CheckContext::default());
        assert!(!result.suspicious);
    }

    #[test]
    fn flags_smoothed_quadrant() {
        let mut pixels = textured_page(256, 256);
        // A low-detail corner spanning four grid regions.
        smooth_quadrant(&mut pixels, 256, 0, 0, 128);
        let page = RasterPage {
            width: 256,
            height: 256,
            pixels,
        };
        let asset =
            DocumentAsset::with_pages(DocumentId("freq-2".into()), "image/png", vec![0u8; 4], vec![page]);
        let result = ResolutionConsistencyCheck.run(&asset, &CheckContext::default());
        assert!(result.suspicious, "detail: {}", result.detail);
    }

    #[test]
    fn small_page_is_neutral() {
        let page = RasterPage {
            width: 64,
            height: 64,
            pixels: textured_page(64, 64),
        };
        let asset =
            DocumentAsset::with_pages(DocumentId("freq-3".into()), "image/png", vec![0u8; 4], vec![page]);
        let result = ResolutionConsistencyCheck.run(&asset, &CheckContext::default());
        assert_eq!(result.confidence, 0.0);
    }
}
