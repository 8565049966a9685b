use serde_json::json;

use super::{CheckContext, ForensicCheck};
use crate::verification::domain::{CheckResult, DocumentAsset};

const BLOCK: usize = 32;
/// Blocks with less texture than this carry no usable noise estimate.
const MIN_TEXTURE_VARIANCE: f64 = 4.0;
/// Coefficient of variation across block noise levels above which the page
/// looks composited from sources with different sensor characteristics.
const SUSPICIOUS_CV: f64 = 0.9;
const MIN_BLOCKS: usize = 8;

/// Sensor-noise consistency: every region of an untouched capture shares
/// one noise fingerprint; spliced regions bring their own.
pub struct NoisePatternCheck;

impl ForensicCheck for NoisePatternCheck {
    fn name(&self) -> &'static str {
        "noise_pattern"
    }

    fn run(&self, asset: &DocumentAsset, ctx: &CheckContext) -> CheckResult {
        let Some(page) = asset.first_page() else {
            return CheckResult::neutral(self.name(), "no decoded pages");
        };

        let luma = page.luma();
        let width = page.width as usize;
        let height = page.height as usize;
        if width < 3 * BLOCK || height < 3 * BLOCK {
            return CheckResult::neutral(self.name(), "page too small for noise grid");
        }

        // High-pass residual: pixel minus its 3x3 neighborhood mean.
        let mut residual = vec![0.0f64; luma.len()];
        for y in 1..height - 1 {
            if ctx.is_cancelled() {
                return CheckResult::neutral(self.name(), "cancelled");
            }
            for x in 1..width - 1 {
                let mut neighborhood = 0u32;
                for dy in 0..3 {
                    for dx in 0..3 {
                        neighborhood += luma[(y + dy - 1) * width + (x + dx - 1)] as u32;
                    }
                }
                let mean = neighborhood as f64 / 9.0;
                residual[y * width + x] = luma[y * width + x] as f64 - mean;
            }
        }

        let mut block_noise = Vec::new();
        for by in (1..height - BLOCK).step_by(BLOCK) {
            for bx in (1..width - BLOCK).step_by(BLOCK) {
                let mut sum = 0.0;
                let mut sum_sq = 0.0;
                let mut texture_sum = 0.0;
                let mut texture_sq = 0.0;
                let n = (BLOCK * BLOCK) as f64;
                for y in by..by + BLOCK {
                    for x in bx..bx + BLOCK {
                        let r = residual[y * width + x];
                        sum += r;
                        sum_sq += r * r;
                        let value = luma[y * width + x] as f64;
                        texture_sum += value;
                        texture_sq += value * value;
                    }
                }
                let texture_variance = texture_sq / n - (texture_sum / n).powi(2);
                if texture_variance < MIN_TEXTURE_VARIANCE {
                    continue;
                }
                let noise = (sum_sq / n - (sum / n).powi(2)).max(0.0).sqrt();
                block_noise.push(noise);
            }
        }

        if block_noise.len() < MIN_BLOCKS {
            return CheckResult::neutral(self.name(), "too few textured blocks");
        }

        let mean = block_noise.iter().sum::<f64>() / block_noise.len() as f64;
        if mean <= f64::EPSILON {
            return CheckResult::neutral(self.name(), "no measurable noise");
        }
        let variance = block_noise
            .iter()
            .map(|noise| (noise - mean).powi(2))
            .sum::<f64>()
            / block_noise.len() as f64;
        let cv = variance.sqrt() / mean;

        let suspicious = cv > SUSPICIOUS_CV;

        CheckResult::new(
            self.name(),
            (100.0 - cv * 50.0).max(0.0),
            suspicious,
            0.65,
            json!({
                "blocks_measured": block_noise.len(),
                "mean_noise": mean,
                "coefficient_of_variation": cv,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::domain::{DocumentId, RasterPage};

    fn noisy_page(width: u32, height: u32, spread: impl Fn(u32, u32) -> u8) -> RasterPage {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        let mut state = 0x9E3779B9u32;
        for y in 0..height {
            for x in 0..width {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let amplitude = spread(x, y) as u32;
                let noise = if amplitude == 0 { 0 } else { state % (2 * amplitude + 1) };
                let value = (120 + noise).saturating_sub(amplitude).min(255) as u8;
                pixels.extend_from_slice(&[value, value, value]);
            }
        }
        RasterPage { width, height, pixels }
    }

    fn asset(page: RasterPage) -> DocumentAsset {
        DocumentAsset::with_pages(DocumentId("noise".into()), "image/png", vec![0u8; 4], vec![page])
    }

    #[test]
    fn uniform_noise_is_consistent() {
        let page = noisy_page(256, 256, |_, _| 12);
        let result = NoisePatternCheck.run(&asset(page), &CheckContext::default());
        assert!(!result.suspicious, "detail: {}", result.detail);
    }

    #[test]
    fn mixed_noise_levels_are_flagged() {
        // Mostly gentle grain with a heavily grained strip: two sources.
        let page = noisy_page(256, 256, |x, _| if x < 192 { 4 } else { 40 });
        let result = NoisePatternCheck.run(&asset(page), &CheckContext::default());
        let cv = result.detail["coefficient_of_variation"]
            .as_f64()
            .expect("cv recorded");
        assert!(result.suspicious, "cv {cv} not flagged");
    }

    #[test]
    fn tiny_page_is_neutral() {
        let page = noisy_page(48, 48, |_, _| 10);
        let result = NoisePatternCheck.run(&asset(page), &CheckContext::default());
        assert_eq!(result.confidence, 0.0);
    }
}
