use image::imageops::FilterType;
use image::GrayImage;
use img_hash::{HashAlg, HasherConfig, ImageHash};
use serde_json::json;

use super::{CheckContext, ForensicCheck};
use crate::verification::domain::{CaptureClass, CheckResult, DocumentAsset};

const MAX_DIMENSION: u32 = 1024;
const BLOCK: u32 = 16;
const MAX_SAMPLED_BLOCKS: usize = 512;
/// Textureless paper background; duplicate matches there mean nothing.
const MIN_BLOCK_VARIANCE: f64 = 40.0;
/// Hamming distance budget for two 64-bit gradient hashes to count as twins.
const MAX_HASH_DISTANCE: u32 = 5;
/// Minimum duplicate-pair share (percent) before the match is reported.
const PHOTO_THRESHOLD: f64 = 5.0;
const SCAN_THRESHOLD: f64 = 12.0;

/// Copy-move forgery detection by perceptual block matching: a duplicated
/// region produces non-adjacent block pairs with near-identical hashes.
pub struct CopyMoveCheck;

impl ForensicCheck for CopyMoveCheck {
    fn name(&self) -> &'static str {
        "copy_move"
    }

    fn run(&self, asset: &DocumentAsset, ctx: &CheckContext) -> CheckResult {
        let Some(page) = asset.first_page() else {
            return CheckResult::neutral(self.name(), "no decoded pages");
        };
        let Some(gray) = page.to_gray_image() else {
            return CheckResult::neutral(self.name(), "page buffer mismatch");
        };

        let gray = bound_dimensions(gray);
        let blocks = match sample_blocks(&gray, ctx) {
            Some(blocks) => blocks,
            None => return CheckResult::neutral(self.name(), "cancelled"),
        };

        if blocks.len() < 4 {
            return CheckResult::neutral(self.name(), "too little texture to compare");
        }

        let hasher = HasherConfig::new()
            .hash_alg(HashAlg::Gradient)
            .hash_size(8, 8)
            .to_hasher();
        let hashes: Vec<(u32, u32, ImageHash)> = blocks
            .iter()
            .map(|(bx, by, block)| (*bx, *by, hasher.hash_image(block)))
            .collect();

        let mut similar_pairs = 0usize;
        let mut total_pairs = 0usize;
        for (i, (x1, y1, hash1)) in hashes.iter().enumerate() {
            if ctx.is_cancelled() {
                return CheckResult::neutral(self.name(), "cancelled");
            }
            for (x2, y2, hash2) in hashes.iter().skip(i + 1) {
                // Adjacent near-identical blocks are normal on flat paper.
                if x1.abs_diff(*x2) < 2 && y1.abs_diff(*y2) < 2 {
                    continue;
                }
                total_pairs += 1;
                if hash1.dist(hash2) <= MAX_HASH_DISTANCE {
                    similar_pairs += 1;
                }
            }
        }

        if total_pairs == 0 {
            return CheckResult::neutral(self.name(), "no comparable block pairs");
        }

        let match_percentage = similar_pairs as f64 / total_pairs as f64 * 100.0;
        let threshold = if ctx.capture_class.is_scan() {
            SCAN_THRESHOLD
        } else {
            PHOTO_THRESHOLD
        };
        let detected = match_percentage > threshold;

        CheckResult::new(
            self.name(),
            (100.0 - match_percentage * 2.0).max(0.0),
            detected,
            (match_percentage / 100.0).clamp(0.0, 1.0),
            json!({
                "match_percentage": match_percentage,
                "similar_pairs": similar_pairs,
                "total_pairs": total_pairs,
                "sampled_blocks": blocks.len(),
                "threshold": threshold,
                "capture_class": ctx.capture_class,
            }),
        )
    }
}

/// Graduated penalty contribution for a confirmed match, scaled by the
/// duplicate share and relaxed for scanner output.
pub(crate) fn penalty_contribution(match_percentage: f64, capture_class: CaptureClass) -> f64 {
    let scaled = 1.5 + 5.5 * (match_percentage / 70.0).min(1.0);
    if capture_class.is_scan() {
        scaled * 0.75
    } else {
        scaled
    }
}

fn bound_dimensions(gray: GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    let largest = width.max(height);
    if largest <= MAX_DIMENSION {
        return gray;
    }
    let scale = MAX_DIMENSION as f64 / largest as f64;
    let new_width = ((width as f64 * scale) as u32).max(BLOCK);
    let new_height = ((height as f64 * scale) as u32).max(BLOCK);
    image::imageops::resize(&gray, new_width, new_height, FilterType::Triangle)
}

/// Cuts the page into 16x16 blocks, drops near-flat ones, and caps the
/// sample so the pairwise pass stays bounded on poster-sized uploads.
fn sample_blocks(gray: &GrayImage, ctx: &CheckContext) -> Option<Vec<(u32, u32, GrayImage)>> {
    let (width, height) = gray.dimensions();
    let columns = width / BLOCK;
    let rows = height / BLOCK;

    let mut blocks = Vec::new();
    for by in 0..rows {
        if ctx.is_cancelled() {
            return None;
        }
        for bx in 0..columns {
            let block = image::imageops::crop_imm(gray, bx * BLOCK, by * BLOCK, BLOCK, BLOCK).to_image();
            if block_variance(&block) >= MIN_BLOCK_VARIANCE {
                blocks.push((bx, by, block));
            }
        }
    }

    if blocks.len() > MAX_SAMPLED_BLOCKS {
        let step = blocks.len().div_ceil(MAX_SAMPLED_BLOCKS);
        blocks = blocks.into_iter().step_by(step).collect();
    }

    Some(blocks)
}

fn block_variance(block: &GrayImage) -> f64 {
    let n = (block.width() * block.height()) as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for pixel in block.pixels() {
        let value = pixel.0[0] as f64;
        sum += value;
        sum_sq += value * value;
    }
    let mean = sum / n;
    sum_sq / n - mean * mean
}
