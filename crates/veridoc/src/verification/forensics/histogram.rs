use serde_json::json;

use super::{CheckContext, ForensicCheck};
use crate::verification::domain::{CheckResult, DocumentAsset, RasterPage};

/// A bin holding more than this multiple of the uniform share is a spike.
const SPIKE_FACTOR: f64 = 12.0;
const SPIKE_FACTOR_SCAN: f64 = 24.0;
/// Share of empty interior bins that reads as posterization.
const GAP_RATIO: f64 = 0.40;
/// Paper-white and ink-black tails ignored on scanned documents.
const SCAN_TAIL: usize = 8;
const SUSPICIOUS_ANOMALY_COUNT: usize = 2;
const SUSPICIOUS_ANOMALY_COUNT_SCAN: usize = 3;

/// Histogram-shape analysis in RGB and HSV: hard spikes suggest pasted-in
/// flat fills, interior gaps suggest posterization from repeated saves.
pub struct ColorHistogramCheck;

impl ForensicCheck for ColorHistogramCheck {
    fn name(&self) -> &'static str {
        "color_histogram"
    }

    fn run(&self, asset: &DocumentAsset, ctx: &CheckContext) -> CheckResult {
        let Some(page) = asset.first_page() else {
            return CheckResult::neutral(self.name(), "no decoded pages");
        };
        if page.pixels.is_empty() {
            return CheckResult::neutral(self.name(), "empty page");
        }

        let is_scan = ctx.capture_class.is_scan();
        let spike_factor = if is_scan { SPIKE_FACTOR_SCAN } else { SPIKE_FACTOR };
        let tail = if is_scan { SCAN_TAIL } else { 0 };

        let mut anomalies = Vec::new();
        for (label, histogram) in rgb_histograms(page) {
            inspect_channel(label, &histogram, spike_factor, tail, &mut anomalies);
        }

        // Hue and saturation are meaningless on a grayscale scan.
        if !is_scan {
            for (label, histogram) in hue_saturation_histograms(page) {
                inspect_channel(label, &histogram, spike_factor, 0, &mut anomalies);
            }
        }

        let threshold = if is_scan {
            SUSPICIOUS_ANOMALY_COUNT_SCAN
        } else {
            SUSPICIOUS_ANOMALY_COUNT
        };
        let suspicious = anomalies.len() >= threshold;
        let score = 100.0 - 15.0 * anomalies.len() as f64;

        CheckResult::new(
            self.name(),
            score,
            suspicious,
            0.7,
            json!({
                "anomalies": anomalies,
                "capture_class": ctx.capture_class,
                "channels_checked": if is_scan { 3 } else { 5 },
            }),
        )
    }
}

fn inspect_channel(
    label: &str,
    histogram: &[u64; 256],
    spike_factor: f64,
    tail: usize,
    anomalies: &mut Vec<String>,
) {
    let full_total: u64 = histogram.iter().sum();
    let interior = &histogram[tail..256 - tail];
    let total: u64 = interior.iter().sum();
    if total == 0 {
        return;
    }
    // On a scan nearly all mass sits in the paper/ink tails; judging the
    // sparse remainder would flag every clean page.
    if tail > 0 && (total as f64) < 0.05 * full_total as f64 {
        return;
    }

    let uniform_share = total as f64 / interior.len() as f64;
    let spikes = interior
        .iter()
        .filter(|&&count| count as f64 > uniform_share * spike_factor)
        .count();
    if spikes > 0 {
        anomalies.push(format!("{label}: {spikes} spike bin(s)"));
    }

    // Gaps only count between the first and last populated bins, so a
    // naturally narrow exposure range is not penalized.
    let first = interior.iter().position(|&count| count > 0);
    let last = interior.iter().rposition(|&count| count > 0);
    if let (Some(first), Some(last)) = (first, last) {
        let span = &interior[first..=last];
        if span.len() >= 32 {
            let empty = span.iter().filter(|&&count| count == 0).count();
            let ratio = empty as f64 / span.len() as f64;
            if ratio > GAP_RATIO {
                anomalies.push(format!("{label}: {:.0}% interior gap", ratio * 100.0));
            }
        }
    }
}

fn rgb_histograms(page: &RasterPage) -> [(&'static str, [u64; 256]); 3] {
    let mut red = [0u64; 256];
    let mut green = [0u64; 256];
    let mut blue = [0u64; 256];
    for px in page.pixels.chunks_exact(3) {
        red[px[0] as usize] += 1;
        green[px[1] as usize] += 1;
        blue[px[2] as usize] += 1;
    }
    [("red", red), ("green", green), ("blue", blue)]
}

fn hue_saturation_histograms(page: &RasterPage) -> [(&'static str, [u64; 256]); 2] {
    let mut hue = [0u64; 256];
    let mut saturation = [0u64; 256];
    for px in page.pixels.chunks_exact(3) {
        let (h, s) = hue_saturation(px[0], px[1], px[2]);
        hue[h as usize] += 1;
        saturation[s as usize] += 1;
    }
    [("hue", hue), ("saturation", saturation)]
}

/// Hue and saturation scaled to [0,255]; hue of achromatic pixels is 0.
fn hue_saturation(r: u8, g: u8, b: u8) -> (u8, u8) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max <= f64::EPSILON { 0.0 } else { delta / max };

    let hue = if delta <= f64::EPSILON {
        0.0
    } else if (max - r).abs() <= f64::EPSILON {
        (((g - b) / delta).rem_euclid(6.0)) / 6.0
    } else if (max - g).abs() <= f64::EPSILON {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };

    ((hue * 255.0) as u8, (saturation * 255.0) as u8)
}
