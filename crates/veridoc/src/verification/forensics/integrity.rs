use img_hash::{HashAlg, HasherConfig};
use serde_json::json;
use sha2::{Digest, Sha256};

use super::{CheckContext, ForensicCheck};
use crate::verification::domain::{CheckResult, DocumentAsset};

/// Content fingerprints for audit trails and duplicate-submission lookup:
/// a cryptographic digest of the raw bytes plus a perceptual hash that
/// survives benign re-encoding. Never contributes to suspicion.
pub struct IntegrityCheck;

impl ForensicCheck for IntegrityCheck {
    fn name(&self) -> &'static str {
        "integrity"
    }

    fn run(&self, asset: &DocumentAsset, _ctx: &CheckContext) -> CheckResult {
        if asset.bytes.is_empty() {
            return CheckResult::neutral(self.name(), "empty asset");
        }

        let mut hasher = Sha256::new();
        hasher.update(&asset.bytes);
        let sha256 = hex::encode(hasher.finalize());

        let perceptual = asset.first_page().and_then(|page| {
            let gray = page.to_gray_image()?;
            let hasher = HasherConfig::new()
                .hash_alg(HashAlg::Gradient)
                .hash_size(8, 8)
                .to_hasher();
            Some(hasher.hash_image(&gray).to_base64())
        });

        CheckResult::new(
            self.name(),
            100.0,
            false,
            1.0,
            json!({
                "sha256": sha256,
                "perceptual_hash": perceptual,
                "byte_length": asset.bytes.len(),
            }),
        )
    }
}
