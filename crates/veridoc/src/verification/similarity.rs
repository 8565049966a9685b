use super::domain::StrictnessProfile;

const STRICT_FULL: f64 = 0.98;
const STRICT_KNEE: f64 = 0.90;
const LENIENT_FULL: f64 = 0.5;
const LENIENT_KNEE: f64 = 0.3;
const LENIENT_KNEE_FACTOR: f64 = 0.25;

/// Bounded [0,1] similarity between two free-text values.
///
/// Longest-common-subsequence ratio over canonical text: uppercased,
/// whitespace collapsed, punctuation dropped. Punctuation is dropped so
/// registry styling ("E. & C." versus "E & C") does not read as a mismatch.
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = canonical(a);
    let right = canonical(b);

    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    if left == right {
        return 1.0;
    }

    let lcs = lcs_length(&left, &right);
    (2.0 * lcs as f64) / ((left.len() + right.len()) as f64)
}

/// Fraction of a field's weight granted for a similarity value.
///
/// Monotone non-decreasing in similarity for every profile, and the lenient
/// curve never grants less than the strict curve takes away.
pub fn weight_factor(similarity: f64, profile: StrictnessProfile) -> f64 {
    let sim = similarity.clamp(0.0, 1.0);
    match profile {
        StrictnessProfile::Exact => sim,
        StrictnessProfile::Strict => strict_factor(sim),
        StrictnessProfile::Lenient => lenient_factor(sim),
    }
}

/// Legal names: full weight only at near-perfect similarity, a steep ramp
/// just below it, nothing under the knee. The raw source curve rebounds
/// below the knee; it is clamped to the knee floor so the factor stays
/// monotone, and the name-floor overrides govern that band instead.
fn strict_factor(sim: f64) -> f64 {
    if sim >= STRICT_FULL {
        1.0
    } else if sim >= STRICT_KNEE {
        (sim - STRICT_KNEE) / (STRICT_FULL - STRICT_KNEE)
    } else {
        0.0
    }
}

/// Addresses drift legitimately (relocations, formatting, abbreviations), so
/// the curve forgives everything above 0.5 and fades gently below it.
fn lenient_factor(sim: f64) -> f64 {
    if sim >= LENIENT_FULL {
        1.0
    } else if sim >= LENIENT_KNEE {
        LENIENT_KNEE_FACTOR + (1.0 - LENIENT_KNEE_FACTOR) * (sim - LENIENT_KNEE) / (LENIENT_FULL - LENIENT_KNEE)
    } else {
        LENIENT_KNEE_FACTOR * sim / LENIENT_KNEE
    }
}

fn canonical(value: &str) -> Vec<char> {
    value
        .split_whitespace()
        .flat_map(|word| word.chars().chain(std::iter::once(' ')))
        .filter(|c| c.is_alphanumeric() || *c == '&' || *c == ' ')
        .map(|c| c.to_ascii_uppercase())
        .collect::<String>()
        .trim()
        .chars()
        .collect()
}

fn lcs_length(a: &[char], b: &[char]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; short.len() + 1];

    for &lc in long {
        let mut diagonal = 0usize;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    row[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_is_reflexive_and_symmetric() {
        let pairs = [
            ("ACME TRADING LIMITED", "ACME TRAIDNG LIMITED"),
            ("12 High Street, Leeds", "12 High St Leeds"),
            ("", "Something"),
        ];
        for (a, b) in pairs {
            assert!((similarity(a, a) - 1.0).abs() < f64::EPSILON);
            assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-12);
        }
    }

    #[test]
    fn punctuation_and_case_do_not_dent_names() {
        let sim = similarity("E & C HOLDEN LIMITED", "E. & C. Holden Limited");
        assert!(sim >= 0.98, "expected near-perfect similarity, got {sim}");
    }

    #[test]
    fn distinct_names_score_low() {
        let sim = similarity("E & C HOLDEN LIMITED", "NORTHWIND FABRICATION PLC");
        assert!(sim < 0.55, "unexpectedly high similarity {sim}");
    }

    #[test]
    fn strict_curve_grants_full_weight_at_near_perfect() {
        assert!((weight_factor(0.99, StrictnessProfile::Strict) - 1.0).abs() < f64::EPSILON);
        assert!((weight_factor(0.98, StrictnessProfile::Strict) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strict_curve_ramps_between_knee_and_full() {
        let mid = weight_factor(0.94, StrictnessProfile::Strict);
        assert!((mid - 0.5).abs() < 1e-9);
        assert_eq!(weight_factor(0.89, StrictnessProfile::Strict), 0.0);
    }

    #[test]
    fn curves_are_monotone_and_lenient_dominates_strict() {
        let mut previous_strict = 0.0;
        let mut previous_lenient = 0.0;
        for step in 0..=1000 {
            let sim = step as f64 / 1000.0;
            let strict = weight_factor(sim, StrictnessProfile::Strict);
            let lenient = weight_factor(sim, StrictnessProfile::Lenient);
            assert!(strict + 1e-12 >= previous_strict, "strict dips at {sim}");
            assert!(lenient + 1e-12 >= previous_lenient, "lenient dips at {sim}");
            assert!(lenient + 1e-12 >= strict, "lenient below strict at {sim}");
            previous_strict = strict;
            previous_lenient = lenient;
        }
    }

    #[test]
    fn lenient_curve_forgives_address_drift() {
        assert!((weight_factor(0.8, StrictnessProfile::Lenient) - 1.0).abs() < f64::EPSILON);
        let graded = weight_factor(0.4, StrictnessProfile::Lenient);
        assert!(graded > 0.25 && graded < 1.0);
        assert!(weight_factor(0.1, StrictnessProfile::Lenient) < 0.1);
    }
}
