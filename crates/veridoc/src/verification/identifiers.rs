/// Identifier kinds with registry-specific canonical forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    CompanyNumber,
    VatNumber,
}

/// Canonicalize a raw identifier, or `None` when it cannot form a valid one.
///
/// Normalization is idempotent for every kind: feeding a canonical value
/// back in returns it unchanged.
pub fn normalize(raw: &str, kind: IdentifierKind) -> Option<String> {
    match kind {
        IdentifierKind::CompanyNumber => normalize_company_number(raw),
        IdentifierKind::VatNumber => normalize_vat_number(raw),
    }
}

/// UK company numbers: 8 digits, or two letters followed by six digits
/// (Scottish and Northern Irish prefixes). Shorter all-digit forms are
/// zero-padded; unrecognized shapes pass through uppercased.
pub fn normalize_company_number(raw: &str) -> Option<String> {
    let stripped = strip_separators(raw);
    if stripped.is_empty() {
        return None;
    }

    if stripped.chars().all(|c| c.is_ascii_digit()) {
        let padded = match stripped.len() {
            6 => format!("00{stripped}"),
            7 => format!("0{stripped}"),
            _ => stripped,
        };
        return Some(padded);
    }

    Some(stripped)
}

/// UK VAT numbers: `GB` plus nine digits. Rejects any other digit count.
pub fn normalize_vat_number(raw: &str) -> Option<String> {
    let stripped = strip_separators(raw);
    if stripped.is_empty() {
        return None;
    }

    let digits = stripped.strip_prefix("GB").unwrap_or(&stripped);
    if digits.len() == 9 && digits.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("GB{digits}"));
    }

    None
}

fn strip_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '.')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_company_numbers() {
        assert_eq!(normalize_company_number("640918").as_deref(), Some("00640918"));
        assert_eq!(normalize_company_number("3035678").as_deref(), Some("03035678"));
        assert_eq!(normalize_company_number("01234567").as_deref(), Some("01234567"));
    }

    #[test]
    fn keeps_prefixed_company_numbers() {
        assert_eq!(normalize_company_number("SC555555").as_deref(), Some("SC555555"));
        assert_eq!(normalize_company_number("sc 555555").as_deref(), Some("SC555555"));
        assert_eq!(normalize_company_number("NI-123456").as_deref(), Some("NI123456"));
    }

    #[test]
    fn passes_odd_shapes_through_uppercased() {
        assert_eq!(normalize_company_number("oc301540x").as_deref(), Some("OC301540X"));
        assert_eq!(normalize_company_number("12345").as_deref(), Some("12345"));
    }

    #[test]
    fn prefixes_bare_vat_digits() {
        assert_eq!(normalize_vat_number("123456789").as_deref(), Some("GB123456789"));
        assert_eq!(normalize_vat_number("GB 123 4567 89").as_deref(), Some("GB123456789"));
    }

    #[test]
    fn rejects_wrong_vat_digit_counts() {
        assert_eq!(normalize_vat_number("12345678"), None);
        assert_eq!(normalize_vat_number("GB1234567890"), None);
        assert_eq!(normalize_vat_number(""), None);
        assert_eq!(normalize_vat_number("FR123456789"), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["640918", "SC555555", "01234567", "weird-Value"] {
            let once = normalize(raw, IdentifierKind::CompanyNumber).expect("normalizes");
            let twice = normalize(&once, IdentifierKind::CompanyNumber).expect("normalizes");
            assert_eq!(once, twice);
        }

        let once = normalize("123456789", IdentifierKind::VatNumber).expect("normalizes");
        let twice = normalize(&once, IdentifierKind::VatNumber).expect("normalizes");
        assert_eq!(once, twice);
    }
}
