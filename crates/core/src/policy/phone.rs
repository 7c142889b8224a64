//! Indonesian mobile number canonicalization.
//!
//! `0812…`, `62812…` and `+62812…` all refer to the same subscriber; the
//! canonical `62…` form is the customer natural key, so normalization must be
//! deterministic for any input. Unrecognized shapes pass through (digits only)
//! unchanged so that repeats of the same odd input still merge onto one
//! profile.

/// Collapse Indonesian mobile number variants to the canonical `62…` form.
pub fn normalize_phone(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return raw.trim().to_string();
    }
    if digits.starts_with("62") {
        digits
    } else if let Some(rest) = digits.strip_prefix('0') {
        format!("62{rest}")
    } else {
        digits
    }
}

/// WhatsApp deep link for a raw phone number. Construction only; nothing is
/// sent anywhere.
pub fn whatsapp_link(raw: &str) -> String {
    format!("https://wa.me/{}", normalize_phone(raw))
}

#[cfg(test)]
mod tests {
    use super::{normalize_phone, whatsapp_link};

    #[test]
    fn collapses_all_indonesian_variants_to_one_form() {
        assert_eq!(normalize_phone("08123456789"), "628123456789");
        assert_eq!(normalize_phone("628123456789"), "628123456789");
        assert_eq!(normalize_phone("+62 812-3456-789"), "628123456789");
        assert_eq!(normalize_phone("0812 3456 789"), "628123456789");
    }

    #[test]
    fn unrecognized_formats_pass_through_deterministically() {
        // No leading 0 or 62: kept as-is so repeats still merge.
        assert_eq!(normalize_phone("8123456789"), "8123456789");
        assert_eq!(normalize_phone("8123456789"), normalize_phone("8123456789"));
        // No digits at all: trimmed input comes back untouched.
        assert_eq!(normalize_phone("  unknown "), "unknown");
    }

    #[test]
    fn deep_link_uses_canonical_number() {
        assert_eq!(whatsapp_link("08123456789"), "https://wa.me/628123456789");
    }
}
