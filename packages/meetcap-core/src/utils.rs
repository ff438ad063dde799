//! General utilities shared across the application.

use std::time::{SystemTime, UNIX_EPOCH};

use unicode_normalization::UnicodeNormalization;

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Sanitisation
// ─────────────────────────────────────────────────────────────────────────────

/// Normalises `s` to NFKD, strips combining marks, drops non-alphanumeric
/// characters and lowercases the result. Does not truncate or substitute
/// a fallback for an empty result; callers decide that.
#[must_use]
pub fn strip_to_alnum_lowercase(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Returns true for characters in the Unicode combining-mark ranges that
/// `nfkd()` decomposition can produce.
fn is_combining_mark(c: char) -> bool {
    matches!(c as u32,
        0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

/// Derives a participant-label name component per the labeling rules:
/// normalise, strip marks, drop non-alphanumerics, lowercase, truncate to
/// 48 chars; empty becomes `"participant"`.
#[must_use]
pub fn sanitise_label_name(source: &str) -> String {
    let cleaned = strip_to_alnum_lowercase(source);
    let truncated: String = cleaned.chars().take(48).collect();
    if truncated.is_empty() {
        "participant".to_string()
    } else {
        truncated
    }
}

/// Derives a device suffix from a participant id: the trailing run of
/// decimal digits, else the last 3 digits appearing anywhere, else `"id"`.
#[must_use]
pub fn device_suffix(participant_id: &str) -> String {
    let chars: Vec<char> = participant_id.chars().collect();
    let mut trailing_start = chars.len();
    while trailing_start > 0 && chars[trailing_start - 1].is_ascii_digit() {
        trailing_start -= 1;
    }
    if trailing_start < chars.len() {
        return chars[trailing_start..].iter().collect();
    }

    let digits: Vec<char> = chars.iter().copied().filter(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty() {
        let start = digits.len().saturating_sub(3);
        return digits[start..].iter().collect();
    }

    "id".to_string()
}

/// Sanitises a string for use as an archive folder slug: NFKD, strip
/// combining marks, replace non-alphanumeric runs with `-`, trim, lowercase.
#[must_use]
pub fn sanitise_slug(s: &str) -> String {
    let decomposed: String = s
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let mut slug = String::with_capacity(decomposed.len());
    let mut last_was_dash = false;
    for c in decomposed.chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod sanitise_label_name {
        use super::*;

        #[test]
        fn strips_accents_and_punctuation() {
            assert_eq!(sanitise_label_name("Jos\u{e9} O'Brien-Smith"), "joseobriensmith");
        }

        #[test]
        fn empty_source_falls_back() {
            assert_eq!(sanitise_label_name("!!!"), "participant");
            assert_eq!(sanitise_label_name(""), "participant");
        }

        #[test]
        fn truncates_to_48_chars() {
            let long = "a".repeat(100);
            assert_eq!(sanitise_label_name(&long).len(), 48);
        }
    }

    mod device_suffix {
        use super::*;

        #[test]
        fn trailing_digits() {
            assert_eq!(device_suffix("participant42"), "42");
        }

        #[test]
        fn digits_scattered_take_last_three() {
            assert_eq!(device_suffix("p1a2b3c4x"), "234");
        }

        #[test]
        fn no_digits_falls_back_to_id() {
            assert_eq!(device_suffix("abcxyz"), "id");
        }

        #[test]
        fn empty_id_falls_back_to_id() {
            assert_eq!(device_suffix(""), "id");
        }
    }

    mod sanitise_slug {
        use super::*;

        #[test]
        fn replaces_non_alnum_runs_with_dash() {
            assert_eq!(sanitise_slug("meet.example/xyz room!!"), "meet-example-xyz-room");
        }

        #[test]
        fn trims_leading_trailing_dashes() {
            assert_eq!(sanitise_slug("///xyz///"), "xyz");
        }

        #[test]
        fn lowercases() {
            assert_eq!(sanitise_slug("XYZ"), "xyz");
        }
    }
}
