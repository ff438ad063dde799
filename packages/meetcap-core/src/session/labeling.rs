//! Participant label derivation (§4.4).

use std::collections::HashSet;

use rand::Rng;

use crate::utils::{device_suffix, sanitise_label_name};

/// Derives a stable, unique-within-session participant label.
///
/// `name_source` should already reflect the "prefer fullName, else
/// displayName, else the literal `participant`" precedence from the
/// caller. `existing_labels` is consulted to avoid clobbering an
/// existing directory; on collision a fresh random suffix is drawn.
#[must_use]
pub fn derive_label(participant_id: &str, name_source: &str, existing_labels: &HashSet<String>) -> String {
    let name = sanitise_label_name(name_source);
    let suffix = device_suffix(participant_id);
    loop {
        let label = format!("{name}_{suffix}_{}", random_three_digits());
        if !existing_labels.contains(&label) {
            return label;
        }
    }
}

fn random_three_digits() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1000);
    format!("{n:03}")
}

/// Chooses the name source per §4.4 step 1: prefer `fullName`, else
/// `displayName`, else the literal `"participant"`.
#[must_use]
pub fn name_source<'a>(full_name: Option<&'a str>, display_name: Option<&'a str>) -> &'a str {
    full_name.or(display_name).unwrap_or("participant")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_source_prefers_full_name() {
        assert_eq!(name_source(Some("Full Name"), Some("Display")), "Full Name");
    }

    #[test]
    fn name_source_falls_back_to_display_name() {
        assert_eq!(name_source(None, Some("Display")), "Display");
    }

    #[test]
    fn name_source_falls_back_to_literal() {
        assert_eq!(name_source(None, None), "participant");
    }

    #[test]
    fn derive_label_avoids_collisions() {
        let mut existing = HashSet::new();
        let first = derive_label("abc123", "Alice", &existing);
        existing.insert(first.clone());
        let second = derive_label("abc123", "Alice", &existing);
        assert_ne!(first, second);
        assert!(second.starts_with("alice_123_"));
    }

    #[test]
    fn derive_label_shape() {
        let existing = HashSet::new();
        let label = derive_label("device42", "Bob", &existing);
        let parts: Vec<&str> = label.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "bob");
        assert_eq!(parts[1], "42");
        assert_eq!(parts[2].len(), 3);
    }
}
