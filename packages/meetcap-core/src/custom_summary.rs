//! Local extractive summariser used as the last resort in the provider
//! fallback chain (§4.7) when no external summarisation provider is
//! configured or every configured one has failed.
//!
//! Grounded on the same keyword-regex-matching style the codec modules
//! use for lightweight text classification, kept dependency-free beyond
//! `regex`.

use regex::Regex;

use crate::providers::SummaryResult;

const KEY_POINT_CAP: usize = 5;
const ACTION_ITEM_CAP: usize = 3;
const DECISION_CAP: usize = 3;
const TOPIC_CAP: usize = 5;

struct KeywordSet {
    pattern: Regex,
}

impl KeywordSet {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("static keyword pattern is valid"),
        }
    }

    fn matches<'a>(&self, sentences: &'a [&'a str], cap: usize) -> Vec<String> {
        sentences
            .iter()
            .filter(|s| self.pattern.is_match(s))
            .take(cap)
            .map(|s| s.trim().to_string())
            .collect()
    }
}

/// Splits `text` into trimmed sentences on `.`, `!`, `?`, dropping
/// anything shorter than 10 characters (punctuation-only fragments,
/// stray newlines).
fn split_sentences(text: &str) -> Vec<&str> {
    Regex::new(r"[.!?]+")
        .expect("static sentence-boundary pattern is valid")
        .split(text)
        .map(str::trim)
        .filter(|s| s.len() > 10)
        .collect()
}

/// Produces a short extractive summary plus keyword-filtered highlight
/// lists. Takes the first and last slices of a 30% sentence budget so
/// that both the opening framing and the closing wrap-up survive.
pub fn summarise(text: &str) -> SummaryResult {
    let sentences = split_sentences(text);
    let n = sentences.len();

    let budget = n as f64 * 0.3;
    let front_count = budget / 2.0;
    let front_count = front_count.ceil() as usize;
    let back_count = (budget / 2.0).floor() as usize;

    let front: Vec<&str> = sentences.iter().take(front_count).copied().collect();
    let back_start = n.saturating_sub(back_count);
    let back: Vec<&str> = sentences.iter().skip(back_start.max(front_count)).copied().collect();

    let summary = front
        .iter()
        .chain(back.iter())
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(". ");

    let key_points = KeywordSet::new(r"(?i)\b(important|key|significant|highlight|main point)\b")
        .matches(&sentences, KEY_POINT_CAP);
    let action_items = KeywordSet::new(r"(?i)\b(action item|will do|needs? to|assign(ed)?|follow[- ]up|todo)\b")
        .matches(&sentences, ACTION_ITEM_CAP);
    let decisions = KeywordSet::new(r"(?i)\b(decided|agreed|approved|resolved|conclusion)\b")
        .matches(&sentences, DECISION_CAP);
    let topics = KeywordSet::new(r"(?i)\b(discuss(ed|ing)?|regarding|about|topic|re:)\b")
        .matches(&sentences, TOPIC_CAP);

    SummaryResult {
        source: "custom",
        summary,
        key_points,
        action_items,
        decisions,
        topics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_empty_summary() {
        let result = summarise("");
        assert!(result.summary.is_empty());
        assert!(result.key_points.is_empty());
    }

    #[test]
    fn extracts_front_and_back_sentences() {
        let text = "We opened the meeting with introductions. \
            Then we reviewed last week's progress on the migration. \
            Sara raised a concern about the timeline being too tight. \
            The team discussed the budget for next quarter at length. \
            It was decided that the launch date moves to next month. \
            Action item: Priya will follow up with the vendor by Friday. \
            We closed the meeting thanking everyone for attending today.";
        let result = summarise(text);
        assert!(!result.summary.is_empty());
        assert_eq!(result.source, "custom");
    }

    #[test]
    fn keyword_categories_are_capped() {
        let many_decisions: String = (0..10)
            .map(|i| format!("It was decided that option {i} wins the vote today"))
            .collect::<Vec<_>>()
            .join(". ");
        let result = summarise(&many_decisions);
        assert!(result.decisions.len() <= DECISION_CAP);
    }

    #[test]
    fn short_fragments_are_dropped() {
        let sentences = split_sentences("Ok. Yes. This sentence is long enough to survive filtering.");
        assert_eq!(sentences.len(), 1);
    }
}
