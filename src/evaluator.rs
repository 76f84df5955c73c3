//! Scoring free-text model answers against a gold answer.
//!
//! The decision is a fixed sequence of checks and the first one that
//! decides wins:
//!
//! 1. Extract the answer span by removing lead-in boilerplate and trailing
//!    punctuation.
//! 2. Reject outright if the response, past its lead-in, explicitly names
//!    a different answer ("the real answer is X").
//! 3. Normalize both sides.
//! 4. Exact match.
//! 5. All significant (non-stopword) words of a multi-word gold answer
//!    appear in the extracted span.
//! 6. The number sets of both sides are identical, when the gold answer
//!    contains a number.
//!
//! Commas are removed during normalization, so `"1,000"` and `"1000"`
//! compare equal.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Lead-in phrases removed from the start of a response, matched without
/// regard to ASCII case.
const LEAD_INS: &[&str] = &[
    "the answer is",
    "answer:",
    "based on the documents,",
    "according to the documents,",
];

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':'];

const STOPWORDS: &[&str] = &["the", "a", "an", "of", "and", "in", "is", "was", "are", "were"];

static EXPLICIT_ANSWER: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(?:the\s+)?real\s+answer\s+is\s+([^.,]+)",
        r"(?i)(?:the\s+)?(?:correct\s+)?answer\s+is\s+([^.,]+)",
        r"(?i)answer\s*:\s*([^.,]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("explicit answer pattern is valid"))
    .collect()
});

static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-.]").expect("normalization pattern is valid"));

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:,\d+)*(?:\.\d+)?").expect("number pattern is valid"));

/// Which rule accepted an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    SignificantWords,
    NumericSet,
}

/// Why a verdict came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VerdictReason {
    Matched { rule: MatchKind },
    /// The response explicitly states a different answer.
    Contradicted { stated: String },
    /// Nothing left to compare after extraction or normalization.
    Empty,
    NoMatch,
}

/// Outcome of scoring one response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_correct: bool,
    /// Best-effort answer span taken from the response.
    pub extracted: String,
    pub reason: VerdictReason,
}

impl Verdict {
    fn new(extracted: String, reason: VerdictReason) -> Self {
        Self {
            is_correct: matches!(reason, VerdictReason::Matched { .. }),
            extracted,
            reason,
        }
    }
}

/// Decide whether `response` answers with `gold_answer`.
///
/// Returns `(is_correct, extracted)`. Never fails; empty or odd input is
/// simply incorrect.
pub fn check_answer(response: &str, gold_answer: &str) -> (bool, String) {
    let verdict = evaluate(response, gold_answer);
    (verdict.is_correct, verdict.extracted)
}

/// Like [`check_answer`] but keeps the reason.
pub fn evaluate(response: &str, gold_answer: &str) -> Verdict {
    evaluate_with_variants::<&str>(response, gold_answer, &[])
}

/// Score against the gold answer and any accepted alternative phrasings.
///
/// An explicitly stated answer only rejects the response when it differs
/// from every accepted answer.
pub fn evaluate_with_variants<S: AsRef<str>>(
    response: &str,
    gold_answer: &str,
    variants: &[S],
) -> Verdict {
    // The guard reads the response past its lead-in, so a response and its
    // extracted answer always get the same verdict.
    let body = strip_lead_ins(response);
    let extracted = trim_trailing(body);

    let accepted: Vec<String> = std::iter::once(gold_answer)
        .chain(variants.iter().map(AsRef::as_ref))
        .map(normalize)
        .filter(|a| !a.is_empty())
        .collect();

    if let Some(stated) = explicit_answer(body) {
        if !accepted.is_empty() && accepted.iter().all(|a| contradicts(&stated, a)) {
            tracing::debug!(%stated, "response names a different answer");
            return Verdict::new(extracted, VerdictReason::Contradicted { stated });
        }
    }

    let norm_extracted = normalize(&extracted);
    if norm_extracted.is_empty() || accepted.is_empty() {
        return Verdict::new(extracted, VerdictReason::Empty);
    }

    for gold in &accepted {
        if let Some(rule) = match_normalized(&norm_extracted, gold) {
            return Verdict::new(extracted, VerdictReason::Matched { rule });
        }
    }

    Verdict::new(extracted, VerdictReason::NoMatch)
}

fn match_normalized(extracted: &str, gold: &str) -> Option<MatchKind> {
    if extracted == gold {
        return Some(MatchKind::Exact);
    }

    let gold_words: HashSet<&str> = gold.split(' ').collect();
    if gold_words.len() > 1 {
        let extracted_words: HashSet<&str> = extracted.split(' ').collect();
        let mut significant = gold_words
            .iter()
            .filter(|w| !STOPWORDS.contains(w))
            .peekable();
        if significant.peek().is_some() && significant.all(|w| extracted_words.contains(w)) {
            return Some(MatchKind::SignificantWords);
        }
    }

    let gold_numbers = numbers(gold);
    if !gold_numbers.is_empty() && gold_numbers == numbers(extracted) {
        return Some(MatchKind::NumericSet);
    }

    None
}

/// Strip lead-in phrases and trailing punctuation from a raw response.
///
/// Only the listed phrases are removed; a bare leading "The" is kept so
/// names like "The Hague" survive.
pub fn extract_answer(response: &str) -> String {
    trim_trailing(strip_lead_ins(response))
}

fn strip_lead_ins(response: &str) -> &str {
    let mut text = response.trim();
    while let Some(rest) = LEAD_INS.iter().find_map(|p| strip_prefix_ignore_case(text, p)) {
        text = rest.trim();
    }
    text
}

fn trim_trailing(text: &str) -> String {
    text.trim_end_matches(|c: char| TRAILING_PUNCTUATION.contains(&c) || c.is_whitespace())
        .to_string()
}

/// Case-insensitive prefix strip. A prefix ending in a letter must end on a
/// word boundary, so "the answer is" does not eat into "the answer island".
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &text[prefix.len()..];
    let needs_boundary = prefix.chars().last().is_some_and(char::is_alphanumeric);
    let at_boundary = rest
        .chars()
        .next()
        .is_none_or(|c| c.is_whitespace() || c.is_ascii_punctuation());
    if needs_boundary && !at_boundary {
        return None;
    }
    Some(rest)
}

/// Lowercase, drop everything except word characters, whitespace, hyphens
/// and dots, and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let cleaned = DISALLOWED.replace_all(&lowered, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The answer a response explicitly commits to, normalized, if any.
pub fn explicit_answer(response: &str) -> Option<String> {
    let lowered = response.to_lowercase();
    EXPLICIT_ANSWER.iter().find_map(|re| {
        re.captures(&lowered)
            .and_then(|caps| caps.get(1))
            .map(|m| normalize(m.as_str()))
            .filter(|s| !s.is_empty())
    })
}

fn contradicts(stated: &str, gold: &str) -> bool {
    stated != gold && !stated.contains(gold) && !gold.contains(stated)
}

/// Number-like tokens: digit runs with optional comma groups and one
/// decimal part.
pub fn numbers(text: &str) -> BTreeSet<String> {
    NUMBER
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
