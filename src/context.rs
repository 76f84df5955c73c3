//! Deterministic context assembly.
//!
//! A context is an ordered list of `total_docs` passages with the gold
//! passage at a chosen 1-indexed position and distractors everywhere else.
//! Every random choice is drawn from a generator constructed from the seed
//! inside the call, so the output depends only on the arguments and calls
//! can run concurrently without coordination.
//!
//! # Distractor selection
//!
//! 1. All of the record's hard distractors are taken first.
//! 2. A seeded shuffle of the generic pool tops the list up.
//! 3. If that still falls short, generic passages are sampled with
//!    replacement. Duplicates are preferred over failing the trial.
//! 4. The assembled list is shuffled once more so hard distractors do not
//!    cluster, then consumed in order around the gold slot.

use crate::error::{ExperimentError, Result};
use crate::llm::PromptStyle;
use crate::qa::{DistractorPool, QaRecord};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use std::fmt;

/// Separator between rendered documents.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Where to put the gold document for one trial.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest<'a> {
    pub qa: &'a QaRecord,
    /// 1-indexed position of the gold document.
    pub gold_position: usize,
    pub total_docs: usize,
    pub seed: u64,
}

impl<'a> PlacementRequest<'a> {
    /// Request with the seed derived from the record id and position.
    pub fn derived(qa: &'a QaRecord, gold_position: usize, total_docs: usize) -> Self {
        Self {
            qa,
            gold_position,
            total_docs,
            seed: derive_seed(&qa.id, gold_position),
        }
    }

    /// Check `1 <= gold_position <= total_docs`.
    pub fn validate(&self) -> Result<()> {
        validate_placement(self.gold_position, self.total_docs)
    }

    /// Build the context for this request.
    pub fn build(&self, pool: &DistractorPool) -> Result<Context> {
        build_context(self.qa, pool, self.gold_position, self.total_docs, self.seed)
    }
}

/// An assembled, numbered list of passages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    documents: Vec<String>,
    gold_position: usize,
    /// Generic passages drawn with replacement to fill the context.
    resampled: usize,
}

impl Context {
    /// Passages in order. Index `gold_position - 1` holds the gold passage.
    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    /// 1-indexed position of the gold passage.
    pub fn gold_position(&self) -> usize {
        self.gold_position
    }

    /// The passage at a 1-indexed position.
    pub fn document(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.documents.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// How many distractors had to be sampled with replacement.
    pub fn resampled(&self) -> usize {
        self.resampled
    }

    /// Render as `Document {i}: {text}` blocks separated by blank lines.
    pub fn render(&self) -> String {
        self.documents
            .iter()
            .enumerate()
            .map(|(i, doc)| format!("Document {}: {}", i + 1, doc))
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn validate_placement(gold_position: usize, total_docs: usize) -> Result<()> {
    if total_docs == 0 || gold_position == 0 || gold_position > total_docs {
        return Err(ExperimentError::InvalidPlacement {
            gold_position,
            total_docs,
        });
    }
    Ok(())
}

/// Build a context with `qa.gold_doc` at `gold_position` among `total_docs`.
///
/// Fails with [`ExperimentError::InvalidPlacement`] when the position is
/// outside `1..=total_docs`, and with [`ExperimentError::NoDistractors`] when
/// distractors are needed but both the hard list and the pool are empty.
pub fn build_context(
    qa: &QaRecord,
    pool: &DistractorPool,
    gold_position: usize,
    total_docs: usize,
    seed: u64,
) -> Result<Context> {
    validate_placement(gold_position, total_docs)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let needed = total_docs - 1;

    let mut distractors: Vec<&str> = qa.hard_distractors.iter().map(String::as_str).collect();

    let mut generic: Vec<&str> = pool.passages().iter().map(String::as_str).collect();
    generic.shuffle(&mut rng);

    let remaining = needed.saturating_sub(distractors.len());
    distractors.extend(generic.iter().take(remaining).copied());

    let mut resampled = 0;
    if distractors.len() < needed {
        // Generic pool exhausted. Draw from it again, or from the hard list
        // when there is no generic pool at all.
        let source: Vec<&str> = if generic.is_empty() {
            distractors.clone()
        } else {
            generic.clone()
        };
        if source.is_empty() {
            return Err(ExperimentError::NoDistractors { needed });
        }
        while distractors.len() < needed {
            if let Some(&doc) = source.choose(&mut rng) {
                distractors.push(doc);
                resampled += 1;
            }
        }
        tracing::warn!(
            qa_id = %qa.id,
            needed,
            resampled,
            "distractor pool too small, sampled with replacement"
        );
    }

    distractors.shuffle(&mut rng);

    let mut fillers = distractors.into_iter();
    let mut documents = Vec::with_capacity(total_docs);
    for position in 1..=total_docs {
        if position == gold_position {
            documents.push(qa.gold_doc.clone());
        } else if let Some(doc) = fillers.next() {
            documents.push(doc.to_string());
        }
    }

    Ok(Context {
        documents,
        gold_position,
        resampled,
    })
}

/// Wrap a rendered context and question in the standard prompt.
///
/// An empty context yields just the question and the `Answer:` cue.
pub fn build_prompt(context: &str, question: &str) -> String {
    PromptStyle::Standard.render(context, question)
}

/// Stable per-trial seed: SHA-256 of `"{qa_id}_{position}"` reduced mod 2^32.
pub fn derive_seed(qa_id: &str, position: usize) -> u64 {
    let digest = Sha256::digest(format!("{}_{}", qa_id, position).as_bytes());
    let tail = [digest[28], digest[29], digest[30], digest[31]];
    u64::from(u32::from_be_bytes(tail))
}
