//! Timeline index - maps a playback time to the sentence and word it belongs to
//!
//! Lookups never fail: empty, unsorted or overlapping data simply yields `None`
//! or the first matching entry, so a bad transcript cannot stall the sampling loop.

use tracing::{debug, warn};

use crate::types::{Sentence, Word, WordRef};

/// A word in the flat, time-ordered list with its precomputed highlight end
#[derive(Debug, Clone, Copy)]
struct FlatWord {
    word: WordRef,
    start: f64,
    visual_end: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    sentences: Vec<Sentence>,
    words: Vec<FlatWord>,
    sentence_lead_in: f64,
}

impl TimelineIndex {
    pub fn new(sentences: Vec<Sentence>, sentence_lead_in: f64, word_gap_fill: f64) -> Self {
        if !is_ordered(&sentences) {
            warn!(
                sentences = sentences.len(),
                "sentence start times are not ordered; lookups fall back to last claimant"
            );
        }
        let words = flatten_words(&sentences, word_gap_fill);
        debug!(
            sentences = sentences.len(),
            words = words.len(),
            "timeline index built"
        );
        Self {
            sentences,
            words,
            sentence_lead_in,
        }
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentence(&self, index: usize) -> Option<&Sentence> {
        self.sentences.get(index)
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn word(&self, word: WordRef) -> Option<&Word> {
        self.sentences
            .get(word.sentence)
            .and_then(|sentence| sentence.words.get(word.word))
    }

    /// The last sentence whose `start - lead_in <= t`.
    pub fn sentence_at(&self, t: f64) -> Option<&Sentence> {
        self.sentence_index_at(t)
            .and_then(|index| self.sentences.get(index))
    }

    pub fn sentence_index_at(&self, t: f64) -> Option<usize> {
        self.sentences
            .iter()
            .rposition(|sentence| t >= sentence.start - self.sentence_lead_in)
    }

    /// The word whose `[start, visual_end)` contains `t`.
    ///
    /// `visual_end` bridges positive gaps to the next word shorter than the
    /// configured fill threshold.
    pub fn word_at(&self, t: f64) -> Option<WordRef> {
        self.words
            .iter()
            .find(|word| t >= word.start && t < word.visual_end)
            .map(|word| word.word)
    }

    /// Highlight end for a word, including any bridged gap.
    pub fn visual_end(&self, word: WordRef) -> Option<f64> {
        self.words
            .iter()
            .find(|flat| flat.word == word)
            .map(|flat| flat.visual_end)
    }

    /// Fill in the last sentence's open end once the media duration is known.
    ///
    /// Returns `true` when the end was updated. Durations that are not finite or not
    /// past the sentence start are ignored.
    pub fn resolve_last_end(&mut self, duration: f64) -> bool {
        let Some(last) = self.sentences.last_mut() else {
            return false;
        };
        if last.end.is_some() {
            return false;
        }
        if !duration.is_finite() || duration <= last.start {
            debug!(duration, start = last.start, "ignoring unusable media duration");
            return false;
        }
        last.end = Some(duration);
        debug!(index = last.index, end = duration, "resolved last sentence end");
        true
    }
}

fn is_ordered(sentences: &[Sentence]) -> bool {
    sentences
        .windows(2)
        .all(|pair| pair[0].start <= pair[1].start)
}

fn flatten_words(sentences: &[Sentence], gap_fill: f64) -> Vec<FlatWord> {
    let timed: Vec<(WordRef, &Word)> = sentences
        .iter()
        .enumerate()
        .flat_map(|(sentence_idx, sentence)| {
            sentence.words.iter().enumerate().map(move |(word_idx, word)| {
                (
                    WordRef {
                        sentence: sentence_idx,
                        word: word_idx,
                    },
                    word,
                )
            })
        })
        .collect();

    timed
        .iter()
        .enumerate()
        .map(|(idx, (word_ref, word))| {
            let mut visual_end = word.end;
            if let Some((_, next)) = timed.get(idx + 1) {
                let gap = next.start - word.end;
                if gap > 0.0 && gap < gap_fill {
                    visual_end = next.start;
                }
            }
            FlatWord {
                word: *word_ref,
                start: word.start,
                visual_end,
            }
        })
        .collect()
}
