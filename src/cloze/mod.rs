//! Cloze generator: hides words sentence by sentence for recall practice.
//!
//! Three passes run per sentence:
//! 1. score every word and hide the top `ceil(hide_ratio * count)` non-negative ones
//!    (sentences of at most `full_hide_max_words` words aim to hide everything),
//! 2. cohesion: visible stopwords next to a blank are pulled into it with a fixed probability,
//! 3. anchor rescue: in long sentences, hidden prepositions and conjunctions away from the
//!    edges are revealed again with a fixed probability.
//!
//! Randomness comes from an injected [`Rng`], so a seeded generator reproduces masks exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::ClozeConfig;
use crate::timeline::TimelineIndex;
use crate::types::Word;

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "of", "in", "on", "at", "to", "for", "from", "with", "by", "about", "is",
    "are", "am", "was", "were", "be", "been", "being", "and", "but", "or", "so", "if", "because",
    "as", "that", "this", "it", "he", "she", "they", "we", "i", "you", "my", "your", "his", "her",
    "their", "our", "us", "him", "them",
];

// Prepositions and conjunctions only
const ANCHOR_WORDS: &[&str] = &[
    "in", "on", "at", "to", "for", "from", "with", "by", "about", "of", "and", "but", "or", "so",
    "as", "into", "like", "than", "over",
];

const SENTENCE_INITIAL_SCORE: f64 = -1000.0;
const PROPER_NOUN_SCORE: f64 = -9999.0;
const NUMERIC_SCORE: f64 = 100.0;
const LONG_WORD_SCORE: f64 = 50.0;
const MEDIUM_WORD_SCORE: f64 = 40.0;
const SHORT_WORD_SCORE: f64 = 20.0;
const STOP_WORD_SCORE: f64 = 1.0;

/// Hidden flags for the words of one sentence, in word order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClozeMask {
    hidden: Vec<bool>,
}

impl ClozeMask {
    pub fn len(&self) -> usize {
        self.hidden.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hidden.is_empty()
    }

    pub fn is_hidden(&self, index: usize) -> bool {
        self.hidden.get(index).copied().unwrap_or(false)
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden.iter().filter(|hidden| **hidden).count()
    }

    pub fn hidden_indices(&self) -> Vec<usize> {
        self.hidden
            .iter()
            .enumerate()
            .filter_map(|(index, hidden)| hidden.then_some(index))
            .collect()
    }

    /// Join the words with a blank in place of every hidden one.
    pub fn render(&self, words: &[Word]) -> String {
        words
            .iter()
            .enumerate()
            .map(|(index, word)| {
                if self.is_hidden(index) {
                    "____"
                } else {
                    word.text.trim()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Per-word facts used by all three passes
#[derive(Debug, Clone)]
struct WordTraits {
    cleaned: String,
    numeric: bool,
    stop: bool,
    capitalized: bool,
    first_person: bool,
}

impl WordTraits {
    fn of(text: &str) -> Self {
        let raw = text.trim();
        let cleaned = clean_token(raw);
        Self {
            numeric: cleaned.chars().any(|c| c.is_ascii_digit()),
            stop: STOP_WORDS.contains(&cleaned.as_str()),
            capitalized: raw.starts_with(|c: char| c.is_ascii_uppercase()),
            first_person: raw == "I",
            cleaned,
        }
    }

    fn len(&self) -> usize {
        self.cleaned.chars().count()
    }

    /// Score before jitter; negative scores are never hidden by the first pass.
    fn base_score(&self, index: usize) -> f64 {
        let len = self.len();
        let mut score = if index == 0 && !self.numeric && (self.stop || len <= 4) {
            SENTENCE_INITIAL_SCORE
        } else if self.numeric {
            NUMERIC_SCORE
        } else if !self.stop && len >= 7 {
            LONG_WORD_SCORE
        } else if !self.stop && len >= 4 {
            MEDIUM_WORD_SCORE
        } else if !self.stop {
            SHORT_WORD_SCORE
        } else {
            STOP_WORD_SCORE
        };
        if index > 0 && self.capitalized && !self.first_person {
            score = PROPER_NOUN_SCORE;
        }
        score
    }
}

/// Lowercase and strip the punctuation that commonly clings to transcript tokens.
fn clean_token(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '?' | '!' | ':' | ';' | '"' | '\'' | '(' | ')'))
        .collect()
}

pub struct ClozeGenerator<R: Rng = StdRng> {
    config: ClozeConfig,
    rng: R,
}

impl ClozeGenerator<StdRng> {
    /// Reproducible masks for a given seed.
    pub fn seeded(config: ClozeConfig, seed: u64) -> Self {
        Self::new(config, StdRng::seed_from_u64(seed))
    }

    /// Fresh masks on every run.
    pub fn from_os_rng(config: ClozeConfig) -> Self {
        Self::new(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> ClozeGenerator<R> {
    pub fn new(config: ClozeConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &ClozeConfig {
        &self.config
    }

    /// Number of words the scoring pass aims to hide.
    pub fn target_count(&self, word_count: usize) -> usize {
        if word_count <= self.config.full_hide_max_words {
            word_count
        } else {
            ((word_count as f64 * self.config.hide_ratio).ceil() as usize).min(word_count)
        }
    }

    /// Build a mask for one sentence's words.
    pub fn mask(&mut self, words: &[Word]) -> ClozeMask {
        let count = words.len();
        if count == 0 {
            return ClozeMask::default();
        }
        let traits: Vec<WordTraits> = words.iter().map(|word| WordTraits::of(&word.text)).collect();
        let mut hidden = vec![false; count];

        self.scoring_pass(&traits, &mut hidden);
        let scored = hidden.iter().filter(|h| **h).count();
        self.cohesion_pass(&traits, &mut hidden);
        let cohesive = hidden.iter().filter(|h| **h).count();
        if count > self.config.rescue_min_words {
            self.rescue_pass(&traits, &mut hidden);
        }

        let mask = ClozeMask { hidden };
        debug!(
            words = count,
            scored,
            cohesive,
            hidden = mask.hidden_count(),
            "cloze mask built"
        );
        mask
    }

    /// Masks for every sentence of the timeline, indexed like the sentences.
    pub fn generate(&mut self, timeline: &TimelineIndex) -> Vec<ClozeMask> {
        timeline
            .sentences()
            .iter()
            .map(|sentence| self.mask(&sentence.words))
            .collect()
    }

    fn scoring_pass(&mut self, traits: &[WordTraits], hidden: &mut [bool]) {
        let mut scored: Vec<(usize, f64)> = traits
            .iter()
            .enumerate()
            .map(|(index, word)| {
                let jitter = self.rng.random::<f64>() * self.config.jitter;
                (index, word.base_score(index) + jitter)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let target = self.target_count(traits.len());
        for &(index, score) in scored.iter().take(target) {
            if score >= 0.0 {
                hidden[index] = true;
            }
        }
    }

    fn cohesion_pass(&mut self, traits: &[WordTraits], hidden: &mut [bool]) {
        let count = traits.len();
        for index in 1..count {
            if hidden[index] || !traits[index].stop {
                continue;
            }
            let left = hidden[index - 1];
            let right = index + 1 < count && hidden[index + 1];
            if (left || right) && self.chance(self.config.cohesion_probability) {
                hidden[index] = true;
            }
        }
    }

    fn rescue_pass(&mut self, traits: &[WordTraits], hidden: &mut [bool]) {
        let count = traits.len();
        for index in 1..count.saturating_sub(1) {
            if hidden[index]
                && ANCHOR_WORDS.contains(&traits[index].cleaned.as_str())
                && self.chance(self.config.rescue_probability)
            {
                hidden[index] = false;
            }
        }
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }
}
