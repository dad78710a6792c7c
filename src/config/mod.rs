use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

/// Timing tolerances and tuning knobs for the player core.
///
/// All durations are in seconds. Missing keys in an override file keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Lead-in tolerance: a sentence claims time from `start - sentence_lead_in`.
    pub sentence_lead_in: f64,
    /// Tolerance used by sentence toggling to decide "already inside this sentence".
    pub toggle_lead_in: f64,
    /// Inter-word silences shorter than this keep the previous word highlighted.
    pub word_gap_fill: f64,
    /// Sentence loops rewind this long before the sentence end.
    pub loop_end_padding: f64,
    /// Sentence loops land this long before the sentence start (clamped to 0).
    pub loop_start_padding: f64,
    /// Sentence playback starts this long before the sentence start (clamped to 0).
    pub player_lead_in: f64,
    /// Sentence playback stops this long before the sentence end.
    pub player_end_epsilon: f64,
    pub cloze: ClozeConfig,
    /// Fixed seed for cloze masks; `None` draws from the OS.
    pub cloze_seed: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            sentence_lead_in: 0.1,
            toggle_lead_in: 0.2,
            word_gap_fill: 1.5,
            loop_end_padding: 0.15,
            loop_start_padding: 0.0,
            player_lead_in: 0.0,
            player_end_epsilon: 0.05,
            cloze: ClozeConfig::default(),
            cloze_seed: None,
        }
    }
}

/// Weights for the cloze word-hiding passes
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClozeConfig {
    /// Sentences with at most this many words are blanked entirely.
    pub full_hide_max_words: usize,
    /// Fraction of words (rounded up) hidden in longer sentences.
    pub hide_ratio: f64,
    /// Upper bound of the random score jitter.
    pub jitter: f64,
    pub cohesion_probability: f64,
    /// Anchor rescue runs only for sentences longer than this.
    pub rescue_min_words: usize,
    pub rescue_probability: f64,
}

impl Default for ClozeConfig {
    fn default() -> Self {
        Self {
            full_hide_max_words: 5,
            hide_ratio: 0.75,
            jitter: 5.0,
            cohesion_probability: 0.6,
            rescue_min_words: 7,
            rescue_probability: 0.5,
        }
    }
}

impl PlayerConfig {
    /// Load defaults, optionally overridden by a JSON file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read player config at {:?}", path))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("failed to parse player config at {:?}", path))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("sentence_lead_in", self.sentence_lead_in),
            ("toggle_lead_in", self.toggle_lead_in),
            ("loop_end_padding", self.loop_end_padding),
            ("loop_start_padding", self.loop_start_padding),
            ("player_lead_in", self.player_lead_in),
            ("player_end_epsilon", self.player_end_epsilon),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{} must be a non-negative number of seconds, got {}",
                label,
                value
            );
        }
        ensure!(
            self.word_gap_fill.is_finite() && self.word_gap_fill > 0.0,
            "word_gap_fill must be positive, got {}",
            self.word_gap_fill
        );
        self.cloze.validate()
    }
}

impl ClozeConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.hide_ratio > 0.0 && self.hide_ratio <= 1.0,
            "cloze hide_ratio must be in (0, 1], got {}",
            self.hide_ratio
        );
        ensure!(
            self.jitter.is_finite() && self.jitter >= 0.0,
            "cloze jitter must be non-negative, got {}",
            self.jitter
        );
        for (label, value) in [
            ("cohesion_probability", self.cohesion_probability),
            ("rescue_probability", self.rescue_probability),
        ] {
            ensure!(
                (0.0..=1.0).contains(&value),
                "cloze {} must be within [0, 1], got {}",
                label,
                value
            );
        }
        Ok(())
    }
}
