//! Core types shared by the timeline, playback and cloze modules

use serde::{Deserialize, Serialize};

/// A single timed word, owned by exactly one sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub text: String,
    pub start: f64, // seconds
    pub end: f64,   // seconds
}

/// One transcript line with its time window
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    pub index: usize,
    pub start: f64,
    /// Start of the next sentence, or `None` for the last sentence until the
    /// media duration is known.
    pub end: Option<f64>,
    pub text: String,
    pub translation: Option<String>,
    pub words: Vec<Word>,
}

impl Sentence {
    /// Whether `t` falls inside `[start - lead_in, end)`; an unresolved end is open.
    pub fn contains(&self, t: f64, lead_in: f64) -> bool {
        t >= self.start - lead_in && self.end.map_or(true, |end| t < end)
    }
}

/// Stable identity of a word: sentence index plus position inside the sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WordRef {
    pub sentence: usize,
    pub word: usize,
}

/// Transcript document as supplied by the transcript provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default, alias = "audioUrl")]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub transcript: Vec<TranscriptLine>,
}

/// A single line of the transcript document
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptLine {
    pub time: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub words: Option<Vec<Word>>,
}

impl TranscriptDocument {
    /// Build the ordered sentence list; each sentence ends where the next begins.
    pub fn to_sentences(&self) -> Vec<Sentence> {
        let lines = &self.transcript;
        lines
            .iter()
            .enumerate()
            .map(|(index, line)| Sentence {
                index,
                start: line.time,
                end: lines.get(index + 1).map(|next| next.time),
                text: line.text.clone(),
                translation: line.translation.clone(),
                words: line.words.clone().unwrap_or_default(),
            })
            .collect()
    }

    /// Total words across the document.
    ///
    /// Lines with timed words count those; plain lines count alphanumeric
    /// tokens of their first text line.
    pub fn word_count(&self) -> usize {
        self.transcript.iter().map(TranscriptLine::word_count).sum()
    }
}

impl TranscriptLine {
    pub fn word_count(&self) -> usize {
        match &self.words {
            Some(words) if !words.is_empty() => words.len(),
            _ => count_tokens(self.text.lines().next().unwrap_or("")),
        }
    }
}

fn count_tokens(text: &str) -> usize {
    text.split(|c: char| !is_token_char(c))
        .filter(|token| !token.is_empty())
        .count()
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '\'' || c == '-'
}

/// How the transcript text is presented to the listener
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    All,
    Original,
    Translation,
    None,
    Cloze,
}

/// Format seconds as `MM:SS`; non-finite input renders as `00:00`.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
