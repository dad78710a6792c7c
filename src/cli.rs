use std::path::PathBuf;

use anyhow::{bail, ensure, Result};
use clap::{Args, Parser, Subcommand};

use crate::assets::ArticleCatalog;
use crate::types::DisplayMode;

#[derive(Parser, Debug)]
#[command(
    name = "echoline",
    version,
    about = "Transcript-synchronised audio playback: highlights, sentence loops and cloze drills"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print title, sentence and word counts, and audio length.
    Info(InfoArgs),
    /// Print the transcript with cloze blanks.
    Cloze(ClozeArgs),
    /// Simulate playback on a virtual clock and print every player event as JSON.
    Replay(ReplayArgs),
}

/// Where the transcript comes from, shared by every sub-command.
#[derive(Args, Debug, Clone)]
pub struct ArticleArgs {
    /// Transcript JSON file to load directly.
    #[arg(long, value_name = "PATH", conflicts_with = "catalog")]
    pub transcript: Option<PathBuf>,
    /// Article catalog (`articles.json`).
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,
    /// Article id inside the catalog; unknown ids fall back to the first article.
    #[arg(long, value_name = "ID", requires = "catalog")]
    pub article: Option<String>,
    /// JSON file overriding player timing and cloze settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl ArticleArgs {
    pub fn open_catalog(&self) -> Result<ArticleCatalog> {
        match (&self.transcript, &self.catalog) {
            (Some(path), None) => Ok(ArticleCatalog::for_transcript(path)),
            (None, Some(path)) => Ok(ArticleCatalog::load_or_single(
                path,
                self.article.as_deref(),
            )),
            (Some(_), Some(_)) => bail!("provide either --transcript or --catalog, not both"),
            (None, None) => bail!("provide a transcript via --transcript or --catalog"),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InfoArgs {
    #[command(flatten)]
    pub article: ArticleArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ClozeArgs {
    #[command(flatten)]
    pub article: ArticleArgs,
    /// Seed for reproducible blanks; overrides `cloze_seed` from the config file.
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub article: ArticleArgs,
    /// Wall-clock seconds per simulated time sample.
    #[arg(long, default_value_t = 0.25)]
    pub tick: f64,
    /// Stop after this many wall-clock seconds (defaults to the track length).
    #[arg(long, value_name = "SECONDS")]
    pub until: Option<f64>,
    /// Simulated track length; overrides the probed audio duration.
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f64>,
    /// Arm the sentence loop once the playhead passes this time.
    #[arg(long = "loop-at", value_name = "SECONDS")]
    pub loop_at: Option<f64>,
    /// Restart from zero whenever the track ends.
    #[arg(long = "article-loop")]
    pub article_loop: bool,
    /// Play only this sentence (zero-based) instead of the whole track.
    #[arg(long = "sentence", value_name = "INDEX", conflicts_with = "loop_at")]
    pub sentence: Option<usize>,
    /// Playback rate.
    #[arg(long, default_value_t = 1.0)]
    pub rate: f64,
    /// Display mode; `cloze` also emits the masks.
    #[arg(long, value_enum)]
    pub display: Option<DisplayMode>,
}

impl ReplayArgs {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.tick.is_finite() && self.tick > 0.0,
            "tick must be positive, got {}",
            self.tick
        );
        if let Some(until) = self.until {
            ensure!(until.is_finite() && until >= 0.0, "until must be non-negative");
        }
        if let Some(duration) = self.duration {
            ensure!(
                duration.is_finite() && duration > 0.0,
                "duration must be positive, got {}",
                duration
            );
        }
        Ok(())
    }
}
