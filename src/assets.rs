//! Article catalog and asset loading
//!
//! Paths inside a catalog (and the `audioUrl` of a transcript) are resolved against the
//! directory the catalog lives in.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

use crate::error::{PlayerError, Result};
use crate::types::TranscriptDocument;

/// Id used when neither a catalog nor an explicit article is available.
pub const DEFAULT_ARTICLE_ID: &str = "1";

/// One entry of `articles.json`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleEntry {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub data_file: String,
    #[serde(default)]
    pub audio_file: Option<String>,
}

impl ArticleEntry {
    /// Compact label: the `第N篇` prefix when present, else the text before the first colon.
    pub fn short_title(&self) -> String {
        short_title(&self.title)
    }
}

pub fn short_title(title: &str) -> String {
    if let Some(rest) = title.strip_prefix('第') {
        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        if digits > 0 && rest[digits..].starts_with('篇') {
            return format!("第{}篇", &rest[..digits]);
        }
    }
    title
        .split([':', '：'])
        .next()
        .unwrap_or(title)
        .to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    articles: Vec<ArticleEntry>,
}

#[derive(Debug, Clone)]
pub struct ArticleCatalog {
    base_dir: PathBuf,
    articles: Vec<ArticleEntry>,
}

impl ArticleCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            PlayerError::asset(format!("failed to read catalog {}: {}", path.display(), err))
        })?;
        let file: CatalogFile = serde_json::from_str(&raw).map_err(|err| {
            PlayerError::asset(format!("failed to parse catalog {}: {}", path.display(), err))
        })?;
        debug!(path = %path.display(), articles = file.articles.len(), "catalog loaded");
        Ok(Self {
            base_dir: parent_dir(path),
            articles: file.articles,
        })
    }

    /// Load the catalog, or fall back to the single `data/article-{id}.json` next to it.
    pub fn load_or_single(path: &Path, id: Option<&str>) -> Self {
        match Self::load(path) {
            Ok(catalog) => catalog,
            Err(err) => {
                let id = id.unwrap_or(DEFAULT_ARTICLE_ID);
                warn!(error = %err, id, "catalog unavailable; loading single article");
                Self::single(parent_dir(path), id)
            }
        }
    }

    /// A catalog holding only `data/article-{id}.json` under `base_dir`.
    pub fn single(base_dir: impl Into<PathBuf>, id: &str) -> Self {
        Self {
            base_dir: base_dir.into(),
            articles: vec![ArticleEntry {
                id: id.to_string(),
                title: String::new(),
                data_file: format!("data/article-{}.json", id),
                audio_file: None,
            }],
        }
    }

    /// A catalog wrapping one transcript file given directly.
    pub fn for_transcript(path: &Path) -> Self {
        let data_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            base_dir: parent_dir(path),
            articles: vec![ArticleEntry {
                id: DEFAULT_ARTICLE_ID.to_string(),
                title: String::new(),
                data_file,
                audio_file: None,
            }],
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn articles(&self) -> &[ArticleEntry] {
        &self.articles
    }

    /// The requested article; unknown or missing ids fall back to the first entry.
    pub fn select(&self, id: Option<&str>) -> Result<&ArticleEntry> {
        let first = self
            .articles
            .first()
            .ok_or_else(|| PlayerError::asset("article catalog is empty"))?;
        let Some(id) = id else {
            return Ok(first);
        };
        match self.articles.iter().find(|article| article.id == id) {
            Some(article) => Ok(article),
            None => {
                warn!(id, fallback = %first.id, "unknown article id; using the first article");
                Ok(first)
            }
        }
    }

    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.base_dir.join(relative)
    }

    /// Load the transcript of the selected article and locate its audio.
    ///
    /// A transcript failure is an error; an audio failure is carried in
    /// [`LoadedArticle::audio`] so the transcript can still be shown.
    pub fn open(&self, id: Option<&str>) -> Result<LoadedArticle> {
        let entry = self.select(id)?.clone();
        let document = load_transcript(&self.resolve(&entry.data_file))?;
        let fallback = document.audio_url.as_deref().map(|url| self.resolve(url));
        let primary = entry.audio_file.as_deref().map(|file| self.resolve(file));
        let audio = match (primary, fallback) {
            (Some(primary), fallback) => resolve_audio(&primary, fallback.as_deref()),
            (None, Some(only)) => resolve_audio(&only, None),
            (None, None) => Err(PlayerError::asset(format!(
                "article {} names no audio file",
                entry.id
            ))),
        };
        let title = if entry.title.is_empty() {
            document.title.clone()
        } else {
            entry.title.clone()
        };
        info!(id = %entry.id, %title, audio_ok = audio.is_ok(), "article opened");
        Ok(LoadedArticle {
            entry,
            title,
            document,
            audio,
        })
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Everything needed to start a session on one article
#[derive(Debug, Clone)]
pub struct LoadedArticle {
    pub entry: ArticleEntry,
    /// Catalog title, or the transcript's own title when the catalog has none.
    pub title: String,
    pub document: TranscriptDocument,
    pub audio: Result<AudioAsset>,
}

/// Audio located and probed on disk
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub duration: f64,
    pub used_fallback: bool,
}

pub fn load_transcript(path: &Path) -> Result<TranscriptDocument> {
    let raw = std::fs::read_to_string(path).map_err(|err| {
        PlayerError::asset(format!("failed to read transcript {}: {}", path.display(), err))
    })?;
    let document: TranscriptDocument = serde_json::from_str(&raw).map_err(|err| {
        PlayerError::asset(format!("failed to parse transcript {}: {}", path.display(), err))
    })?;
    debug!(path = %path.display(), lines = document.transcript.len(), "transcript parsed");
    Ok(document)
}

/// Probe `primary`; on failure try `fallback` exactly once before giving up.
pub fn resolve_audio(primary: &Path, fallback: Option<&Path>) -> Result<AudioAsset> {
    let primary_err = match probe_duration(primary) {
        Ok(duration) => {
            return Ok(AudioAsset {
                path: primary.to_path_buf(),
                duration,
                used_fallback: false,
            })
        }
        Err(err) => err,
    };
    let Some(fallback) = fallback.filter(|fallback| *fallback != primary) else {
        return Err(primary_err);
    };
    warn!(
        error = %primary_err,
        fallback = %fallback.display(),
        "audio load failed; trying fallback"
    );
    let duration = probe_duration(fallback).map_err(|err| {
        PlayerError::asset(format!(
            "audio unavailable: {}; fallback also failed: {}",
            primary_err, err
        ))
    })?;
    Ok(AudioAsset {
        path: fallback.to_path_buf(),
        duration,
        used_fallback: true,
    })
}

/// Duration in seconds of the first audio track in `path`.
///
/// Uses the container's frame count when it has one, otherwise sums packet durations.
pub fn probe_duration(path: &Path) -> Result<f64> {
    let file = File::open(path).map_err(|err| {
        PlayerError::asset(format!("failed to open audio {}: {}", path.display(), err))
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| {
            PlayerError::asset(format!("failed to probe audio {}: {}", path.display(), err))
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| PlayerError::asset(format!("no audio track in {}", path.display())))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        PlayerError::asset(format!("no sample rate in {}", path.display()))
    })?;
    let n_frames = track.codec_params.n_frames;

    let frames = match n_frames {
        Some(frames) => frames,
        None => {
            let mut frames = 0u64;
            loop {
                match format.next_packet() {
                    Ok(packet) if packet.track_id() == track_id => frames += packet.dur(),
                    Ok(_) => {}
                    Err(SymphoniaError::IoError(err))
                        if err.kind() == std::io::ErrorKind::UnexpectedEof =>
                    {
                        break
                    }
                    Err(err) => {
                        return Err(PlayerError::asset(format!(
                            "failed to read audio {}: {}",
                            path.display(),
                            err
                        )))
                    }
                }
            }
            frames
        }
    };

    let duration = frames as f64 / sample_rate as f64;
    if !duration.is_finite() || duration <= 0.0 {
        return Err(PlayerError::asset(format!(
            "audio {} has no playable length",
            path.display()
        )));
    }
    debug!(path = %path.display(), duration, sample_rate, "audio probed");
    Ok(duration)
}
