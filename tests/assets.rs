use std::fs;
use std::path::Path;

use approx::assert_abs_diff_eq;
use echoline::assets::{probe_duration, resolve_audio, ArticleCatalog};
use echoline::ErrorKind;
use tempfile::TempDir;

const TRANSCRIPT: &str = r#"{
    "title": "Market day",
    "audioUrl": "audio/lesson.wav",
    "transcript": [
        {"time": 0.0, "text": "Stalls open early.", "translation": "Les stands ouvrent tôt.",
         "words": [{"text": "Stalls", "start": 0.0, "end": 0.4},
                   {"text": "open", "start": 0.5, "end": 0.8},
                   {"text": "early.", "start": 0.9, "end": 1.2}]},
        {"time": 1.4, "text": "Bread sells out fast."}
    ]
}"#;

fn write_wav(path: &Path, seconds: f64) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let frames = (seconds * spec.sample_rate as f64) as usize;
    for i in 0..frames {
        let sample = ((i as f64 * 0.05).sin() * 8_000.0) as i16;
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

fn write(dir: &TempDir, relative: &str, contents: &str) {
    let path = dir.path().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn probes_wav_duration() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tone.wav");
    write_wav(&path, 1.5);
    assert_abs_diff_eq!(probe_duration(&path).unwrap(), 1.5, epsilon = 1e-3);
}

#[test]
fn garbage_audio_is_an_asset_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.wav");
    fs::write(&path, b"definitely not audio").unwrap();
    assert_eq!(probe_duration(&path).unwrap_err().kind(), ErrorKind::Asset);
}

#[test]
fn audio_falls_back_once() {
    let dir = TempDir::new().unwrap();
    let fallback = dir.path().join("audio/lesson.wav");
    write_wav(&fallback, 2.0);
    let missing = dir.path().join("audio/missing.mp3");

    let asset = resolve_audio(&missing, Some(fallback.as_path())).unwrap();
    assert!(asset.used_fallback);
    assert_eq!(asset.path, fallback);
    assert_abs_diff_eq!(asset.duration, 2.0, epsilon = 1e-3);

    let err = resolve_audio(&missing, Some(missing.as_path())).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Asset);
}

#[test]
fn catalog_article_uses_catalog_title_and_fallback_audio() {
    let dir = TempDir::new().unwrap();
    write(
        &dir,
        "articles.json",
        r#"{"articles": [
            {"id": 1, "title": "第3篇 市场", "dataFile": "data/a1.json", "audioFile": "audio/missing.mp3"},
            {"id": "2", "title": "Second", "dataFile": "data/a2.json"}
        ]}"#,
    );
    write(&dir, "data/a1.json", TRANSCRIPT);
    write_wav(&dir.path().join("audio/lesson.wav"), 1.0);

    let catalog = ArticleCatalog::load(&dir.path().join("articles.json")).unwrap();
    assert_eq!(catalog.articles().len(), 2);
    assert_eq!(catalog.articles()[0].short_title(), "第3篇");

    let article = catalog.open(Some("1")).unwrap();
    assert_eq!(article.title, "第3篇 市场");
    assert_eq!(article.document.transcript.len(), 2);
    assert_eq!(article.document.word_count(), 7);
    let audio = article.audio.unwrap();
    assert!(audio.used_fallback);
    assert_abs_diff_eq!(audio.duration, 1.0, epsilon = 1e-3);
}

#[test]
fn missing_catalog_loads_single_article() {
    let dir = TempDir::new().unwrap();
    write(&dir, "data/article-2.json", TRANSCRIPT);

    let catalog = ArticleCatalog::load_or_single(&dir.path().join("articles.json"), Some("2"));
    let article = catalog.open(Some("2")).unwrap();
    assert_eq!(article.entry.id, "2");
    assert_eq!(article.title, "Market day");
    assert_eq!(article.audio.unwrap_err().kind(), ErrorKind::Asset);
}

#[test]
fn malformed_transcript_is_an_asset_error() {
    let dir = TempDir::new().unwrap();
    write(&dir, "lesson.json", "{ not json");
    let catalog = ArticleCatalog::for_transcript(&dir.path().join("lesson.json"));
    let err = catalog.open(None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Asset);
}
