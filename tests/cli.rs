use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TRANSCRIPT: &str = r#"{
    "title": "Quick drill",
    "transcript": [
        {"time": 0.0, "text": "the cat sat down quickly",
         "words": [{"text": "the", "start": 0.0, "end": 0.2},
                   {"text": "cat", "start": 0.3, "end": 0.5},
                   {"text": "sat", "start": 0.6, "end": 0.8},
                   {"text": "down", "start": 0.9, "end": 1.1},
                   {"text": "quickly", "start": 1.2, "end": 1.8}]},
        {"time": 2.0, "text": "Plain second line\nwith a translation below"}
    ]
}"#;

fn fixture() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("lesson.json");
    fs::write(&path, TRANSCRIPT).unwrap();
    (dir, path)
}

fn echoline() -> Command {
    Command::cargo_bin("echoline").unwrap()
}

#[test]
fn info_summarises_the_article() {
    let (_dir, path) = fixture();
    echoline()
        .arg("info")
        .arg("--transcript")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Title: Quick drill"))
        .stdout(predicate::str::contains("Sentences: 2"))
        .stdout(predicate::str::contains("Words: 8"))
        .stdout(predicate::str::contains("Audio: unavailable"));
}

#[test]
fn cloze_prints_blanks() {
    let (_dir, path) = fixture();
    echoline()
        .arg("cloze")
        .arg("--transcript")
        .arg(&path)
        .args(["--seed", "11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[00:00] the ____ ____ ____ ____"))
        .stdout(predicate::str::contains("[00:02] Plain second line"));
}

#[test]
fn replay_streams_json_events() {
    let (_dir, path) = fixture();
    echoline()
        .arg("replay")
        .arg("--transcript")
        .arg(&path)
        .args(["--duration", "4", "--tick", "0.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""event":"play_state_changed""#))
        .stdout(predicate::str::contains(r#""event":"sentence_activated","data":1"#))
        .stdout(predicate::str::contains(r#""event":"progress_changed""#));
}

#[test]
fn replay_single_sentence_stops_on_its_own() {
    let (_dir, path) = fixture();
    echoline()
        .arg("replay")
        .arg("--transcript")
        .arg(&path)
        .args(["--duration", "4", "--sentence", "0", "--until", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""data":{"playing":true,"sentence":0}"#))
        .stdout(predicate::str::contains(r#""data":{"playing":false,"sentence":null}"#));
}

#[test]
fn replay_without_audio_needs_a_duration() {
    let (_dir, path) = fixture();
    echoline()
        .arg("replay")
        .arg("--transcript")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""event":"asset_failed""#))
        .stderr(predicate::str::contains("--duration"));
}

#[test]
fn missing_source_fails() {
    echoline()
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--transcript"));
}
