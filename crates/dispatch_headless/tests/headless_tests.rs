//! End-to-end tests for the headless runner.
//!
//! Drives full sessions through the JSON protocol, loads shipped and
//! temporary data files, and replays the bundled scripts.

use std::io::Write;
use std::path::PathBuf;

use dispatch_core::config::EngineConfig;
use dispatch_core::difficulty::Difficulty;
use dispatch_core::session::Phase;
use dispatch_core::view::Outcome;
use dispatch_headless::{
    load_config, load_config_or_default, load_script, GameRunner, HeadlessConfig,
    HeadlessRunner, LoadError, StrategyKind,
};
use serde_json::Value;
use tempfile::NamedTempFile;

fn workspace_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

fn run_session(config: HeadlessConfig, lines: &[&str]) -> Vec<Value> {
    let input = lines.join("\n");
    let mut output = Vec::new();
    HeadlessRunner::with_config(config)
        .run_with(input.as_bytes(), &mut output)
        .expect("in-memory streams do not fail");
    String::from_utf8(output)
        .expect("protocol output is UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("every line is JSON"))
        .collect()
}

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

// ==========================================================================
// Protocol Sessions
// ==========================================================================

#[test]
fn test_protocol_full_win() {
    let mut lines = vec![
        r#"{"cmd":"answer_call"}"#,
        r#"{"cmd":"start","difficulty":"easy"}"#,
    ];
    for _ in 0..5 {
        lines.push(r#"{"cmd":"dispatch","label":"R14"}"#);
        lines.push(r#"{"cmd":"wait","ms":15000}"#);
    }
    lines.push(r#"{"cmd":"query"}"#);

    let out = run_session(HeadlessConfig::default(), &lines);
    let state = out
        .iter()
        .rev()
        .find(|r| r["type"] == "state")
        .expect("query answered");

    assert_eq!(state["view"]["phase"], "won");
    assert_eq!(state["view"]["units_remaining"], 5);
    assert_eq!(state["view"]["summary"]["outcome"]["result"], "won");
    assert_eq!(state["now_ms"], 75_000);
    assert_eq!(out.last().unwrap()["type"], "bye");
}

#[test]
fn test_protocol_rejects_second_dispatch() {
    let out = run_session(
        HeadlessConfig::default(),
        &[
            r#"{"cmd":"answer_call"}"#,
            r#"{"cmd":"start","difficulty":"HARD"}"#,
            r#"{"cmd":"dispatch","x":3,"y":3}"#,
            r#"{"cmd":"dispatch","x":4,"y":4}"#,
        ],
    );
    let acks: Vec<&Value> = out
        .iter()
        .filter(|r| r["type"] == "ack" && r["cmd"] == "dispatch")
        .collect();
    assert_eq!(acks.len(), 2);
    assert_eq!(acks[0]["applied"], true);
    assert_eq!(acks[1]["applied"], false);
    assert!(acks[1]["reason"].is_string());
}

#[test]
fn test_protocol_manual_ticks_reach_timeout() {
    let out = run_session(
        HeadlessConfig::default(),
        &[
            r#"{"cmd":"answer_call"}"#,
            r#"{"cmd":"start","difficulty":"hard"}"#,
            r#"{"cmd":"clock","count":300}"#,
            r#"{"cmd":"query"}"#,
        ],
    );
    let state = out.iter().find(|r| r["type"] == "state").unwrap();
    assert_eq!(state["view"]["phase"], "lost");
    assert_eq!(
        state["view"]["summary"]["outcome"]["reason"],
        "time_expired"
    );
}

#[test]
fn test_protocol_debug_overlay() {
    let out = run_session(
        HeadlessConfig::default(),
        &[
            r#"{"cmd":"debug"}"#,
            r#"{"cmd":"answer_call"}"#,
            r#"{"cmd":"start","difficulty":"medium"}"#,
            r#"{"cmd":"debug"}"#,
            r#"{"cmd":"debug"}"#,
        ],
    );
    let debug: Vec<&Value> = out.iter().filter(|r| r["type"] == "debug").collect();
    assert_eq!(debug[0]["enabled"], true);
    assert!(debug[0].get("view").is_none(), "no overlay before play");
    assert_eq!(debug[1]["enabled"], false);
    assert_eq!(debug[2]["enabled"], true);
    assert_eq!(debug[2]["view"]["label"], "R14");
}

#[test]
fn test_protocol_hash_matches_across_sessions() {
    let script = [
        r#"{"cmd":"answer_call"}"#,
        r#"{"cmd":"start","difficulty":"medium"}"#,
        r#"{"cmd":"dispatch","x":5,"y":5}"#,
        r#"{"cmd":"advance","fraction":0.5}"#,
        r#"{"cmd":"wait","ms":12345}"#,
        r#"{"cmd":"hash"}"#,
    ];
    let first = run_session(HeadlessConfig::default(), &script);
    let second = run_session(HeadlessConfig::default(), &script);
    let hash = |out: &[Value]| out.iter().find(|r| r["type"] == "hash").unwrap()["hash"].clone();
    assert_eq!(hash(&first), hash(&second));
}

// ==========================================================================
// Data Loading
// ==========================================================================

#[test]
fn test_shipped_engine_data_matches_builtin() {
    let config = load_config(workspace_path("assets/data/engine.ron")).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_custom_config_from_temp_file() {
    let file = temp_file(
        "(transit_secs: 5, clues: [(id: 1, true_location: (x: 0, y: 0), acceptance_radius: 0.0)])",
    );
    let config = load_config_or_default(Some(file.path())).unwrap();
    assert_eq!(config.transit_secs, 5);
    assert_eq!(config.clues.len(), 1);

    let result = GameRunner::new(config)
        .autoplay(Difficulty::Hard, StrategyKind::Oracle)
        .unwrap();
    assert_eq!(result.summary.outcome, Outcome::Won);
    assert_eq!(result.summary.elapsed_secs, 4);
}

#[test]
fn test_invalid_config_is_reported() {
    let file = temp_file("(transit_secs: 0)");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, LoadError::Invalid(_)));
}

// ==========================================================================
// Scripts and Replays
// ==========================================================================

#[test]
fn test_bundled_scripts_play_to_their_outcome() {
    let cases = [
        ("scripts/easy_win.ron", Phase::Won),
        ("scripts/hard_loss.ron", Phase::Lost),
        ("scripts/medium_timeout.ron", Phase::Lost),
    ];
    for (path, expected) in cases {
        let replay = load_script(workspace_path(path)).unwrap();
        let game = replay.play(EngineConfig::default());
        assert_eq!(game.phase(), expected, "{path}");
    }
}

#[test]
fn test_recorded_autoplay_survives_disk_roundtrip() {
    let runner = GameRunner::default();
    let result = runner.autoplay(Difficulty::Easy, StrategyKind::Sweep).unwrap();

    let file = NamedTempFile::new().unwrap();
    result.replay.save(file.path()).unwrap();
    let loaded = load_script(file.path()).unwrap();
    assert_eq!(loaded, result.replay);

    let report = runner.verify_determinism(&loaded, 3);
    assert!(report.passed());
    assert_eq!(report.hashes[0], result.hash);
}

#[test]
fn test_missing_script() {
    let err = load_script(workspace_path("scripts/nope.ron")).unwrap_err();
    assert!(matches!(err, LoadError::FileNotFound(_)));
}
