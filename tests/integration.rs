//! Integration tests for the ironrally engine binary.
//!
//! Tests full protocol sessions by spawning the engine process, sending
//! instructions via stdin, and verifying stdout replies.

use std::io::{BufRead, Write};
use std::process::{Command, Stdio};

use ironrally::protocol::GameSnapshot;

/// Sends a sequence of instructions to the engine and collects stdout lines.
fn run_engine(instructions: &[&str]) -> Vec<String> {
    let exe = env!("CARGO_BIN_EXE_ironrally");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start ironrally");

    let mut stdin = child.stdin.take().unwrap();
    let stdout = child.stdout.take().unwrap();
    let reader = std::io::BufReader::new(stdout);

    for line in instructions {
        writeln!(stdin, "{}", line).unwrap();
    }
    stdin.flush().unwrap();
    drop(stdin);

    let lines: Vec<String> = reader.lines().map(|l| l.unwrap()).collect();
    let status = child.wait().expect("failed to wait on child");
    assert!(status.success());
    lines
}

fn sprint_layout() -> String {
    format!("{}/tests/fixtures/sprint.json", env!("CARGO_MANIFEST_DIR"))
}

/// Replies without the event lines.
fn replies(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(String::as_str)
        .filter(|l| !l.starts_with("event "))
        .collect()
}

/// Parses the last `state` line of a session.
fn last_state(lines: &[String]) -> GameSnapshot {
    let line = lines
        .iter()
        .rev()
        .find_map(|l| l.strip_prefix("state "))
        .expect("no state line");
    GameSnapshot::from_json(line).unwrap()
}

#[test]
fn unknown_instructions_are_ignored() {
    let lines = run_engine(&["foobar", "nonsense", "quit"]);
    assert!(lines.is_empty());
}

#[test]
fn empty_lines_are_ignored() {
    let lines = run_engine(&["", "  ", "state", "quit"]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error no game loaded"));
}

#[test]
fn newgame_seats_one_robot_per_start() {
    let layout = sprint_layout();
    let lines = run_engine(&[format!("newgame {}", layout).as_str(), "state", "quit"]);
    assert_eq!(lines[0], "ok");
    let state = last_state(&lines);
    assert_eq!(state.players.len(), 4);
    assert_eq!(state.board.width, 8);
    assert_eq!(state.board.checkpoints, 2);
}

#[test]
fn newgame_with_player_count() {
    let layout = sprint_layout();
    let lines = run_engine(&[format!("newgame {} 2", layout).as_str(), "state", "quit"]);
    assert_eq!(last_state(&lines).players.len(), 2);
}

#[test]
fn newgame_missing_file_is_an_error() {
    let lines = run_engine(&["newgame /nonexistent/board.json", "quit"]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("error failed to read layout file"));
}

#[test]
fn setoption_applies_to_the_next_game() {
    let layout = sprint_layout();
    let lines = run_engine(&[
        "setoption name HandSize value 9",
        "setoption name Seed value 7",
        format!("newgame {} 2", layout).as_str(),
        "start",
        "state",
        "quit",
    ]);
    let state = last_state(&lines);
    assert_eq!(state.config.hand_size, 9);
    assert_eq!(state.config.seed, 7);
    assert!(state.players.iter().all(|p| p.hand.len() == 9));
}

#[test]
fn finish_is_rejected_until_programs_are_complete() {
    let layout = sprint_layout();
    let lines = run_engine(&[
        format!("newgame {} 2", layout).as_str(),
        "start",
        "finish",
        "program 0 0 1 2 3 4",
        "finish",
        "program 1 4 3 2 1 0",
        "finish",
        "quit",
    ]);
    assert_eq!(
        replies(&lines),
        vec!["ok", "ok", "rejected", "ok", "rejected", "ok", "ok"]
    );
}

#[test]
fn full_round_returns_to_programming() {
    let layout = sprint_layout();
    let mut session = vec![
        "setoption name Seed value 3".to_string(),
        format!("newgame {} 2", layout),
        "start".to_string(),
        "program 0 0 1 2 3 4".to_string(),
        "program 1 0 1 2 3 4".to_string(),
        "finish".to_string(),
    ];
    // Answer any choice card with a left turn.
    for _ in 0..10 {
        session.push("run".to_string());
        session.push("choose left".to_string());
    }
    session.push("state".to_string());
    session.push("quit".to_string());
    let refs: Vec<&str> = session.iter().map(String::as_str).collect();

    let lines = run_engine(&refs);
    let state = last_state(&lines);
    assert!(lines.iter().any(|l| l.contains("\"event\":\"phase_changed\",\"phase\":\"activation\"")));
    assert!(
        state.board.phase != ironrally::board::Phase::Activation,
        "round should have ended"
    );
}

#[test]
fn step_reports_error_outside_activation() {
    let layout = sprint_layout();
    let lines = run_engine(&[format!("newgame {}", layout).as_str(), "step", "quit"]);
    assert!(lines[1].starts_with("error step execution requires the activation phase"));
}

#[test]
fn shop_opens_and_closes() {
    let layout = sprint_layout();
    let lines = run_engine(&[
        format!("newgame {} 2", layout).as_str(),
        "shop",
        "start",
        "shop",
        "shop",
        "closeshop",
        "buy 9 0",
        "quit",
    ]);
    assert_eq!(
        replies(&lines),
        vec!["ok", "rejected", "ok", "ok", "rejected", "ok", "rejected"]
    );
}

#[test]
fn saved_state_loads_back() {
    let layout = sprint_layout();
    let first = run_engine(&[
        "setoption name Seed value 5",
        format!("newgame {} 3", layout).as_str(),
        "start",
        "state",
        "quit",
    ]);
    let saved = last_state(&first);

    let path = std::env::temp_dir().join(format!("ironrally-save-{}.json", std::process::id()));
    std::fs::write(&path, saved.to_json()).unwrap();
    let second = run_engine(&[format!("load {}", path.display()).as_str(), "state", "quit"]);
    std::fs::remove_file(&path).ok();

    assert_eq!(second[0], "ok");
    assert_eq!(last_state(&second), saved);
}
