//! ironrally -- a robot racing rules engine driven over a line protocol.
//!
//! This binary reads instructions from stdin and writes replies to stdout.
//! Diagnostics go to stderr through `tracing`; set `RUST_LOG` to see them.

use std::io::{self, BufRead};

use ironrally::engine::Engine;
use ironrally::protocol::parse_instruction;
use tracing_subscriber::EnvFilter;

/// Runs the main protocol loop, reading instructions from stdin
/// and writing replies to stdout.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let mut engine = Engine::new();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };

        let instruction = match parse_instruction(&line) {
            Some(i) => i,
            None => continue,
        };

        match engine.handle(instruction, &mut out) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                tracing::error!(%e, "failed to write reply");
                break;
            }
        }
    }
}
