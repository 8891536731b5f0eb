//! Self-play match simulation CLI.
//!
//! Plays random-program matches on a board layout and outputs one JSON
//! summary per match (JSONL).
//!
//! Usage:
//!   cargo run --release --bin selfplay -- --layout FILE [OPTIONS]
//!
//! Options:
//!   --layout FILE   Board layout JSON (required)
//!   --config FILE   Rules config JSON (default: built-in rules)
//!   --games N       Number of matches to play (default: 10)
//!   --players N     Robots per match, 0 for one per start (default: 0)
//!   --max-rounds N  Rounds before a match is abandoned (default: 50)
//!   --buy-chance P  Chance to try an upgrade purchase per round (default: 0.3)
//!   --threads N     Number of parallel threads (default: 4)
//!   --seed N        Random seed, 0 for entropy (default: 0)
//!   --output FILE   Output file path (default: stdout)
//!   --quiet         Suppress summary output

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process;
use std::str::FromStr;
use std::time::Instant;

use ironrally::config::GameConfig;
use ironrally::protocol::BoardLayout;
use ironrally::selfplay::{self, SelfPlayConfig};
use tracing_subscriber::EnvFilter;

/// Parses the value following flag `args[*i]`, exiting with usage on failure.
fn value<T: FromStr>(args: &[String], i: &mut usize) -> T {
    let flag = &args[*i];
    *i += 1;
    match args.get(*i).map(|s| s.parse::<T>()) {
        Some(Ok(v)) => v,
        _ => {
            eprintln!("invalid {} value", flag);
            print_usage();
            process::exit(1);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut config = SelfPlayConfig::default();
    let mut layout_path: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut output_path: Option<String> = None;
    let mut quiet = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--layout" => layout_path = Some(value(&args, &mut i)),
            "--config" => config_path = Some(value(&args, &mut i)),
            "--games" => config.num_games = value(&args, &mut i),
            "--players" => config.players = value(&args, &mut i),
            "--max-rounds" => config.max_rounds = value(&args, &mut i),
            "--buy-chance" => config.buy_chance = value(&args, &mut i),
            "--threads" => config.threads = value(&args, &mut i),
            "--seed" => config.seed = value(&args, &mut i),
            "--output" => output_path = Some(value(&args, &mut i)),
            "--quiet" => quiet = true,
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(layout_path) = layout_path else {
        eprintln!("--layout is required");
        print_usage();
        process::exit(1);
    };
    let layout = match BoardLayout::load(&layout_path) {
        Ok(layout) => layout,
        Err(e) => {
            eprintln!("{}: {}", layout_path, e);
            process::exit(1);
        }
    };
    if let Some(path) = config_path {
        match GameConfig::load(&path) {
            Ok(game) => config.game = game,
            Err(e) => {
                eprintln!("{}: {}", path, e);
                process::exit(1);
            }
        }
    }

    if !quiet {
        eprintln!(
            "Self-play: {} matches on '{}', max {} rounds, {} threads",
            config.num_games, layout.name, config.max_rounds, config.threads
        );
    }

    let start = Instant::now();
    let records = match selfplay::run_self_play(&config, &layout) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let elapsed = start.elapsed();

    if !quiet {
        eprintln!(
            "Completed {} matches in {:.1}s",
            records.len(),
            elapsed.as_secs_f64()
        );
        selfplay::print_summary(&records);
    }

    let written = match output_path {
        Some(path) => File::create(&path).and_then(|file| {
            selfplay::write_jsonl(&records, &mut BufWriter::new(file))?;
            if !quiet {
                eprintln!("Wrote {} matches to {}", records.len(), path);
            }
            Ok(())
        }),
        None => selfplay::write_jsonl(&records, &mut BufWriter::new(io::stdout().lock())),
    };
    if let Err(e) = written {
        eprintln!("failed to write output: {}", e);
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("Usage: selfplay --layout FILE [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --layout FILE     Board layout JSON (required)");
    eprintln!("  --config FILE     Rules config JSON (default: built-in rules)");
    eprintln!("  --games N         Number of matches to play (default: 10)");
    eprintln!("  --players N       Robots per match, 0 for one per start (default: 0)");
    eprintln!("  --max-rounds N    Rounds before a match is abandoned (default: 50)");
    eprintln!("  --buy-chance P    Chance to try an upgrade purchase per round (default: 0.3)");
    eprintln!("  --threads N       Number of parallel threads (default: 4)");
    eprintln!("  --seed N          Random seed, 0 for entropy (default: 0)");
    eprintln!("  --output FILE     Output file path (default: stdout)");
    eprintln!("  --quiet           Suppress summary output");
    eprintln!("  --help            Show this help");
}
