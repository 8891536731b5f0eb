//! Random-program match simulation.
//!
//! Plays whole matches on a layout with every robot running a random program
//! each round, answering choice cards at random and occasionally buying an
//! upgrade. Used for soak testing the rules and for balance statistics.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::board::{Phase, PlayerId, NO_REGISTERS};
use crate::config::GameConfig;
use crate::controller::{GameController, GameEvent};
use crate::protocol::{BoardLayout, ROBOT_NAMES};
use crate::resolve::CardSlot;

/// Errors that stop a self-play run before any match is played.
#[derive(Debug, thiserror::Error)]
pub enum SelfPlayError {
    #[error("layout has {starts} starting spaces, {players} players requested")]
    NotEnoughStarts { starts: usize, players: usize },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Configuration for a self-play run.
#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    /// Number of matches to play.
    pub num_games: usize,
    /// Robots per match; 0 seats one per starting space.
    pub players: usize,
    /// Rounds after which an unfinished match is abandoned.
    pub max_rounds: usize,
    /// Chance per robot and round to try buying a random shop card.
    pub buy_chance: f64,
    /// Number of parallel threads for concurrent matches.
    pub threads: usize,
    /// Random seed (0 = use entropy). Match `i` uses `seed + i`.
    pub seed: u64,
    /// Rules applied to every match. Its seed is overridden per match.
    pub game: GameConfig,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        SelfPlayConfig {
            num_games: 10,
            players: 0,
            max_rounds: 50,
            buy_chance: 0.3,
            threads: 4,
            seed: 0,
            game: GameConfig::default(),
        }
    }
}

/// Summary of one simulated match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub game_id: usize,
    /// Name of the robot that reached the last checkpoint.
    pub winner: Option<String>,
    pub rounds: usize,
    /// Checkpoints collected per robot, in seating order.
    pub checkpoints: Vec<u32>,
    pub reboots: usize,
    pub laser_hits: usize,
    pub damage_cards: usize,
    pub upgrades_bought: usize,
    /// Set when the match stopped because no program could be completed.
    pub stalled: bool,
}

#[derive(Default)]
struct Tally {
    reboots: usize,
    laser_hits: usize,
    damage_cards: usize,
}

impl Tally {
    fn count(&mut self, events: Vec<GameEvent>) {
        for event in events {
            match event {
                GameEvent::Rebooted { .. } => self.reboots += 1,
                GameEvent::LaserHit { deflected: false, .. } => self.laser_hits += 1,
                GameEvent::Damaged { .. } => self.damage_cards += 1,
                _ => {}
            }
        }
    }
}

/// Fills every register of `id` with randomly picked hand cards.
fn random_program(gc: &mut GameController, id: PlayerId, rng: &mut SmallRng) {
    let mut held: Vec<usize> = gc.players[id]
        .hand
        .iter()
        .enumerate()
        .filter(|(_, f)| f.card.is_some())
        .map(|(i, _)| i)
        .collect();
    held.shuffle(rng);
    for (register, &hand) in held.iter().take(NO_REGISTERS).enumerate() {
        gc.move_cards(CardSlot::hand(id, hand), CardSlot::register(id, register));
    }
}

/// Runs register activation until the round ends, picking random options
/// for every choice card on the way.
fn play_activation(gc: &mut GameController, rng: &mut SmallRng) -> Result<(), crate::resolve::StepError> {
    gc.execute_programs()?;
    while gc.board.phase == Phase::PlayerInteraction {
        let pending = gc
            .board
            .current_player
            .and_then(|id| gc.players[id].registers[gc.board.step].card);
        let Some(&choice) = pending.and_then(|c| c.command.options().choose(rng)) else {
            break;
        };
        gc.make_choice(choice);
        if gc.board.phase == Phase::Activation {
            gc.execute_programs()?;
        }
    }
    Ok(())
}

/// Plays a single match and returns its record.
pub fn play_match(
    config: &SelfPlayConfig,
    layout: &BoardLayout,
    game_id: usize,
    rng: &mut SmallRng,
) -> MatchRecord {
    let seats = if config.players == 0 {
        layout.starts.len()
    } else {
        config.players.min(layout.starts.len())
    };
    let game = GameConfig {
        seed: rng.gen_range(1..u64::MAX),
        ..config.game.clone()
    };
    let mut gc = layout.new_game(game, &ROBOT_NAMES[..seats.min(ROBOT_NAMES.len())]);
    let mut tally = Tally::default();
    let mut upgrades_bought = 0;
    let mut stalled = false;
    let mut rounds = 0;

    gc.start_programming_phase();
    while rounds < config.max_rounds && gc.board.phase == Phase::Programming {
        rounds += 1;
        for id in 0..gc.players.len() {
            if rng.gen_bool(config.buy_chance.clamp(0.0, 1.0)) && !gc.board.shop.is_empty() {
                let slot = rng.gen_range(0..gc.board.shop.len());
                if gc.buy_upgrade_for(id, slot) {
                    upgrades_bought += 1;
                }
            }
            random_program(&mut gc, id, rng);
        }
        if !gc.finish_programming_phase() {
            stalled = true;
            break;
        }
        if let Err(err) = play_activation(&mut gc, rng) {
            tracing::warn!(game_id, %err, "activation stopped");
            break;
        }
        tally.count(gc.drain_events());
    }
    tally.count(gc.drain_events());

    MatchRecord {
        game_id,
        winner: gc.board.winner.map(|id| gc.players[id].name.clone()),
        rounds,
        checkpoints: gc.players.iter().map(|p| p.checkpoints).collect(),
        reboots: tally.reboots,
        laser_hits: tally.laser_hits,
        damage_cards: tally.damage_cards,
        upgrades_bought,
        stalled,
    }
}

fn match_rng(seed: u64, game_id: usize) -> SmallRng {
    if seed != 0 {
        SmallRng::seed_from_u64(seed.wrapping_add(game_id as u64))
    } else {
        SmallRng::from_entropy()
    }
}

/// Plays `config.num_games` matches and returns their records in game order.
///
/// When `config.threads > 1`, matches are played concurrently using rayon.
pub fn run_self_play(config: &SelfPlayConfig, layout: &BoardLayout) -> Result<Vec<MatchRecord>, SelfPlayError> {
    if config.players > layout.starts.len() {
        return Err(SelfPlayError::NotEnoughStarts {
            starts: layout.starts.len(),
            players: config.players,
        });
    }

    let completed = AtomicUsize::new(0);
    let play = |i: usize| {
        let start = Instant::now();
        let record = play_match(config, layout, i, &mut match_rng(config.seed, i));
        let n = completed.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::info!(
            game = n,
            of = config.num_games,
            winner = record.winner.as_deref().unwrap_or("none"),
            rounds = record.rounds,
            secs = start.elapsed().as_secs_f64(),
            "match finished"
        );
        record
    };

    if config.threads <= 1 {
        return Ok((0..config.num_games).map(play).collect());
    }

    use rayon::prelude::*;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.threads)
        .build()?;
    Ok(pool.install(|| (0..config.num_games).into_par_iter().map(play).collect()))
}

/// Writes match records as JSONL (one JSON object per match, one per line).
pub fn write_jsonl<W: Write>(records: &[MatchRecord], out: &mut W) -> std::io::Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        writeln!(out)?;
    }
    out.flush()
}

/// Prints a summary of self-play results to stderr.
pub fn print_summary(records: &[MatchRecord]) {
    let total = records.len().max(1) as f64;
    let finished = records.iter().filter(|r| r.winner.is_some()).count();
    let stalled = records.iter().filter(|r| r.stalled).count();
    let rounds: usize = records.iter().map(|r| r.rounds).sum();
    let reboots: usize = records.iter().map(|r| r.reboots).sum();
    let hits: usize = records.iter().map(|r| r.laser_hits).sum();
    let bought: usize = records.iter().map(|r| r.upgrades_bought).sum();

    eprintln!("=== Self-Play Summary ===");
    eprintln!("Matches: {}", records.len());
    eprintln!("Finished with a winner: {}", finished);
    eprintln!("Stalled: {}", stalled);
    eprintln!("Avg rounds/match: {:.1}", rounds as f64 / total);
    eprintln!("Avg reboots/match: {:.1}", reboots as f64 / total);
    eprintln!("Avg laser hits/match: {:.1}", hits as f64 / total);
    eprintln!("Avg upgrades bought/match: {:.1}", bought as f64 / total);

    let mut wins: Vec<(&str, usize)> = Vec::new();
    for name in records.iter().filter_map(|r| r.winner.as_deref()) {
        match wins.iter_mut().find(|(n, _)| *n == name) {
            Some((_, count)) => *count += 1,
            None => wins.push((name, 1)),
        }
    }
    wins.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, count) in wins {
        eprintln!("  {:>12}: {} ({:.1}%)", name, count, 100.0 * count as f64 / total);
    }
}
