//! Engine state management for the line protocol.
//!
//! Holds the current match and the options for the next one, and turns
//! parsed `Instruction`s into controller calls. Every handler writes its
//! reply lines to the given writer:
//!
//! - `event <json>` for each event the instruction produced
//! - `state <json>` for the `state` instruction
//! - `ok` or `rejected` once the instruction is done
//! - `error <message>` if it could not be carried out at all

use std::io::{self, Write};

use crate::config::{ConfigError, GameConfig};
use crate::controller::GameController;
use crate::protocol::{BoardLayout, GameSnapshot, Instruction, LayoutError, SnapshotError, ROBOT_NAMES};
use crate::resolve::{CardSlot, StepError};

/// Errors reported to the driver as `error <message>`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no game loaded, send 'newgame' first")]
    NoGame,

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Step(#[from] StepError),

    #[error("failed to read '{path}': {source}")]
    Read { path: String, source: io::Error },
}

/// Holds the mutable state of the engine between instructions.
#[derive(Default)]
pub struct Engine {
    pub config: GameConfig,
    pub game: Option<GameController>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    fn game(&mut self) -> Result<&mut GameController, EngineError> {
        self.game.as_mut().ok_or(EngineError::NoGame)
    }

    /// Loads a layout and seats `players` robots, or one per starting space.
    pub fn new_game(&mut self, layout: &str, players: Option<usize>) -> Result<bool, EngineError> {
        let layout = BoardLayout::load(layout)?;
        let seats = players
            .unwrap_or(layout.starts.len())
            .min(layout.starts.len())
            .min(ROBOT_NAMES.len());
        let gc = layout.new_game(self.config.clone(), &ROBOT_NAMES[..seats]);
        tracing::info!(board = %layout.name, players = gc.players.len(), "new game");
        self.game = Some(gc);
        Ok(true)
    }

    /// Replaces the current match with one restored from a snapshot file.
    pub fn load(&mut self, path: &str) -> Result<bool, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::Read {
            path: path.to_string(),
            source,
        })?;
        let gc = GameController::restore(GameSnapshot::from_json(&text)?)?;
        self.config = gc.config.clone();
        self.game = Some(gc);
        Ok(true)
    }

    /// Options apply to the next `newgame`.
    pub fn set_option(&mut self, name: &str, value: Option<&str>) -> Result<bool, EngineError> {
        self.config.set_option(name, value)?;
        Ok(true)
    }

    /// Moves hand cards `cards[k]` into register `k`. Either every card is
    /// placed or the player's cards are left untouched.
    pub fn program(&mut self, player: usize, cards: &[usize]) -> Result<bool, EngineError> {
        let gc = self.game()?;
        let Some(p) = gc.players.get(player) else {
            return Ok(false);
        };
        let (hand, registers) = (p.hand.clone(), p.registers);
        for (register, &index) in cards.iter().enumerate() {
            if !gc.move_cards(CardSlot::hand(player, index), CardSlot::register(player, register)) {
                gc.players[player].hand = hand;
                gc.players[player].registers = registers;
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Dispatches one instruction. Returns false once the driver asked to quit.
    pub fn handle<W: Write>(&mut self, instruction: Instruction, out: &mut W) -> io::Result<bool> {
        let result = match instruction {
            Instruction::Quit => return Ok(false),
            Instruction::State => return self.handle_state(out).map(|_| true),
            Instruction::NewGame { layout, players } => self.new_game(&layout, players),
            Instruction::Load { path } => self.load(&path),
            Instruction::SetOption { name, value } => self.set_option(&name, value.as_deref()),
            Instruction::Program { player, cards } => self.program(player, &cards),
            Instruction::Start => self.game().map(|gc| {
                gc.start_programming_phase();
                true
            }),
            Instruction::Finish => self.game().map(|gc| gc.finish_programming_phase()),
            Instruction::Step => self.game().and_then(|gc| Ok(gc.execute_step().map(|_| true)?)),
            Instruction::Run => self.game().and_then(|gc| {
                let ran = if gc.config.step_mode {
                    gc.execute_step()
                } else {
                    gc.execute_programs()
                };
                Ok(ran.map(|_| true)?)
            }),
            Instruction::Choose(command) => self.game().map(|gc| gc.make_choice(command)),
            Instruction::Shop => self.game().map(|gc| gc.open_upgrade_shop()),
            Instruction::CloseShop => self.game().map(|gc| gc.close_upgrade_shop()),
            Instruction::Buy { slot, player: None } => self.game().map(|gc| gc.buy_upgrade(slot)),
            Instruction::Buy { slot, player: Some(id) } => self.game().map(|gc| gc.buy_upgrade_for(id, slot)),
            Instruction::Toggle { player, index } => {
                self.game().map(|gc| gc.toggle_upgrade(player, index).is_some())
            }
            Instruction::ClearLasers => self.game().map(|gc| {
                gc.clear_lasers();
                true
            }),
        };

        self.flush_events(out)?;
        match result {
            Ok(true) => writeln!(out, "ok")?,
            Ok(false) => writeln!(out, "rejected")?,
            Err(e) => {
                tracing::warn!(%e, "instruction failed");
                writeln!(out, "error {}", e)?;
            }
        }
        out.flush()?;
        Ok(true)
    }

    /// Writes the current snapshot as a single JSON line.
    fn handle_state<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        match &self.game {
            Some(gc) => writeln!(out, "state {}", gc.snapshot().to_json())?,
            None => writeln!(out, "error {}", EngineError::NoGame)?,
        }
        out.flush()
    }

    fn flush_events<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        let Some(gc) = self.game.as_mut() else {
            return Ok(());
        };
        for event in gc.drain_events() {
            writeln!(out, "event {}", serde_json::to_string(&event)?)?;
        }
        Ok(())
    }
}
