//! The match controller.
//!
//! `GameController` owns the board, the robots and the turn order, and is the
//! only thing that mutates them. Rule resolution lives in `resolve`, spread
//! over `impl GameController` blocks; this module holds the state, the
//! occupancy mutator and the event log drivers read from.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Command, Heading, Player, PlayerId, Pos, Upgrade, ALL_UPGRADES};
use crate::config::GameConfig;

/// Most robots a single board takes.
pub const MAX_PLAYERS: usize = 6;

/// Something observable happened on the board.
///
/// Rendering and network layers drain these after each operation; the engine
/// never waits on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    Moved { player: PlayerId, from: Pos, to: Pos },
    Turned { player: PlayerId, heading: Heading },
    Rebooted { player: PlayerId, at: Pos },
    Damaged { player: PlayerId, card: Command },
    LaserHit { shooter: Option<PlayerId>, target: PlayerId, deflected: bool },
    CheckpointReached { player: PlayerId, checkpoint: u32 },
    EnergyGained { player: PlayerId, energy: u32 },
    PhaseChanged { phase: crate::board::Phase },
    Winner { player: PlayerId },
}

/// Runs one match: board, robots, turn order and the rules between them.
#[derive(Debug, Clone)]
pub struct GameController {
    pub board: Board,
    pub players: Vec<Player>,
    pub config: GameConfig,
    pub(crate) player_order: Vec<PlayerId>,
    pub(crate) upgrade_deck: Vec<Upgrade>,
    pub(crate) rng: SmallRng,
    events: Vec<GameEvent>,
}

impl GameController {
    /// Creates a controller for `board` with no robots yet.
    pub fn new(mut board: Board, config: GameConfig) -> Self {
        let mut rng = if config.seed != 0 {
            SmallRng::seed_from_u64(config.seed)
        } else {
            SmallRng::from_entropy()
        };
        board.count_checkpoints();
        board.step_mode = config.step_mode;
        let mut upgrade_deck = ALL_UPGRADES.to_vec();
        upgrade_deck.shuffle(&mut rng);
        GameController {
            board,
            players: Vec::new(),
            config,
            player_order: Vec::new(),
            upgrade_deck,
            rng,
            events: Vec::new(),
        }
    }

    /// Adds a robot on a free space. Returns `None` if the board is full,
    /// the space is taken or off the board, or the match already started.
    pub fn add_player(
        &mut self,
        name: impl Into<String>,
        color: impl Into<String>,
        pos: Pos,
        heading: Heading,
    ) -> Option<PlayerId> {
        if self.players.len() >= MAX_PLAYERS
            || !self.board.contains(pos)
            || self.board.space(pos).player().is_some()
            || self.board.phase != crate::board::Phase::Setup
        {
            return None;
        }
        let mut player = Player::new(name, color, pos, heading, self.config.hand_size, &mut self.rng);
        player.energy = self.config.starting_energy;
        let id = self.players.len();
        self.players.push(player);
        self.board.space_mut(pos).player = Some(id);
        self.player_order.push(id);
        Some(id)
    }

    /// Turn order computed at the start of the current round.
    pub fn player_order(&self) -> &[PlayerId] {
        &self.player_order
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id]
    }

    /// The robot standing on `pos`, if any.
    pub fn occupant(&self, pos: Pos) -> Option<PlayerId> {
        self.board.space(pos).player()
    }

    /// Moves a robot onto `pos`, clearing its previous space.
    ///
    /// Together with `lift_player` this is the only writer of occupancy:
    /// `Space::player` and `Player::pos` change together.
    pub(crate) fn place_player(&mut self, id: PlayerId, pos: Pos) {
        let from = self.players[id].pos;
        debug_assert!(
            self.board.space(pos).player().map_or(true, |p| p == id),
            "{:?} is occupied",
            pos
        );
        if self.board.space(from).player() == Some(id) {
            self.board.space_mut(from).player = None;
        }
        self.board.space_mut(pos).player = Some(id);
        self.players[id].pos = pos;
        if from != pos {
            self.emit(GameEvent::Moved { player: id, from, to: pos });
        }
    }

    /// Takes a robot off its space until the next `place_player` puts it
    /// down again. `Player::pos` keeps the old position meanwhile.
    pub(crate) fn lift_player(&mut self, id: PlayerId) {
        let pos = self.players[id].pos;
        if self.board.space(pos).player() == Some(id) {
            self.board.space_mut(pos).player = None;
        }
    }

    /// Gives a robot one damage card.
    pub(crate) fn deal_damage(&mut self, id: PlayerId, card: Command) {
        self.players[id].take_damage(card);
        tracing::debug!(player = %self.players[id].name, ?card, "took damage");
        self.emit(GameEvent::Damaged { player: id, card });
    }

    /// Returns true if the robot has the upgrade switched on.
    pub fn has_active_upgrade(&self, id: PlayerId, upgrade: Upgrade) -> bool {
        self.players[id].has_active_upgrade(upgrade)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Takes all events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clears the laser beams of the latest register.
    pub fn clear_lasers(&mut self) {
        self.board.lasers.clear();
    }

    pub(crate) fn set_phase(&mut self, phase: crate::board::Phase) {
        if self.board.phase != phase {
            tracing::debug!(?phase, "phase change");
            self.board.phase = phase;
            self.emit(GameEvent::PhaseChanged { phase });
        }
    }
}
