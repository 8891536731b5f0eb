//! Serializable match state for saving, resuming and display.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Phase, Player, PlayerId, Pos, Upgrade, NO_REGISTERS};
use crate::config::GameConfig;
use crate::controller::{GameController, MAX_PLAYERS};

/// Errors that can occur while restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("board has {found} spaces for a {width}x{height} grid")]
    SpaceCount { width: usize, height: usize, found: usize },

    #[error("snapshot has {0} players, at most {max} are allowed", max = MAX_PLAYERS)]
    TooManyPlayers(usize),

    #[error("player {0} stands outside the board")]
    PlayerOffBoard(PlayerId),

    #[error("players {0} and {1} share a space")]
    SharedSpace(PlayerId, PlayerId),

    #[error("turn order {0:?} is not a permutation of the players")]
    BadOrder(Vec<PlayerId>),

    #[error("player index {0} does not exist")]
    UnknownPlayer(PlayerId),

    #[error("{what} at ({x}, {y}) lies outside the board")]
    OutOfBounds { what: &'static str, x: usize, y: usize },

    #[error("register {step} does not exist in phase {phase:?}")]
    StepOutOfRange { step: usize, phase: Phase },
}

/// Everything needed to resume a match, minus the random generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub config: GameConfig,
    pub board: Board,
    pub players: Vec<Player>,
    pub player_order: Vec<PlayerId>,
    pub upgrade_deck: Vec<Upgrade>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> String {
        // Every field is plain data with string keys.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl GameController {
    /// Captures the current match state.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            config: self.config.clone(),
            board: self.board.clone(),
            players: self.players.clone(),
            player_order: self.player_order.clone(),
            upgrade_deck: self.upgrade_deck.clone(),
        }
    }

    /// Rebuilds a controller from a snapshot, re-deriving space occupancy
    /// from the players' positions. The random generator is reseeded from
    /// the snapshot's config.
    pub fn restore(snapshot: GameSnapshot) -> Result<Self, SnapshotError> {
        let GameSnapshot {
            config,
            mut board,
            players,
            player_order,
            upgrade_deck,
        } = snapshot;

        let (width, height) = (board.width, board.height);
        if width == 0 || width.checked_mul(height) != Some(board.spaces().len()) {
            return Err(SnapshotError::SpaceCount {
                width,
                height,
                found: board.spaces().len(),
            });
        }
        let landmarks: [(&'static str, Pos); 2] = [
            ("reboot station", board.reboot_station),
            ("antenna", board.antenna.pos),
        ];
        for (what, pos) in landmarks {
            if !board.contains(pos) {
                return Err(SnapshotError::OutOfBounds { what, x: pos.x, y: pos.y });
            }
        }
        if board.phase != Phase::Programming && board.step >= NO_REGISTERS {
            return Err(SnapshotError::StepOutOfRange {
                step: board.step,
                phase: board.phase,
            });
        }
        if players.len() > MAX_PLAYERS {
            return Err(SnapshotError::TooManyPlayers(players.len()));
        }
        let mut sorted = player_order.clone();
        sorted.sort_unstable();
        if !sorted.iter().copied().eq(0..players.len()) {
            return Err(SnapshotError::BadOrder(player_order));
        }
        for id in [board.current_player, board.winner].into_iter().flatten() {
            if id >= players.len() {
                return Err(SnapshotError::UnknownPlayer(id));
            }
        }

        board.clear_occupancy();
        for (id, player) in players.iter().enumerate() {
            if !board.contains(player.pos) {
                return Err(SnapshotError::PlayerOffBoard(id));
            }
            let space = board.space_mut(player.pos);
            if let Some(other) = space.player {
                return Err(SnapshotError::SharedSpace(other, id));
            }
            space.player = Some(id);
        }

        let mut gc = GameController::new(Board::new(1, 1), config);
        gc.board = board;
        gc.players = players;
        gc.player_order = player_order;
        gc.upgrade_deck = upgrade_deck;
        Ok(gc)
    }
}
