//! JSON board layouts.
//!
//! A layout describes a board before any robot moves: its size, the board
//! elements and walls of each space, the antenna, the reboot station and the
//! starting spaces handed out to joining players.
//!
//! ```json
//! {
//!   "name": "Dizzy Highway",
//!   "width": 10, "height": 8,
//!   "antenna": { "pos": { "x": 0, "y": 4 }, "heading": "east" },
//!   "reboot_station": { "x": 9, "y": 0 },
//!   "spaces": [
//!     { "x": 4, "y": 2, "walls": ["north"],
//!       "actions": [{ "type": "conveyor_belt", "heading": "south" }] },
//!     { "x": 6, "y": 5, "pit": true }
//!   ],
//!   "starts": [{ "x": 1, "y": 1, "heading": "east" }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::board::{Antenna, Board, FieldAction, Heading, Pos};
use crate::config::GameConfig;
use crate::controller::{GameController, MAX_PLAYERS};

/// Errors that can occur while loading a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("failed to read layout file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid layout JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("board must be at least 1x1, got {width}x{height}")]
    EmptyBoard { width: usize, height: usize },

    #[error("{what} at ({x}, {y}) lies outside the board")]
    OutOfBounds { what: &'static str, x: usize, y: usize },

    #[error("duplicate entry for space ({x}, {y})")]
    DuplicateSpace { x: usize, y: usize },

    #[error("starting space ({x}, {y}) is listed twice")]
    DuplicateStart { x: usize, y: usize },

    #[error("starting space ({x}, {y}) is a pit")]
    StartOnPit { x: usize, y: usize },

    #[error("layout has {0} starting spaces, at most {max} are allowed", max = MAX_PLAYERS)]
    TooManyStarts(usize),

    #[error("checkpoint ids must be 1..={count} without gaps, found {found:?}")]
    CheckpointIds { count: usize, found: Vec<u32> },
}

/// Board elements of one space. Spaces not listed are plain floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceLayout {
    pub x: usize,
    pub y: usize,
    #[serde(default)]
    pub actions: Vec<FieldAction>,
    #[serde(default)]
    pub walls: Vec<Heading>,
    #[serde(default)]
    pub pit: bool,
}

/// A space a robot may start on, with its initial heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPosition {
    pub x: usize,
    pub y: usize,
    pub heading: Heading,
}

impl StartPosition {
    pub fn pos(&self) -> Pos {
        Pos::new(self.x, self.y)
    }
}

/// A board description as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    #[serde(default)]
    pub name: String,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub antenna: Option<Antenna>,
    #[serde(default)]
    pub reboot_station: Option<Pos>,
    #[serde(default)]
    pub spaces: Vec<SpaceLayout>,
    #[serde(default)]
    pub starts: Vec<StartPosition>,
}

impl BoardLayout {
    /// Parses and validates a layout.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let layout: BoardLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Reads, parses and validates a layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    fn check_bounds(&self, what: &'static str, x: usize, y: usize) -> Result<(), LayoutError> {
        if self.contains(x, y) {
            Ok(())
        } else {
            Err(LayoutError::OutOfBounds { what, x, y })
        }
    }

    /// Checks everything `build_board` relies on.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.width == 0 || self.height == 0 {
            return Err(LayoutError::EmptyBoard {
                width: self.width,
                height: self.height,
            });
        }
        if let Some(antenna) = self.antenna {
            self.check_bounds("antenna", antenna.pos.x, antenna.pos.y)?;
        }
        if let Some(station) = self.reboot_station {
            self.check_bounds("reboot station", station.x, station.y)?;
        }

        let mut seen = std::collections::HashSet::new();
        let mut checkpoints = Vec::new();
        for space in &self.spaces {
            self.check_bounds("space", space.x, space.y)?;
            if !seen.insert((space.x, space.y)) {
                return Err(LayoutError::DuplicateSpace { x: space.x, y: space.y });
            }
            checkpoints.extend(space.actions.iter().filter_map(|a| match a {
                FieldAction::Checkpoint { id } => Some(*id),
                _ => None,
            }));
        }
        checkpoints.sort_unstable();
        let count = checkpoints.len();
        if checkpoints.iter().zip(1u32..).any(|(&id, expected)| id != expected) {
            return Err(LayoutError::CheckpointIds { count, found: checkpoints });
        }

        if self.starts.len() > MAX_PLAYERS {
            return Err(LayoutError::TooManyStarts(self.starts.len()));
        }
        let mut taken = std::collections::HashSet::new();
        for start in &self.starts {
            self.check_bounds("starting space", start.x, start.y)?;
            if !taken.insert((start.x, start.y)) {
                return Err(LayoutError::DuplicateStart { x: start.x, y: start.y });
            }
            let on_pit = self
                .spaces
                .iter()
                .any(|s| s.x == start.x && s.y == start.y && s.pit);
            if on_pit {
                return Err(LayoutError::StartOnPit { x: start.x, y: start.y });
            }
        }
        Ok(())
    }

    /// Builds the board. The layout must have passed `validate`.
    pub fn build_board(&self) -> Board {
        let mut board = Board::new(self.width, self.height);
        if let Some(antenna) = self.antenna {
            board.antenna = antenna;
        }
        if let Some(station) = self.reboot_station {
            board.reboot_station = station;
        }
        for entry in &self.spaces {
            let pos = Pos::new(entry.x, entry.y);
            for &action in &entry.actions {
                board.add_action(pos, action);
            }
            let space = board.space_mut(pos);
            for &wall in &entry.walls {
                space.add_wall(wall);
            }
            space.pit = entry.pit;
        }
        board
    }

    /// Builds a controller and seats one robot per name on the starting
    /// spaces, in listing order. Names beyond the starting spaces are ignored.
    pub fn new_game(&self, config: GameConfig, players: &[(&str, &str)]) -> GameController {
        let mut gc = GameController::new(self.build_board(), config);
        for (&(name, color), start) in players.iter().zip(&self.starts) {
            if gc.add_player(name, color, start.pos(), start.heading).is_none() {
                tracing::warn!(name, x = start.x, y = start.y, "could not seat player");
            }
        }
        gc
    }
}

/// Default robot names and colours for drivers that do not name players.
pub const ROBOT_NAMES: [(&str, &str); MAX_PLAYERS] = [
    ("Hammer Bot", "red"),
    ("Hulk x90", "green"),
    ("Smash Bot", "blue"),
    ("Spin Bot", "orange"),
    ("Twonky", "grey"),
    ("Zoom Bot", "magenta"),
];
