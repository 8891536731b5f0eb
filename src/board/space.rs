//! Board spaces and the hazard effects placed on them.
//!
//! A space owns an ordered list of `FieldAction`s. The actions themselves are
//! plain data; activating them is the job of `resolve::field`.

use serde::{Deserialize, Serialize};

use super::heading::{Heading, Pos};
use super::player::PlayerId;

/// Rotation sense of a gear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    /// Number of clockwise quarter turns this rotation applies.
    pub const fn quarter_turns(self) -> i32 {
        match self {
            Rotation::Clockwise => 1,
            Rotation::CounterClockwise => 3,
        }
    }
}

/// Which registers a push panel fires on (one-based register numbers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushParity {
    /// Registers 1, 3 and 5.
    Odd,
    /// Registers 2 and 4.
    Even,
}

impl PushParity {
    /// Returns true if a panel with this parity fires on the zero-based `step`.
    pub const fn fires_on(self, step: usize) -> bool {
        let register = step + 1;
        match self {
            PushParity::Odd => register % 2 == 1,
            PushParity::Even => register % 2 == 0,
        }
    }
}

/// A hazard or board element acting on the robot standing on its space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldAction {
    /// Moves the robot one space along `heading` without pushing.
    ConveyorBelt { heading: Heading },
    /// Rotates the robot a quarter turn.
    Gear { rotation: Rotation },
    /// Pushes the robot along `heading` on registers matching `parity`.
    PushPanel { heading: Heading, parity: PushParity },
    /// Wall-mounted laser firing along `heading`, dealing `strength` damage.
    Laser { heading: Heading, strength: u8 },
    /// Numbered checkpoint; must be reached in order.
    Checkpoint { id: u32 },
    /// Grants one energy cube.
    EnergyCubeField,
}

impl FieldAction {
    /// Returns true for board lasers, which fire in their own pass.
    pub const fn is_laser(&self) -> bool {
        matches!(self, FieldAction::Laser { .. })
    }
}

/// A single square of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub pos: Pos,
    pub actions: Vec<FieldAction>,
    /// Sides of this space carrying a wall.
    pub walls: Vec<Heading>,
    pub pit: bool,
    /// Robot standing here. Kept in sync with `Player::pos` by the controller.
    #[serde(skip)]
    pub(crate) player: Option<PlayerId>,
}

impl Space {
    /// Creates an empty space.
    pub fn new(pos: Pos) -> Self {
        Space {
            pos,
            actions: Vec::new(),
            walls: Vec::new(),
            pit: false,
            player: None,
        }
    }

    /// Returns the robot occupying this space, if any.
    pub fn player(&self) -> Option<PlayerId> {
        self.player
    }

    /// Returns true if this space has a wall on its `heading` side.
    pub fn has_wall(&self, heading: Heading) -> bool {
        self.walls.contains(&heading)
    }

    /// Adds a wall on the given side. Duplicate walls are ignored.
    pub fn add_wall(&mut self, heading: Heading) {
        if !self.has_wall(heading) {
            self.walls.push(heading);
        }
    }

    /// Returns the checkpoint id on this space, if any.
    pub fn checkpoint(&self) -> Option<u32> {
        self.actions.iter().find_map(|a| match a {
            FieldAction::Checkpoint { id } => Some(*id),
            _ => None,
        })
    }
}
