//! Board state: the space grid, landmarks and the turn cursor.
//!
//! Spaces live in a flat arena indexed `y * width + x`. All geometry queries
//! (neighbours, walls, line of sight, antenna metrics) are answered here.

use serde::{Deserialize, Serialize};

use super::card::UpgradeCard;
use super::heading::{Heading, Pos};
use super::player::PlayerId;
use super::space::{FieldAction, Space};

/// The phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    Programming,
    Activation,
    PlayerInteraction,
    Upgrade,
    Finished,
}

/// A laser beam fired during the latest register. Cosmetic only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserTrace {
    pub heading: Heading,
    pub path: Vec<Pos>,
}

/// The priority antenna robots are ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Antenna {
    pub pos: Pos,
    pub heading: Heading,
}

/// Complete board state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub width: usize,
    pub height: usize,
    spaces: Vec<Space>,
    pub antenna: Antenna,
    pub reboot_station: Pos,
    /// Number of checkpoint actions on the board.
    pub checkpoints: u32,
    pub phase: Phase,
    pub step: usize,
    pub current_player: Option<PlayerId>,
    pub step_mode: bool,
    pub winner: Option<PlayerId>,
    pub lasers: Vec<LaserTrace>,
    pub shop: Vec<Option<UpgradeCard>>,
}

impl Board {
    /// Creates an empty board. The antenna defaults to the north-west corner
    /// facing east, the reboot station to the centre.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "board must have at least one space");
        let mut spaces = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                spaces.push(Space::new(Pos::new(x, y)));
            }
        }
        Board {
            width,
            height,
            spaces,
            antenna: Antenna {
                pos: Pos::new(0, 0),
                heading: Heading::East,
            },
            reboot_station: Pos::new(width / 2, height / 2),
            checkpoints: 0,
            phase: Phase::Setup,
            step: 0,
            current_player: None,
            step_mode: false,
            winner: None,
            lasers: Vec::new(),
            shop: Vec::new(),
        }
    }

    /// Returns true if `pos` lies on the board.
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    fn index(&self, pos: Pos) -> usize {
        debug_assert!(self.contains(pos), "{:?} is off the board", pos);
        pos.y * self.width + pos.x
    }

    pub fn space(&self, pos: Pos) -> &Space {
        &self.spaces[self.index(pos)]
    }

    pub fn space_mut(&mut self, pos: Pos) -> &mut Space {
        let idx = self.index(pos);
        &mut self.spaces[idx]
    }

    /// All spaces in row-major order.
    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    /// Forgets which robot stands where.
    pub(crate) fn clear_occupancy(&mut self) {
        for space in &mut self.spaces {
            space.player = None;
        }
    }

    /// Adds an action to a space, keeping the checkpoint count current.
    pub fn add_action(&mut self, pos: Pos, action: FieldAction) {
        if matches!(action, FieldAction::Checkpoint { .. }) {
            self.checkpoints += 1;
        }
        self.space_mut(pos).actions.push(action);
    }

    /// Recounts checkpoint actions across all spaces.
    pub fn count_checkpoints(&mut self) {
        self.checkpoints = self
            .spaces
            .iter()
            .flat_map(|s| s.actions.iter())
            .filter(|a| matches!(a, FieldAction::Checkpoint { .. }))
            .count() as u32;
    }

    /// The adjacent position in `heading`, or `None` at the board edge.
    pub fn neighbour(&self, pos: Pos, heading: Heading) -> Option<Pos> {
        let (dx, dy) = heading.delta();
        let x = pos.x.checked_add_signed(dx as isize)?;
        let y = pos.y.checked_add_signed(dy as isize)?;
        let next = Pos::new(x, y);
        self.contains(next).then_some(next)
    }

    /// Returns true if a wall separates `pos` from its neighbour in `heading`,
    /// whichever of the two spaces carries it.
    pub fn wall_between(&self, pos: Pos, heading: Heading) -> bool {
        if self.space(pos).has_wall(heading) {
            return true;
        }
        match self.neighbour(pos, heading) {
            Some(next) => self.space(next).has_wall(heading.opposite()),
            None => false,
        }
    }

    /// Traces a beam starting on `start` (inclusive) along `heading`.
    ///
    /// The trace stops on the first occupied space, before a wall, or at the
    /// board edge. The last element is the space that was hit.
    pub fn line_of_sight(&self, start: Pos, heading: Heading) -> Vec<Pos> {
        let mut path = vec![start];
        let mut cur = start;
        loop {
            if self.space(cur).player.is_some() || self.wall_between(cur, heading) {
                break;
            }
            match self.neighbour(cur, heading) {
                Some(next) => {
                    path.push(next);
                    cur = next;
                }
                None => break,
            }
        }
        path
    }

    /// Manhattan distance from the antenna.
    pub fn distance_to_antenna(&self, pos: Pos) -> u32 {
        self.antenna.pos.manhattan(pos)
    }

    /// Clockwise angle in degrees, `[0, 360)`, from the antenna's facing to `pos`.
    pub fn angle_to_antenna(&self, pos: Pos) -> f64 {
        let dx = pos.x as f64 - self.antenna.pos.x as f64;
        let dy = pos.y as f64 - self.antenna.pos.y as f64;
        if dx == 0.0 && dy == 0.0 {
            return 0.0;
        }
        // y grows southwards, so atan2 already measures clockwise from east.
        let screen = dy.atan2(dx).to_degrees();
        (screen - self.antenna.heading.degrees()).rem_euclid(360.0)
    }

    /// Nearest free, non-pit space to `origin` (Manhattan, row-major tie-break).
    /// `vacated` counts as free even while a robot still stands on it.
    pub fn nearest_free_space(&self, origin: Pos, vacated: Option<Pos>) -> Option<Pos> {
        self.spaces
            .iter()
            .filter(|s| (s.player.is_none() || Some(s.pos) == vacated) && !s.pit)
            .min_by_key(|s| (origin.manhattan(s.pos), s.pos.y, s.pos.x))
            .map(|s| s.pos)
    }
}
