//! Compass headings and board positions.
//!
//! Headings are listed in clockwise order starting at south, so a single
//! clockwise quarter turn is always `next()`.

use serde::{Deserialize, Serialize};

/// A compass direction a robot (or a board element) can face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    South,
    West,
    North,
    East,
}

/// All headings in clockwise order.
pub const ALL_HEADINGS: [Heading; 4] = [Heading::South, Heading::West, Heading::North, Heading::East];

impl Heading {
    /// Returns the heading one clockwise quarter turn away.
    pub const fn next(self) -> Heading {
        match self {
            Heading::South => Heading::West,
            Heading::West => Heading::North,
            Heading::North => Heading::East,
            Heading::East => Heading::South,
        }
    }

    /// Returns the heading one counter-clockwise quarter turn away.
    pub const fn prev(self) -> Heading {
        match self {
            Heading::South => Heading::East,
            Heading::West => Heading::South,
            Heading::North => Heading::West,
            Heading::East => Heading::North,
        }
    }

    /// Returns the heading facing the other way.
    pub const fn opposite(self) -> Heading {
        self.next().next()
    }

    /// Rotates clockwise `times` quarter turns. Wraps every four.
    pub fn rotated(self, times: i32) -> Heading {
        let mut h = self;
        for _ in 0..times.rem_euclid(4) {
            h = h.next();
        }
        h
    }

    /// Unit step `(dx, dy)` for this heading; `y` grows southwards.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Heading::South => (0, 1),
            Heading::West => (-1, 0),
            Heading::North => (0, -1),
            Heading::East => (1, 0),
        }
    }

    /// Screen angle in degrees, measured clockwise from east.
    pub const fn degrees(self) -> f64 {
        match self {
            Heading::East => 0.0,
            Heading::South => 90.0,
            Heading::West => 180.0,
            Heading::North => 270.0,
        }
    }

    /// Parses a heading from its lowercase name or initial.
    pub fn from_name(s: &str) -> Option<Heading> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "south" => Some(Heading::South),
            "w" | "west" => Some(Heading::West),
            "n" | "north" => Some(Heading::North),
            "e" | "east" => Some(Heading::East),
            _ => None,
        }
    }
}

/// A board coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }

    /// Manhattan distance between two positions.
    pub fn manhattan(self, other: Pos) -> u32 {
        (self.x.abs_diff(other.x) + self.y.abs_diff(other.y)) as u32
    }
}
