//! Board representation and game-state types.
//!
//! Contains the core data structures for spaces, hazards, robots, cards
//! and the overall board state.

pub mod card;
pub mod heading;
pub mod player;
pub mod space;
pub mod state;

pub use card::{
    default_deck, Command, CommandCard, Upgrade, UpgradeCard, UpgradeKind, ALL_COMMANDS,
    ALL_UPGRADES,
};
pub use heading::{Heading, Pos, ALL_HEADINGS};
pub use player::{CardField, OwnedUpgrade, Player, PlayerId, NO_REGISTERS};
pub use space::{FieldAction, PushParity, Rotation, Space};
pub use state::{Antenna, Board, LaserTrace, Phase};
