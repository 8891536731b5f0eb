//! Rule resolution.
//!
//! Each submodule adds one rules concern to `GameController`: robot movement
//! and pushing, lasers, board elements, card commands, turn order, the
//! upgrade shop and the round state machine.

pub mod command;
pub mod field;
pub mod laser;
pub mod movement;
pub mod order;
pub mod phase;
pub mod shop;

pub use command::Resolution;
pub use movement::{ImpossibleMove, MoveOutcome};
pub use order::order_by_antenna;
pub use phase::{CardSlot, SlotArea, StepError};
