//! Driver-facing formats.
//!
//! JSON board layouts, serializable match snapshots, and the parser for the
//! line protocol spoken by the `ironrally` binary.

pub mod layout;
pub mod parser;
pub mod snapshot;

pub use layout::{BoardLayout, LayoutError, SpaceLayout, StartPosition, ROBOT_NAMES};
pub use parser::{parse_instruction, Instruction};
pub use snapshot::{GameSnapshot, SnapshotError};
