//! ironrally engine library.
//!
//! Exposes the board model, the rules controller and resolver, the driver
//! protocol, match sessions and self-play for use by integration tests and
//! the binaries.

pub mod board;
pub mod config;
pub mod controller;
pub mod engine;
pub mod protocol;
pub mod resolve;
pub mod selfplay;
pub mod session;

pub use controller::{GameController, GameEvent};
