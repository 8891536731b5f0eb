//! Robot movement, push chains and rebooting.
//!
//! A push is planned in full before anything moves. If any link of the chain
//! cannot move the plan fails with `ImpossibleMove` and the board is left
//! exactly as it was. Edges and pits are checked before occupancy, the same
//! way for the acting robot and for every robot it pushes.

use crate::board::{Heading, PlayerId, Pos, Upgrade};
use crate::controller::{GameController, GameEvent};

/// What became of a requested move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The robot now stands on the target space.
    Moved,
    /// A wall or an immovable push chain stopped the move; nothing changed.
    Blocked,
    /// The robot left the board or fell into a pit and was rebooted.
    Rebooted,
}

/// A push chain has nowhere to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("player {player} cannot move from {from:?} heading {heading:?}")]
pub struct ImpossibleMove {
    pub player: PlayerId,
    pub from: Pos,
    pub heading: Heading,
}

/// Where a pushed robot ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landing {
    Space(Pos),
    /// Off the board or into a pit; the robot reboots on this space.
    Reboot(Pos),
}

/// One link of a push chain: `pusher` shoves `player` to `landing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Displacement {
    player: PlayerId,
    pusher: PlayerId,
    landing: Landing,
}

impl GameController {
    /// Moves a robot one space along its own heading, pushing others.
    pub fn move_forward(&mut self, id: PlayerId) -> MoveOutcome {
        let heading = self.players[id].heading;
        self.move_in_direction(id, heading, true)
    }

    /// Moves a robot one space along `heading`.
    ///
    /// Falling off the board or into a pit (without a hover unit) reboots the
    /// robot. Walls block. An occupied target is pushed when `allow_push` is
    /// set and blocks otherwise.
    pub fn move_in_direction(&mut self, id: PlayerId, heading: Heading, allow_push: bool) -> MoveOutcome {
        let from = self.players[id].pos;
        let Some(target) = self.board.neighbour(from, heading) else {
            tracing::info!(player = %self.players[id].name, "fell off the board");
            self.reboot(id);
            return MoveOutcome::Rebooted;
        };
        if self.board.wall_between(from, heading) {
            return MoveOutcome::Blocked;
        }
        if self.board.space(target).pit && !self.has_active_upgrade(id, Upgrade::HoverUnit) {
            tracing::info!(player = %self.players[id].name, "fell into a pit");
            self.reboot(id);
            return MoveOutcome::Rebooted;
        }
        if matches!(self.occupant(target), Some(other) if other != id) && !allow_push {
            return MoveOutcome::Blocked;
        }

        match self.plan_push(id, target, heading) {
            Ok(chain) => {
                self.apply_push(id, target, &chain);
                MoveOutcome::Moved
            }
            Err(e) => {
                tracing::debug!("{e}");
                MoveOutcome::Blocked
            }
        }
    }

    /// Rotates a robot clockwise `times` quarter turns.
    pub fn turn(&mut self, id: PlayerId, times_clockwise: i32) {
        let heading = self.players[id].heading.rotated(times_clockwise);
        self.players[id].heading = heading;
        self.emit(GameEvent::Turned { player: id, heading });
    }

    /// Sends a robot to the reboot station, or the nearest free space to it
    /// when the station is taken, and marks it as rebooting.
    pub fn reboot(&mut self, id: PlayerId) {
        let at = self.reboot_space(self.players[id].pos);
        self.reboot_at(id, at);
    }

    /// The space a robot reboots on, treating `vacated` as free.
    fn reboot_space(&self, vacated: Pos) -> Option<Pos> {
        let station = self.board.reboot_station;
        let free = station == vacated || self.occupant(station).is_none();
        if free && !self.board.space(station).pit {
            return Some(station);
        }
        self.board.nearest_free_space(station, Some(vacated))
    }

    fn reboot_at(&mut self, id: PlayerId, at: Option<Pos>) {
        let Some(at) = at else {
            tracing::warn!(player = %self.players[id].name, "no free space to reboot on");
            self.players[id].rebooting = true;
            return;
        };
        self.place_player(id, at);
        self.players[id].rebooting = true;
        tracing::info!(player = %self.players[id].name, x = at.x, y = at.y, "rebooted");
        self.emit(GameEvent::Rebooted { player: id, at });
    }

    /// Works out every displacement needed for `mover` to enter `target`.
    fn plan_push(
        &self,
        mover: PlayerId,
        target: Pos,
        heading: Heading,
    ) -> Result<Vec<Displacement>, ImpossibleMove> {
        let origin = self.players[mover].pos;
        let mut chain: Vec<Displacement> = Vec::new();
        let mut pusher = mover;
        let mut space = target;

        while let Some(other) = self.occupant(space) {
            let impossible = ImpossibleMove {
                player: pusher,
                from: space,
                heading,
            };
            if other == mover || chain.iter().any(|d| d.player == other) {
                return Err(impossible);
            }
            let landing = match self.board.neighbour(space, heading) {
                Some(next) if next == space => return Err(impossible),
                Some(_) if self.board.wall_between(space, heading) => return Err(impossible),
                Some(next)
                    if !self.board.space(next).pit
                        || self.has_active_upgrade(other, Upgrade::HoverUnit) =>
                {
                    Landing::Space(next)
                }
                // Every space the chain enters is taken, so only free spaces
                // and the mover's origin are left to reboot on.
                _ => Landing::Reboot(self.reboot_space(origin).ok_or(impossible)?),
            };
            chain.push(Displacement {
                player: other,
                pusher,
                landing,
            });
            match landing {
                Landing::Space(next) => {
                    pusher = other;
                    space = next;
                }
                Landing::Reboot(_) => break,
            }
        }
        Ok(chain)
    }

    /// Carries out a planned chain, far end first, then moves the mover.
    ///
    /// A robot that reboots is lifted off the board first and only put down
    /// once the mover has left its origin, which may be its landing space.
    fn apply_push(&mut self, mover: PlayerId, target: Pos, chain: &[Displacement]) {
        let rebooted = chain.last().and_then(|d| match d.landing {
            Landing::Reboot(at) => Some((d.player, at)),
            Landing::Space(_) => None,
        });
        if let Some((id, _)) = rebooted {
            self.lift_player(id);
        }
        for d in chain.iter().rev() {
            if let Landing::Space(pos) = d.landing {
                self.place_player(d.player, pos);
            }
            if self.has_active_upgrade(d.pusher, Upgrade::RammingGear) {
                self.deal_damage(d.player, crate::board::Command::Spam);
            }
            if self.has_active_upgrade(d.pusher, Upgrade::VirusModule) {
                self.deal_damage(d.player, crate::board::Command::Virus);
            }
        }
        debug_assert!(self.occupant(target).is_none(), "{:?} still occupied after push", target);
        self.place_player(mover, target);
        if let Some((id, at)) = rebooted {
            tracing::info!(player = %self.players[id].name, "pushed off the board");
            self.reboot_at(id, Some(at));
        }
    }
}
