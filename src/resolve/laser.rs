//! Robot-mounted and board lasers.
//!
//! Both kinds trace their beam with `Board::line_of_sight` and record it in
//! `Board::lasers` for display. Upgrade modifiers on robot shots are applied
//! in a fixed order: damage, pressor, tractor, howitzer.

use crate::board::{Command, Heading, LaserTrace, PlayerId, Pos, Upgrade};
use crate::controller::{GameController, GameEvent};

impl GameController {
    /// Fires `shooter`'s laser along `heading`. Returns the robot hit, if any.
    pub fn shoot_robot_laser(&mut self, shooter: PlayerId, heading: Heading) -> Option<PlayerId> {
        let from = self.players[shooter].pos;
        if self.board.space(from).has_wall(heading) {
            return None;
        }
        let start = self.board.neighbour(from, heading)?;
        let path = self.board.line_of_sight(start, heading);
        let hit = *path.last()?;
        self.board.lasers.push(LaserTrace { heading, path });

        if self.board.space(hit).has_wall(heading.opposite()) {
            return None;
        }
        let victim = self.occupant(hit)?;
        if victim == shooter {
            return None;
        }

        let deflected = self.has_active_upgrade(victim, Upgrade::DeflectorShield);
        self.emit(GameEvent::LaserHit {
            shooter: Some(shooter),
            target: victim,
            deflected,
        });
        if deflected {
            tracing::debug!(target = %self.players[victim].name, "shot deflected");
            return Some(victim);
        }
        tracing::info!(
            shooter = %self.players[shooter].name,
            target = %self.players[victim].name,
            "laser hit"
        );

        self.deal_damage(victim, Command::Spam);
        if self.has_active_upgrade(shooter, Upgrade::DoubleBarrelLaser) {
            self.deal_damage(victim, Command::Spam);
        }
        if self.has_active_upgrade(shooter, Upgrade::PressorBeam) {
            self.move_in_direction(victim, heading, true);
        }
        if self.has_active_upgrade(shooter, Upgrade::TractorBeam)
            && self.players[victim].pos.manhattan(self.players[shooter].pos) > 1
        {
            self.move_in_direction(victim, heading.opposite(), true);
        }
        if self.has_active_upgrade(shooter, Upgrade::MiniHowitzer) {
            self.deal_damage(victim, Command::Spam);
            self.deal_damage(victim, Command::Spam);
            self.move_in_direction(victim, heading, true);
        }
        Some(victim)
    }

    /// Fires a wall-mounted laser from `origin`. The beam covers its own
    /// space, so a robot standing on the emitter is hit first.
    pub fn fire_board_laser(&mut self, origin: Pos, heading: Heading, strength: u8) -> Option<PlayerId> {
        let path = self.board.line_of_sight(origin, heading);
        let hit = *path.last()?;
        self.board.lasers.push(LaserTrace { heading, path });

        let victim = self.occupant(hit)?;
        let deflected = self.has_active_upgrade(victim, Upgrade::DeflectorShield);
        self.emit(GameEvent::LaserHit {
            shooter: None,
            target: victim,
            deflected,
        });
        if !deflected {
            for _ in 0..strength {
                self.deal_damage(victim, Command::Spam);
            }
        }
        Some(victim)
    }
}
