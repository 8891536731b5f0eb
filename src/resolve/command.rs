//! Card command resolution.
//!
//! Maps the command on a played card to movement and damage primitives.

use crate::board::{Command, PlayerId};
use crate::controller::GameController;

/// What the step executor has to do after a command was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The card is finished with.
    Done,
    /// The card was a damage card; play the top card of the deck instead.
    Replace,
    /// The player has to pick one of these commands.
    Choice(&'static [Command]),
}

impl GameController {
    /// Resolves `command` for robot `id`.
    pub fn execute_command(&mut self, id: PlayerId, command: Command) -> Resolution {
        match command {
            Command::Move1 => self.move_steps(id, 1),
            Command::Move2 => self.move_steps(id, 2),
            Command::Move3 => self.move_steps(id, 3),
            Command::Back => {
                let heading = self.players[id].heading.opposite();
                self.move_in_direction(id, heading, true);
            }
            Command::TurnLeft => self.turn(id, 3),
            Command::TurnRight => self.turn(id, 1),
            Command::UTurn => self.turn(id, 2),
            Command::PowerUp => self.players[id].energy += 1,
            Command::Again => {
                return match self.players[id].previous_command {
                    Some(previous) if previous != Command::Again => self.execute_command(id, previous),
                    _ => Resolution::Done,
                };
            }
            Command::LeftOrRight => return Resolution::Choice(command.options()),
            Command::Spam => return Resolution::Replace,
            Command::Trojan => {
                self.deal_damage(id, Command::Spam);
                self.deal_damage(id, Command::Spam);
                return Resolution::Replace;
            }
            Command::Virus => {
                self.spread_virus(id);
                return Resolution::Replace;
            }
            Command::Worm => {
                self.reboot(id);
                return Resolution::Done;
            }
        }
        self.players[id].previous_command = Some(command);
        Resolution::Done
    }

    /// Moves forward up to `n` spaces, stopping early after a reboot.
    fn move_steps(&mut self, id: PlayerId, n: usize) {
        for _ in 0..n {
            if self.players[id].rebooting {
                break;
            }
            self.move_forward(id);
        }
    }

    /// Every other robot within the virus radius gets a virus card.
    fn spread_virus(&mut self, id: PlayerId) {
        let origin = self.players[id].pos;
        let radius = self.config.virus_radius;
        let infected: Vec<PlayerId> = (0..self.players.len())
            .filter(|&other| other != id && self.players[other].pos.manhattan(origin) <= radius)
            .collect();
        for other in infected {
            self.deal_damage(other, Command::Virus);
        }
    }
}
