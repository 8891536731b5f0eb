//! Round sequencing: programming, register activation and the end-of-register
//! board activation.
//!
//! Round flow:
//! - Programming -> Activation once every register is filled
//! - Activation  -> PlayerInteraction while a choice card waits for a pick
//! - Activation  -> next register after all robots acted and the board fired
//! - Activation  -> Programming after the last register
//! - any         -> Finished when a robot reaches the final checkpoint

use serde::{Deserialize, Serialize};

use crate::board::{CardField, Command, Phase, Player, PlayerId, Upgrade, NO_REGISTERS};
use crate::controller::GameController;

use super::command::Resolution;

/// A driver asked for step execution when none is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("step execution requires the activation phase, current phase is {0:?}")]
    NotActivation(Phase),

    #[error("register {0} is out of range")]
    StepOutOfRange(usize),

    #[error("no current player")]
    NoCurrentPlayer,
}

/// Which card area of a player a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotArea {
    Hand,
    Register,
}

/// Addresses one hand or register slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSlot {
    pub player: PlayerId,
    pub area: SlotArea,
    pub index: usize,
}

impl CardSlot {
    pub const fn hand(player: PlayerId, index: usize) -> Self {
        CardSlot { player, area: SlotArea::Hand, index }
    }

    pub const fn register(player: PlayerId, index: usize) -> Self {
        CardSlot { player, area: SlotArea::Register, index }
    }
}

impl GameController {
    /// Starts a new round: empties registers, deals fresh hands, recomputes
    /// the turn order and restocks the shop.
    pub fn start_programming_phase(&mut self) {
        if self.board.phase == Phase::Finished {
            return;
        }
        let hand_size = self.config.hand_size;
        for player in self.players.iter_mut() {
            player.rebooting = false;
            player.previous_command = None;
            for field in player.registers.iter_mut() {
                if let Some(card) = field.card.take() {
                    player.discard_pile.push(card);
                }
                field.visible = true;
            }
            for field in player.hand.iter_mut() {
                if let Some(card) = field.card.take() {
                    player.discard_pile.push(card);
                }
            }
            player.hand.resize(hand_size, Default::default());
            for i in 0..hand_size {
                player.hand[i].card = player.draw_card(&mut self.rng);
                player.hand[i].visible = true;
            }
        }
        self.determine_player_order();
        self.refill_shop();
        self.board.current_player = self.player_order.first().copied();
        self.board.step = 0;
        self.set_phase(Phase::Programming);
    }

    /// Locks in all programs and starts activation. Does nothing and returns
    /// false unless every robot has all registers filled.
    pub fn finish_programming_phase(&mut self) -> bool {
        if self.board.phase != Phase::Programming {
            return false;
        }
        if !self.players.iter().all(|p| p.program_complete()) {
            return false;
        }
        for player in self.players.iter_mut() {
            for field in player.hand.iter_mut() {
                if let Some(card) = field.card.take() {
                    player.discard_pile.push(card);
                }
            }
            for field in player.registers.iter_mut() {
                field.visible = false;
            }
        }
        self.reveal_register(0);
        self.board.current_player = self.player_order.first().copied();
        self.board.step = 0;
        self.set_phase(Phase::Activation);
        true
    }

    /// Runs until the round is over or a player has to make a choice.
    pub fn execute_programs(&mut self) -> Result<(), StepError> {
        self.board.step_mode = false;
        self.continue_programs()
    }

    /// Resolves a single card.
    pub fn execute_step(&mut self) -> Result<(), StepError> {
        self.board.step_mode = true;
        self.continue_programs()
    }

    fn continue_programs(&mut self) -> Result<(), StepError> {
        loop {
            self.execute_next_step()?;
            if self.board.phase != Phase::Activation || self.board.step_mode {
                return Ok(());
            }
        }
    }

    /// Resolves the current player's card in the current register.
    fn execute_next_step(&mut self) -> Result<(), StepError> {
        if self.board.phase != Phase::Activation {
            return Err(StepError::NotActivation(self.board.phase));
        }
        let id = self.board.current_player.ok_or(StepError::NoCurrentPlayer)?;
        let step = self.board.step;
        if step >= NO_REGISTERS {
            return Err(StepError::StepOutOfRange(step));
        }

        let mut card = self.players[id].registers[step].card.take();
        if self.players[id].rebooting {
            if let Some(card) = card {
                self.players[id].discard_card(card);
            }
            self.players[id].previous_command = None;
        } else {
            while let Some(current) = card {
                match self.execute_command(id, current.command) {
                    Resolution::Done => {
                        self.players[id].discard_card(current);
                        break;
                    }
                    Resolution::Replace => {
                        tracing::debug!(player = %self.players[id].name, card = ?current.command, "replacing damage card");
                        card = self.players[id].draw_card(&mut self.rng);
                    }
                    Resolution::Choice(_) => {
                        self.players[id].registers[step].card = Some(current);
                        self.set_phase(Phase::PlayerInteraction);
                        break;
                    }
                }
            }
        }

        if self.board.phase == Phase::Activation {
            self.end_turn();
        }
        Ok(())
    }

    /// Resolves the pending choice card of the current player with `command`.
    /// Returns false if no choice is pending or `command` is not an option.
    pub fn make_choice(&mut self, command: Command) -> bool {
        if self.board.phase != Phase::PlayerInteraction {
            return false;
        }
        let Some(id) = self.board.current_player else {
            return false;
        };
        let step = self.board.step;
        let Some(pending) = self.players[id].registers.get(step).and_then(|f| f.card) else {
            return false;
        };
        if !pending.command.options().contains(&command) {
            return false;
        }
        self.players[id].registers[step].card = None;
        self.set_phase(Phase::Activation);
        self.execute_command(id, command);
        self.players[id].discard_card(pending);
        if self.board.phase == Phase::Activation {
            self.end_turn();
        }
        true
    }

    /// Hands the turn to the next robot, or runs the board and moves to the
    /// next register once everyone has acted.
    pub fn end_turn(&mut self) {
        if self.board.phase != Phase::Activation {
            return;
        }
        let next = self
            .board
            .current_player
            .and_then(|id| self.next_in_order(id));
        match next {
            Some(id) => self.board.current_player = Some(id),
            None => self.end_register(),
        }
    }

    /// Board elements, board lasers, then robot lasers; afterwards the next
    /// register is revealed or a new round begins.
    fn end_register(&mut self) {
        self.board.lasers.clear();

        let order = self.player_order.clone();
        for id in order {
            self.board.current_player = Some(id);
            let pos = self.players[id].pos;
            let actions = self.board.space(pos).actions.clone();
            for action in actions.into_iter().filter(|a| !a.is_laser()) {
                self.apply_field_action(action, pos);
                if self.board.phase == Phase::Finished {
                    return;
                }
            }
        }

        let emitters: Vec<_> = self
            .board
            .spaces()
            .iter()
            .flat_map(|s| s.actions.iter().filter(|a| a.is_laser()).map(move |a| (*a, s.pos)))
            .collect();
        for (action, pos) in emitters {
            self.apply_field_action(action, pos);
        }

        for id in 0..self.players.len() {
            let heading = self.players[id].heading;
            self.shoot_robot_laser(id, heading);
            if self.has_active_upgrade(id, Upgrade::RearLaser) {
                self.shoot_robot_laser(id, heading.opposite());
            }
        }

        let step = self.board.step + 1;
        if step < NO_REGISTERS {
            self.reveal_register(step);
            self.board.step = step;
            self.board.current_player = self.player_order.first().copied();
        } else {
            self.start_programming_phase();
        }
    }

    fn reveal_register(&mut self, register: usize) {
        for player in self.players.iter_mut() {
            if let Some(field) = player.registers.get_mut(register) {
                field.visible = true;
            }
        }
    }

    /// Moves a card between two slots of the same player. Only a filled slot
    /// can be moved, and only into an empty one.
    pub fn move_cards(&mut self, source: CardSlot, target: CardSlot) -> bool {
        if self.board.phase != Phase::Programming
            || source.player != target.player
            || source.player >= self.players.len()
            || source == target
        {
            return false;
        }
        let player = &mut self.players[source.player];
        let Some(card) = slot_mut(player, source).and_then(|f| f.card) else {
            return false;
        };
        match slot_mut(player, target) {
            Some(field) if field.card.is_none() => field.card = Some(card),
            _ => return false,
        }
        if let Some(field) = slot_mut(player, source) {
            field.card = None;
        }
        true
    }
}

fn slot_mut(player: &mut Player, slot: CardSlot) -> Option<&mut CardField> {
    match slot.area {
        SlotArea::Hand => player.hand.get_mut(slot.index),
        SlotArea::Register => player.registers.get_mut(slot.index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CommandCard, FieldAction, Heading, OwnedUpgrade, Pos, Upgrade};
    use crate::controller::tests::controller;
    use crate::controller::GameController;

    /// Puts `commands` straight into a player's registers.
    fn program(gc: &mut GameController, id: PlayerId, commands: [Command; NO_REGISTERS]) {
        for (field, command) in gc.players[id].registers.iter_mut().zip(commands) {
            field.card = Some(CommandCard::new(command));
        }
    }

    fn two_robot_match() -> (GameController, PlayerId, PlayerId) {
        let mut gc = controller(8, 8);
        gc.board.reboot_station = Pos::new(7, 7);
        let a = gc.add_player("A", "red", Pos::new(1, 6), Heading::North).unwrap();
        let b = gc.add_player("B", "blue", Pos::new(5, 6), Heading::North).unwrap();
        gc.start_programming_phase();
        (gc, a, b)
    }

    #[test]
    fn programming_phase_deals_hands() {
        let (gc, a, b) = two_robot_match();
        assert_eq!(gc.board.phase, Phase::Programming);
        assert_eq!(gc.board.step, 0);
        for id in [a, b] {
            let p = gc.player(id);
            assert!(p.hand.iter().all(|f| f.card.is_some()));
            assert_eq!(p.draw_pile.len(), 20 - gc.config.hand_size);
            assert!(p.registers.iter().all(|f| f.card.is_none()));
        }
        assert_eq!(gc.player_order().len(), 2);
    }

    #[test]
    fn finish_rejected_while_registers_are_empty() {
        let (mut gc, a, _b) = two_robot_match();
        assert!(gc.move_cards(CardSlot::hand(a, 0), CardSlot::register(a, 0)));
        let before = gc.players.clone();

        assert!(!gc.finish_programming_phase());
        assert_eq!(gc.board.phase, Phase::Programming);
        assert_eq!(gc.players, before);
    }

    #[test]
    fn finish_discards_the_rest_of_the_hand() {
        let (mut gc, a, b) = two_robot_match();
        for id in [a, b] {
            for i in 0..NO_REGISTERS {
                assert!(gc.move_cards(CardSlot::hand(id, i), CardSlot::register(id, i)));
            }
        }
        assert!(gc.finish_programming_phase());
        assert_eq!(gc.board.phase, Phase::Activation);
        assert_eq!(gc.board.current_player, gc.player_order().first().copied());
        for id in [a, b] {
            let p = gc.player(id);
            assert!(p.hand.iter().all(|f| f.card.is_none()));
            assert_eq!(p.discard_pile.len(), gc.config.hand_size - NO_REGISTERS);
            assert!(p.registers[0].visible);
            assert!(!p.registers[1].visible);
        }
    }

    #[test]
    fn move_cards_needs_a_card_and_an_empty_target() {
        let (mut gc, a, b) = two_robot_match();
        assert!(gc.move_cards(CardSlot::hand(a, 0), CardSlot::register(a, 0)));
        assert!(!gc.move_cards(CardSlot::hand(a, 0), CardSlot::register(a, 1)), "source empty");
        assert!(!gc.move_cards(CardSlot::hand(a, 1), CardSlot::register(a, 0)), "target full");
        assert!(!gc.move_cards(CardSlot::hand(a, 1), CardSlot::register(b, 0)), "other player");
        assert!(!gc.move_cards(CardSlot::hand(a, 1), CardSlot::register(a, 9)), "out of range");
        assert!(gc.player(a).hand[1].card.is_some());
        assert!(gc.move_cards(CardSlot::register(a, 0), CardSlot::hand(a, 0)));
    }

    #[test]
    fn step_outside_activation_is_rejected() {
        let (mut gc, _a, _b) = two_robot_match();
        assert_eq!(gc.execute_step(), Err(StepError::NotActivation(Phase::Programming)));
        gc.board.phase = Phase::Activation;
        gc.board.step = NO_REGISTERS;
        assert_eq!(gc.execute_step(), Err(StepError::StepOutOfRange(NO_REGISTERS)));
        gc.board.step = 0;
        gc.board.current_player = None;
        assert_eq!(gc.execute_step(), Err(StepError::NoCurrentPlayer));
    }

    #[test]
    fn single_steps_alternate_players_then_advance_register() {
        let (mut gc, a, b) = two_robot_match();
        program(&mut gc, a, [Command::Move1; NO_REGISTERS]);
        program(&mut gc, b, [Command::TurnRight; NO_REGISTERS]);
        gc.players[a].hand.iter_mut().for_each(|f| f.card = None);
        gc.players[b].hand.iter_mut().for_each(|f| f.card = None);
        assert!(gc.finish_programming_phase());

        let first = gc.player_order()[0];
        let second = gc.player_order()[1];
        gc.execute_step().unwrap();
        assert_eq!(gc.board.current_player, Some(second));
        assert_eq!(gc.board.step, 0);
        gc.execute_step().unwrap();
        assert_eq!(gc.board.current_player, Some(first));
        assert_eq!(gc.board.step, 1);
        assert!(gc.player(a).registers[1].visible);

        assert_eq!(gc.player(a).pos(), Pos::new(1, 5));
        assert_eq!(gc.player(b).heading, Heading::East);
    }

    #[test]
    fn full_round_returns_to_programming() {
        let (mut gc, a, b) = two_robot_match();
        program(&mut gc, a, [Command::Move1, Command::Move1, Command::TurnLeft, Command::TurnRight, Command::Again]);
        program(&mut gc, b, [Command::UTurn, Command::UTurn, Command::Move1, Command::Back, Command::PowerUp]);
        assert!(gc.finish_programming_phase());
        let energy = gc.player(b).energy;

        gc.execute_programs().unwrap();
        assert_eq!(gc.board.phase, Phase::Programming);
        assert_eq!(gc.board.step, 0);
        assert_eq!(gc.player(a).pos(), Pos::new(1, 4));
        assert_eq!(gc.player(a).heading, Heading::East);
        assert_eq!(gc.player(b).pos(), Pos::new(5, 6));
        assert_eq!(gc.player(b).energy, energy + 1);
        for id in [a, b] {
            let p = gc.player(id);
            assert!(p.hand.iter().all(|f| f.card.is_some()));
            assert!(p.registers.iter().all(|f| f.card.is_none()));
        }
    }

    #[test]
    fn damage_card_is_replaced_from_the_deck() {
        let (mut gc, a, b) = two_robot_match();
        program(&mut gc, a, [Command::Spam, Command::TurnLeft, Command::TurnLeft, Command::TurnLeft, Command::TurnLeft]);
        program(&mut gc, b, [Command::TurnLeft; NO_REGISTERS]);
        gc.players[a].draw_pile = vec![CommandCard::new(Command::Move2)];
        assert!(gc.finish_programming_phase());
        let discard_before = gc.player(a).discard_pile.len();

        assert_eq!(gc.player_order(), &[a, b]);
        gc.execute_step().unwrap();
        assert_eq!(gc.board.current_player, Some(b));
        assert_eq!(gc.player(a).pos(), Pos::new(1, 4));
        assert!(gc.player(a).draw_pile.is_empty());
        let played: Vec<_> = gc.player(a).discard_pile[discard_before..].iter().map(|c| c.command).collect();
        assert_eq!(played, vec![Command::Move2]);
    }

    #[test]
    fn rebooting_robot_skips_its_cards() {
        let (mut gc, a, b) = two_robot_match();
        program(&mut gc, a, [Command::Move1; NO_REGISTERS]);
        program(&mut gc, b, [Command::TurnLeft; NO_REGISTERS]);
        assert!(gc.finish_programming_phase());
        gc.players[a].rebooting = true;
        gc.execute_programs().unwrap();
        assert_eq!(gc.player(a).pos(), Pos::new(1, 6));
        assert!(!gc.player(a).rebooting, "cleared by the next programming phase");
    }

    #[test]
    fn choice_card_waits_for_the_player() {
        let (mut gc, a, b) = two_robot_match();
        program(&mut gc, a, [Command::LeftOrRight, Command::Move1, Command::Move1, Command::Move1, Command::Move1]);
        program(&mut gc, b, [Command::LeftOrRight, Command::UTurn, Command::UTurn, Command::UTurn, Command::UTurn]);
        assert!(gc.finish_programming_phase());

        gc.execute_programs().unwrap();
        assert_eq!(gc.board.phase, Phase::PlayerInteraction);
        let waiting = gc.board.current_player.unwrap();
        assert!(!gc.make_choice(Command::UTurn));
        assert!(gc.make_choice(Command::TurnRight));
        assert_eq!(gc.player(waiting).heading, Heading::East);
        assert_eq!(gc.board.phase, Phase::Activation);
        assert!(!gc.make_choice(Command::TurnRight));
        assert_ne!(gc.board.current_player, Some(waiting));
    }

    #[test]
    fn end_of_register_runs_board_then_lasers() {
        let mut gc = controller(6, 3);
        gc.board.reboot_station = Pos::new(5, 2);
        gc.board.add_action(Pos::new(0, 1), FieldAction::ConveyorBelt { heading: Heading::East });
        gc.board.add_action(Pos::new(0, 0), FieldAction::Laser { heading: Heading::South, strength: 1 });
        let a = gc.add_player("A", "red", Pos::new(0, 1), Heading::East).unwrap();
        let b = gc.add_player("B", "blue", Pos::new(4, 1), Heading::West).unwrap();
        gc.start_programming_phase();
        program(&mut gc, a, [Command::TurnLeft, Command::TurnRight, Command::TurnLeft, Command::TurnRight, Command::TurnLeft]);
        program(&mut gc, b, [Command::UTurn, Command::UTurn, Command::UTurn, Command::UTurn, Command::UTurn]);
        gc.players[a].registers[0].card = Some(CommandCard::new(Command::PowerUp));
        gc.players[b].registers[0].card = Some(CommandCard::new(Command::PowerUp));
        assert!(gc.finish_programming_phase());

        gc.execute_step().unwrap();
        gc.execute_step().unwrap();
        assert_eq!(gc.board.step, 1);
        // The belt moved A out of the board laser's beam before it fired.
        assert_eq!(gc.player(a).pos(), Pos::new(1, 1));
        // A faces east, B faces west: they shoot each other.
        let spam = |gc: &GameController, id| {
            gc.player(id).discard_pile.iter().filter(|c| c.command == Command::Spam).count()
        };
        assert_eq!(spam(&gc, a), 1);
        assert_eq!(spam(&gc, b), 1);
        assert_eq!(gc.board.lasers.len(), 3);
    }

    #[test]
    fn rear_laser_fires_backwards_too() {
        let mut gc = controller(5, 1);
        let a = gc.add_player("A", "red", Pos::new(2, 0), Heading::East).unwrap();
        let front = gc.add_player("B", "blue", Pos::new(4, 0), Heading::North).unwrap();
        let back = gc.add_player("C", "green", Pos::new(0, 0), Heading::North).unwrap();
        gc.players[a].permanent_upgrades.push(OwnedUpgrade { card: Upgrade::RearLaser.card(), active: true });
        gc.start_programming_phase();
        for id in [a, front, back] {
            program(&mut gc, id, [Command::PowerUp; NO_REGISTERS]);
        }
        assert!(gc.finish_programming_phase());
        for _ in 0..3 {
            gc.execute_step().unwrap();
        }
        let spam = |id| gc.player(id).discard_pile.iter().filter(|c| c.command == Command::Spam).count();
        assert_eq!(spam(front), 1);
        assert_eq!(spam(back), 1);
    }

    #[test]
    fn reaching_the_last_checkpoint_ends_the_match() {
        let mut gc = controller(3, 3);
        gc.board.add_action(Pos::new(1, 0), FieldAction::Checkpoint { id: 1 });
        let a = gc.add_player("A", "red", Pos::new(1, 2), Heading::North).unwrap();
        gc.start_programming_phase();
        program(&mut gc, a, [Command::Move2, Command::Move1, Command::Move1, Command::Move1, Command::Move1]);
        assert!(gc.finish_programming_phase());

        gc.execute_programs().unwrap();
        assert_eq!(gc.board.phase, Phase::Finished);
        assert_eq!(gc.board.winner, Some(a));
        assert_eq!(gc.board.step, 0);
        gc.start_programming_phase();
        assert_eq!(gc.board.phase, Phase::Finished);
        assert!(gc.execute_step().is_err());
    }
}
