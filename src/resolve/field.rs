//! Activation of board elements.

use crate::board::{FieldAction, Phase, Pos};
use crate::controller::{GameController, GameEvent};

impl GameController {
    /// Applies one board element on the space at `pos`.
    ///
    /// Returns true if the element acted on a robot. Checkpoints may end the
    /// match, after which the phase is `Finished`.
    pub fn apply_field_action(&mut self, action: FieldAction, pos: Pos) -> bool {
        if let FieldAction::Laser { heading, strength } = action {
            return self.fire_board_laser(pos, heading, strength).is_some();
        }
        let Some(id) = self.occupant(pos) else {
            return false;
        };
        match action {
            FieldAction::ConveyorBelt { heading } => {
                self.move_in_direction(id, heading, false);
                true
            }
            FieldAction::Gear { rotation } => {
                self.turn(id, rotation.quarter_turns());
                true
            }
            FieldAction::PushPanel { heading, parity } => {
                if !parity.fires_on(self.board.step) {
                    return false;
                }
                self.move_in_direction(id, heading, true);
                true
            }
            FieldAction::Checkpoint { id: checkpoint } => {
                let player = &mut self.players[id];
                if checkpoint != player.checkpoints + 1 {
                    return false;
                }
                player.checkpoints = checkpoint;
                tracing::info!(player = %player.name, checkpoint, "reached checkpoint");
                self.emit(GameEvent::CheckpointReached { player: id, checkpoint });
                if checkpoint >= self.board.checkpoints {
                    self.board.winner = Some(id);
                    tracing::info!(player = %self.players[id].name, "won the race");
                    self.emit(GameEvent::Winner { player: id });
                    self.set_phase(Phase::Finished);
                }
                true
            }
            FieldAction::EnergyCubeField => {
                self.players[id].energy += 1;
                let energy = self.players[id].energy;
                self.emit(GameEvent::EnergyGained { player: id, energy });
                true
            }
            FieldAction::Laser { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{FieldAction, Heading, Phase, Pos, PushParity, Rotation};
    use crate::controller::tests::controller;

    #[test]
    fn conveyor_moves_without_pushing() {
        let mut gc = controller(4, 1);
        let a = gc.add_player("A", "red", Pos::new(0, 0), Heading::North).unwrap();
        let belt = FieldAction::ConveyorBelt { heading: Heading::East };
        assert!(gc.apply_field_action(belt, Pos::new(0, 0)));
        assert_eq!(gc.player(a).pos(), Pos::new(1, 0));
        assert_eq!(gc.player(a).heading, Heading::North);
    }

    #[test]
    fn gear_rotates_in_place() {
        let mut gc = controller(2, 2);
        let a = gc.add_player("A", "red", Pos::new(1, 1), Heading::North).unwrap();
        gc.apply_field_action(FieldAction::Gear { rotation: Rotation::CounterClockwise }, Pos::new(1, 1));
        assert_eq!(gc.player(a).heading, Heading::West);
        gc.apply_field_action(FieldAction::Gear { rotation: Rotation::Clockwise }, Pos::new(1, 1));
        assert_eq!(gc.player(a).heading, Heading::North);
        assert_eq!(gc.player(a).pos(), Pos::new(1, 1));
    }

    #[test]
    fn push_panel_respects_parity() {
        let mut gc = controller(3, 1);
        let a = gc.add_player("A", "red", Pos::new(0, 0), Heading::North).unwrap();
        let panel = FieldAction::PushPanel { heading: Heading::East, parity: PushParity::Even };
        gc.board.step = 0;
        assert!(!gc.apply_field_action(panel, Pos::new(0, 0)));
        assert_eq!(gc.player(a).pos(), Pos::new(0, 0));
        gc.board.step = 1;
        assert!(gc.apply_field_action(panel, Pos::new(0, 0)));
        assert_eq!(gc.player(a).pos(), Pos::new(1, 0));
    }

    #[test]
    fn checkpoints_count_in_order_and_end_the_race() {
        let mut gc = controller(3, 1);
        gc.board.add_action(Pos::new(1, 0), FieldAction::Checkpoint { id: 1 });
        gc.board.add_action(Pos::new(2, 0), FieldAction::Checkpoint { id: 2 });
        let a = gc.add_player("A", "red", Pos::new(2, 0), Heading::West).unwrap();
        gc.board.phase = Phase::Activation;

        assert!(!gc.apply_field_action(FieldAction::Checkpoint { id: 2 }, Pos::new(2, 0)));
        assert_eq!(gc.player(a).checkpoints, 0);

        gc.place_player(a, Pos::new(1, 0));
        assert!(gc.apply_field_action(FieldAction::Checkpoint { id: 1 }, Pos::new(1, 0)));
        assert_eq!(gc.player(a).checkpoints, 1);
        assert_eq!(gc.board.phase, Phase::Activation);

        gc.place_player(a, Pos::new(2, 0));
        assert!(gc.apply_field_action(FieldAction::Checkpoint { id: 2 }, Pos::new(2, 0)));
        assert_eq!(gc.board.winner, Some(a));
        assert_eq!(gc.board.phase, Phase::Finished);
    }

    #[test]
    fn energy_field_grants_a_cube() {
        let mut gc = controller(2, 1);
        let a = gc.add_player("A", "red", Pos::new(0, 0), Heading::North).unwrap();
        let before = gc.player(a).energy;
        assert!(gc.apply_field_action(FieldAction::EnergyCubeField, Pos::new(0, 0)));
        assert_eq!(gc.player(a).energy, before + 1);
        assert!(!gc.apply_field_action(FieldAction::EnergyCubeField, Pos::new(1, 0)));
    }
}
