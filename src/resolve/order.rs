//! Turn order from the priority antenna.

use crate::board::PlayerId;
use crate::controller::GameController;

/// Orders entries by ascending distance, then ascending angle.
///
/// Each entry is inserted before the first placed entry it beats strictly,
/// otherwise appended, so exact ties keep their input order.
pub fn order_by_antenna(metrics: &[(u32, f64)]) -> Vec<usize> {
    let mut order: Vec<usize> = Vec::with_capacity(metrics.len());
    for (i, &(distance, angle)) in metrics.iter().enumerate() {
        let slot = order.iter().position(|&j| {
            let (other_distance, other_angle) = metrics[j];
            distance < other_distance || (distance == other_distance && angle < other_angle)
        });
        match slot {
            Some(at) => order.insert(at, i),
            None => order.push(i),
        }
    }
    order
}

impl GameController {
    /// Recomputes the turn order from each robot's position.
    pub fn determine_player_order(&mut self) {
        let metrics: Vec<(u32, f64)> = self
            .players
            .iter()
            .map(|p| {
                (
                    self.board.distance_to_antenna(p.pos),
                    self.board.angle_to_antenna(p.pos),
                )
            })
            .collect();
        self.player_order = order_by_antenna(&metrics);
        tracing::debug!(order = ?self.player_order, "turn order");
    }

    /// The robot acting after `id` in the current order.
    pub(crate) fn next_in_order(&self, id: PlayerId) -> Option<PlayerId> {
        let idx = self.player_order.iter().position(|&p| p == id)?;
        self.player_order.get(idx + 1).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Antenna, Heading, Pos};
    use crate::controller::tests::controller;

    #[test]
    fn distance_first_then_angle() {
        let order = order_by_antenna(&[(3, 10.0), (3, 5.0), (1, 0.0)]);
        assert_eq!(order, vec![2, 1, 0]);
    }

    #[test]
    fn exact_ties_keep_input_order() {
        let order = order_by_antenna(&[(2, 45.0), (2, 45.0), (2, 45.0)]);
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn empty_and_single() {
        assert!(order_by_antenna(&[]).is_empty());
        assert_eq!(order_by_antenna(&[(7, 0.0)]), vec![0]);
    }

    #[test]
    fn order_is_a_permutation_sorted_by_key() {
        let metrics = [(4, 90.0), (1, 270.0), (4, 0.0), (2, 180.0), (1, 90.0)];
        let order = order_by_antenna(&metrics);
        let mut seen = order.clone();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        for pair in order.windows(2) {
            let (a, b) = (metrics[pair[0]], metrics[pair[1]]);
            assert!(a.0 < b.0 || (a.0 == b.0 && a.1 <= b.1));
        }
    }

    #[test]
    fn board_geometry_drives_the_order() {
        let mut gc = controller(7, 7);
        gc.board.antenna = Antenna { pos: Pos::new(0, 3), heading: Heading::East };
        let far_south = gc.add_player("A", "red", Pos::new(2, 4), Heading::North).unwrap();
        let far_east = gc.add_player("B", "blue", Pos::new(3, 3), Heading::North).unwrap();
        let near = gc.add_player("C", "green", Pos::new(1, 3), Heading::North).unwrap();
        gc.determine_player_order();
        assert_eq!(gc.player_order(), &[near, far_east, far_south]);
        assert_eq!(gc.next_in_order(near), Some(far_east));
        assert_eq!(gc.next_in_order(far_south), None);
    }
}
