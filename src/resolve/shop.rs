//! Upgrade shop and the upgrade phase.

use crate::board::{Phase, PlayerId, UpgradeCard};
use crate::controller::GameController;

impl GameController {
    /// Number of shop slots for this match.
    fn shop_size(&self) -> usize {
        if self.config.shop_size == 0 {
            self.players.len()
        } else {
            self.config.shop_size
        }
    }

    /// Fills empty shop slots from the upgrade deck.
    pub(crate) fn refill_shop(&mut self) {
        let size = self.shop_size();
        self.board.shop.resize(size, None);
        for slot in self.board.shop.iter_mut().filter(|s| s.is_none()) {
            match self.upgrade_deck.pop() {
                Some(upgrade) => *slot = Some(upgrade.card()),
                None => break,
            }
        }
    }

    /// Switches from programming to the upgrade phase.
    pub fn open_upgrade_shop(&mut self) -> bool {
        if self.board.phase != Phase::Programming {
            return false;
        }
        self.set_phase(Phase::Upgrade);
        true
    }

    /// Closes the shop and resumes programming.
    pub fn close_upgrade_shop(&mut self) -> bool {
        if self.board.phase != Phase::Upgrade {
            return false;
        }
        self.set_phase(Phase::Programming);
        true
    }

    /// The current player buys the card in shop slot `slot`.
    pub fn buy_upgrade(&mut self, slot: usize) -> bool {
        match self.board.current_player {
            Some(id) => self.buy_upgrade_for(id, slot),
            None => false,
        }
    }

    /// Player `id` buys the card in shop slot `slot`. The slot is emptied only
    /// if the purchase goes through.
    pub fn buy_upgrade_for(&mut self, id: PlayerId, slot: usize) -> bool {
        if !matches!(self.board.phase, Phase::Programming | Phase::Upgrade) || id >= self.players.len() {
            return false;
        }
        let Some(card) = self.board.shop.get(slot).copied().flatten() else {
            return false;
        };
        if !self.players[id].buy_upgrade_card(card, self.config.upgrade_slots) {
            return false;
        }
        self.board.shop[slot] = None;
        tracing::info!(player = %self.players[id].name, upgrade = ?card.upgrade, "bought upgrade");
        true
    }

    /// Switches a temporary upgrade on or off.
    pub fn toggle_upgrade(&mut self, id: PlayerId, index: usize) -> Option<bool> {
        self.players.get_mut(id)?.toggle_upgrade(index)
    }

    /// Drops an upgrade; its card goes under the upgrade deck.
    pub fn discard_upgrade(&mut self, id: PlayerId, index: usize, permanent: bool) -> Option<UpgradeCard> {
        let card = self.players.get_mut(id)?.discard_upgrade(index, permanent)?;
        self.upgrade_deck.insert(0, card.upgrade);
        Some(card)
    }
}

#[cfg(test)]
mod tests {
    use crate::board::{Heading, Phase, Pos, Upgrade};
    use crate::controller::tests::controller;

    #[test]
    fn shop_fills_one_slot_per_player() {
        let mut gc = controller(3, 1);
        gc.add_player("A", "red", Pos::new(0, 0), Heading::East).unwrap();
        gc.add_player("B", "blue", Pos::new(2, 0), Heading::West).unwrap();
        gc.refill_shop();
        assert_eq!(gc.board.shop.len(), 2);
        assert!(gc.board.shop.iter().all(|s| s.is_some()));
    }

    #[test]
    fn buying_empties_the_slot() {
        let mut gc = controller(3, 1);
        let a = gc.add_player("A", "red", Pos::new(0, 0), Heading::East).unwrap();
        gc.board.phase = Phase::Programming;
        gc.board.shop = vec![Some(Upgrade::HoverUnit.card())];
        gc.players[a].energy = 1;

        assert!(gc.buy_upgrade_for(a, 0));
        assert_eq!(gc.board.shop, vec![None]);
        assert!(gc.player(a).has_active_upgrade(Upgrade::HoverUnit));
        assert_eq!(gc.player(a).energy, 0);
        assert!(!gc.buy_upgrade_for(a, 0));
    }

    #[test]
    fn failed_purchase_changes_nothing() {
        let mut gc = controller(3, 1);
        let a = gc.add_player("A", "red", Pos::new(0, 0), Heading::East).unwrap();
        gc.board.phase = Phase::Programming;
        gc.board.shop = vec![Some(Upgrade::PressorBeam.card())];
        gc.players[a].energy = 0;

        assert!(!gc.buy_upgrade_for(a, 0));
        assert_eq!(gc.board.shop, vec![Some(Upgrade::PressorBeam.card())]);
        assert!(gc.player(a).temporary_upgrades.is_empty());
        assert!(!gc.buy_upgrade_for(a, 5));
    }

    #[test]
    fn purchases_only_between_rounds() {
        let mut gc = controller(3, 1);
        let a = gc.add_player("A", "red", Pos::new(0, 0), Heading::East).unwrap();
        gc.board.shop = vec![Some(Upgrade::HoverUnit.card())];
        gc.players[a].energy = 5;
        gc.board.phase = Phase::Activation;
        assert!(!gc.buy_upgrade_for(a, 0));
        gc.board.phase = Phase::Upgrade;
        assert!(gc.buy_upgrade_for(a, 0));
    }

    #[test]
    fn shop_opens_from_programming_only() {
        let mut gc = controller(1, 1);
        assert!(!gc.open_upgrade_shop());
        gc.board.phase = Phase::Programming;
        assert!(gc.open_upgrade_shop());
        assert_eq!(gc.board.phase, Phase::Upgrade);
        assert!(gc.close_upgrade_shop());
        assert_eq!(gc.board.phase, Phase::Programming);
        assert!(!gc.close_upgrade_shop());
    }

    #[test]
    fn discarded_upgrades_return_to_the_deck() {
        let mut gc = controller(1, 1);
        let a = gc.add_player("A", "red", Pos::new(0, 0), Heading::East).unwrap();
        gc.upgrade_deck.clear();
        gc.players[a].energy = 5;
        assert!(gc.players[a].buy_upgrade_card(Upgrade::DeflectorShield.card(), 3));
        assert_eq!(gc.toggle_upgrade(a, 0), Some(true));
        assert_eq!(gc.discard_upgrade(a, 0, false), Some(Upgrade::DeflectorShield.card()));
        assert_eq!(gc.upgrade_deck, vec![Upgrade::DeflectorShield]);
        assert_eq!(gc.toggle_upgrade(a, 0), None);
    }
}
