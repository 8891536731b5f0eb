//! Per-robot state: position, program, card piles and upgrades.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::card::{default_deck, Command, CommandCard, Upgrade, UpgradeCard, UpgradeKind};
use super::heading::{Heading, Pos};

/// Number of program registers executed each round.
pub const NO_REGISTERS: usize = 5;

/// Index of a player in the match's player list.
pub type PlayerId = usize;

/// A hand or register slot holding at most one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardField {
    pub card: Option<CommandCard>,
    pub visible: bool,
}

impl Default for CardField {
    fn default() -> Self {
        CardField { card: None, visible: true }
    }
}

/// An upgrade held by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedUpgrade {
    pub card: UpgradeCard,
    /// Always true for permanent upgrades.
    pub active: bool,
}

/// A robot and its owner's cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub color: String,
    pub heading: Heading,
    /// Current space. Only the controller writes this, mirrored on `Space::player`.
    pub(crate) pos: Pos,
    pub registers: [CardField; NO_REGISTERS],
    pub hand: Vec<CardField>,
    pub draw_pile: Vec<CommandCard>,
    pub discard_pile: Vec<CommandCard>,
    pub permanent_upgrades: Vec<OwnedUpgrade>,
    pub temporary_upgrades: Vec<OwnedUpgrade>,
    pub energy: u32,
    pub checkpoints: u32,
    pub rebooting: bool,
    /// Command resolved in the previous register this round, for `Again`.
    pub previous_command: Option<Command>,
}

impl Player {
    /// Creates a player with the default deck shuffled into the draw pile.
    pub fn new(
        name: impl Into<String>,
        color: impl Into<String>,
        pos: Pos,
        heading: Heading,
        hand_size: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let mut draw_pile = default_deck();
        draw_pile.shuffle(rng);
        Player {
            name: name.into(),
            color: color.into(),
            heading,
            pos,
            registers: [CardField::default(); NO_REGISTERS],
            hand: vec![CardField::default(); hand_size],
            draw_pile,
            discard_pile: Vec::new(),
            permanent_upgrades: Vec::new(),
            temporary_upgrades: Vec::new(),
            energy: 0,
            checkpoints: 0,
            rebooting: false,
            previous_command: None,
        }
    }

    /// Current position on the board.
    pub fn pos(&self) -> Pos {
        self.pos
    }

    /// Draws the top card. When the draw pile is empty the discard pile is
    /// shuffled back into it first. Returns `None` only if both are empty.
    pub fn draw_card(&mut self, rng: &mut impl Rng) -> Option<CommandCard> {
        if self.draw_pile.is_empty() {
            if self.discard_pile.is_empty() {
                return None;
            }
            self.draw_pile.append(&mut self.discard_pile);
            self.draw_pile.shuffle(rng);
        }
        self.draw_pile.pop()
    }

    /// Puts a played card away. Damage cards return to the supply.
    pub fn discard_card(&mut self, card: CommandCard) {
        if !card.command.is_damage() {
            self.discard_pile.push(card);
        }
    }

    /// Adds a damage card to the discard pile.
    pub fn take_damage(&mut self, damage: Command) {
        self.discard_pile.push(CommandCard::new(damage));
    }

    /// Returns true if every register holds a card.
    pub fn program_complete(&self) -> bool {
        self.registers.iter().all(|f| f.card.is_some())
    }

    /// Returns true if the upgrade is owned and switched on.
    pub fn has_active_upgrade(&self, upgrade: Upgrade) -> bool {
        self.permanent_upgrades
            .iter()
            .chain(self.temporary_upgrades.iter())
            .any(|u| u.card.upgrade == upgrade && u.active)
    }

    /// Takes an upgrade if the player can pay for it and has a free slot
    /// of the right kind. Returns false without side effects otherwise.
    pub fn buy_upgrade_card(&mut self, card: UpgradeCard, slots: usize) -> bool {
        if self.energy < card.cost {
            return false;
        }
        let owned = match card.kind {
            UpgradeKind::Permanent => &mut self.permanent_upgrades,
            UpgradeKind::Temporary => &mut self.temporary_upgrades,
        };
        if owned.len() >= slots || owned.iter().any(|u| u.card.upgrade == card.upgrade) {
            return false;
        }
        owned.push(OwnedUpgrade {
            card,
            active: card.kind == UpgradeKind::Permanent,
        });
        self.energy -= card.cost;
        true
    }

    /// Flips a temporary upgrade on or off. Returns the new state.
    pub fn toggle_upgrade(&mut self, index: usize) -> Option<bool> {
        let owned = self.temporary_upgrades.get_mut(index)?;
        owned.active = !owned.active;
        Some(owned.active)
    }

    /// Drops an upgrade, freeing its slot.
    pub fn discard_upgrade(&mut self, index: usize, permanent: bool) -> Option<UpgradeCard> {
        let owned = if permanent {
            &mut self.permanent_upgrades
        } else {
            &mut self.temporary_upgrades
        };
        if index < owned.len() {
            Some(owned.remove(index).card)
        } else {
            None
        }
    }
}
