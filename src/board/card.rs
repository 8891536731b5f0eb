//! Program cards and upgrade cards.
//!
//! Cards are immutable values. The engine only ever moves them between
//! piles and slots.

use serde::{Deserialize, Serialize};

/// The command printed on a program card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Move1,
    Move2,
    Move3,
    Back,
    TurnLeft,
    TurnRight,
    UTurn,
    Again,
    PowerUp,
    /// Interactive card: the player picks a left or right turn.
    LeftOrRight,
    Spam,
    Trojan,
    Worm,
    Virus,
}

/// All commands, in declaration order.
pub const ALL_COMMANDS: [Command; 14] = [
    Command::Move1,
    Command::Move2,
    Command::Move3,
    Command::Back,
    Command::TurnLeft,
    Command::TurnRight,
    Command::UTurn,
    Command::Again,
    Command::PowerUp,
    Command::LeftOrRight,
    Command::Spam,
    Command::Trojan,
    Command::Worm,
    Command::Virus,
];

impl Command {
    /// Human readable card title.
    pub const fn display_name(self) -> &'static str {
        match self {
            Command::Move1 => "Move 1",
            Command::Move2 => "Move 2",
            Command::Move3 => "Move 3",
            Command::Back => "Back Up",
            Command::TurnLeft => "Turn Left",
            Command::TurnRight => "Turn Right",
            Command::UTurn => "U-Turn",
            Command::Again => "Again",
            Command::PowerUp => "Power Up",
            Command::LeftOrRight => "Left or Right",
            Command::Spam => "SPAM",
            Command::Trojan => "Trojan Horse",
            Command::Worm => "Worm",
            Command::Virus => "Virus",
        }
    }

    /// Protocol token for this command.
    pub const fn token(self) -> &'static str {
        match self {
            Command::Move1 => "move1",
            Command::Move2 => "move2",
            Command::Move3 => "move3",
            Command::Back => "back",
            Command::TurnLeft => "left",
            Command::TurnRight => "right",
            Command::UTurn => "uturn",
            Command::Again => "again",
            Command::PowerUp => "powerup",
            Command::LeftOrRight => "leftorright",
            Command::Spam => "spam",
            Command::Trojan => "trojan",
            Command::Worm => "worm",
            Command::Virus => "virus",
        }
    }

    /// Parses a protocol token.
    pub fn from_token(s: &str) -> Option<Command> {
        ALL_COMMANDS.iter().copied().find(|c| c.token() == s)
    }

    /// Damage cards go back to the supply once played instead of the discard pile.
    pub const fn is_damage(self) -> bool {
        matches!(self, Command::Spam | Command::Trojan | Command::Worm | Command::Virus)
    }

    /// Options the player picks from when this card is resolved.
    pub fn options(self) -> &'static [Command] {
        match self {
            Command::LeftOrRight => &[Command::TurnLeft, Command::TurnRight],
            _ => &[],
        }
    }

    /// Returns true if resolving this card needs a player decision.
    pub fn is_interactive(self) -> bool {
        !self.options().is_empty()
    }
}

/// A program card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandCard {
    pub command: Command,
}

impl CommandCard {
    pub const fn new(command: Command) -> Self {
        CommandCard { command }
    }
}

/// Composition of the starting program deck.
const DEFAULT_DECK: [(Command, usize); 9] = [
    (Command::Move1, 5),
    (Command::Move2, 3),
    (Command::Move3, 1),
    (Command::TurnRight, 3),
    (Command::TurnLeft, 3),
    (Command::UTurn, 1),
    (Command::Back, 1),
    (Command::PowerUp, 1),
    (Command::Again, 2),
];

/// Builds the unshuffled 20-card starting deck.
pub fn default_deck() -> Vec<CommandCard> {
    DEFAULT_DECK
        .iter()
        .flat_map(|&(command, n)| std::iter::repeat(CommandCard::new(command)).take(n))
        .collect()
}

/// A capability that modifies movement or combat while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Upgrade {
    HoverUnit,
    RammingGear,
    VirusModule,
    RearLaser,
    DeflectorShield,
    DoubleBarrelLaser,
    PressorBeam,
    TractorBeam,
    MiniHowitzer,
}

/// Whether an upgrade stays on or must be switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    Permanent,
    Temporary,
}

/// An upgrade as sold in the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpgradeCard {
    pub upgrade: Upgrade,
    pub cost: u32,
    pub kind: UpgradeKind,
}

impl Upgrade {
    /// The shop card for this upgrade.
    pub const fn card(self) -> UpgradeCard {
        let (cost, kind) = match self {
            Upgrade::HoverUnit => (1, UpgradeKind::Permanent),
            Upgrade::RammingGear => (2, UpgradeKind::Permanent),
            Upgrade::VirusModule => (2, UpgradeKind::Permanent),
            Upgrade::RearLaser => (2, UpgradeKind::Permanent),
            Upgrade::DeflectorShield => (2, UpgradeKind::Temporary),
            Upgrade::DoubleBarrelLaser => (2, UpgradeKind::Permanent),
            Upgrade::PressorBeam => (3, UpgradeKind::Temporary),
            Upgrade::TractorBeam => (3, UpgradeKind::Temporary),
            Upgrade::MiniHowitzer => (2, UpgradeKind::Temporary),
        };
        UpgradeCard { upgrade: self, cost, kind }
    }
}

/// Every upgrade in the game, one card each.
pub const ALL_UPGRADES: [Upgrade; 9] = [
    Upgrade::HoverUnit,
    Upgrade::RammingGear,
    Upgrade::VirusModule,
    Upgrade::RearLaser,
    Upgrade::DeflectorShield,
    Upgrade::DoubleBarrelLaser,
    Upgrade::PressorBeam,
    Upgrade::TractorBeam,
    Upgrade::MiniHowitzer,
];
