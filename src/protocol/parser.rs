//! Line protocol parser.
//!
//! Parses incoming driver lines from raw text into structured `Instruction`
//! variants that the main loop can dispatch on.

use crate::board::{Command, PlayerId};

/// A parsed driver-to-engine instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Load a board layout and seat `players` robots (default: one per start).
    NewGame { layout: String, players: Option<usize> },

    /// Resume a match from a snapshot file.
    Load { path: String },

    /// Set an engine option: `setoption name <id> [value <x>]`.
    SetOption { name: String, value: Option<String> },

    /// Deal the first hands.
    Start,

    /// Move hand cards into a player's registers, register 1 first.
    Program { player: PlayerId, cards: Vec<usize> },

    /// Lock in all programs and start activation.
    Finish,

    /// Resolve one card.
    Step,

    /// Resolve cards until a choice is needed or the round ends.
    Run,

    /// Answer a pending interactive card.
    Choose(Command),

    /// Open the upgrade shop.
    Shop,

    /// Close the upgrade shop.
    CloseShop,

    /// Buy shop slot `slot` for `player`, or the current player if omitted.
    Buy { slot: usize, player: Option<PlayerId> },

    /// Switch a temporary upgrade on or off.
    Toggle { player: PlayerId, index: usize },

    /// Print the current state as JSON.
    State,

    /// Remove laser beams from the display state.
    ClearLasers,

    /// Terminate the engine process.
    Quit,
}

/// Parses a single line of input into an `Instruction`.
///
/// Returns `None` for empty lines or unrecognized instructions. Malformed
/// arguments for known instructions also return `None` after logging.
pub fn parse_instruction(line: &str) -> Option<Instruction> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (&keyword, args) = tokens.split_first()?;

    match keyword {
        "start" => Some(Instruction::Start),
        "finish" => Some(Instruction::Finish),
        "step" => Some(Instruction::Step),
        "run" => Some(Instruction::Run),
        "shop" => Some(Instruction::Shop),
        "closeshop" => Some(Instruction::CloseShop),
        "state" => Some(Instruction::State),
        "clearlasers" => Some(Instruction::ClearLasers),
        "quit" => Some(Instruction::Quit),

        "newgame" => parse_newgame(args),
        "load" => parse_load(args),
        "setoption" => parse_setoption(args),
        "program" => parse_program(args),
        "choose" => parse_choose(args),
        "buy" => parse_buy(args),
        "toggle" => parse_toggle(args),

        other => {
            tracing::warn!("unknown instruction: {}", other);
            None
        }
    }
}

/// Parses a numeric argument, logging what was expected on failure.
fn number(token: &str, what: &str) -> Option<usize> {
    match token.parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("invalid {} value: '{}'", what, token);
            None
        }
    }
}

/// Parses `newgame <layout-file> [<players>]`.
fn parse_newgame(args: &[&str]) -> Option<Instruction> {
    match args {
        [layout] => Some(Instruction::NewGame {
            layout: layout.to_string(),
            players: None,
        }),
        [layout, n] => Some(Instruction::NewGame {
            layout: layout.to_string(),
            players: Some(number(n, "player count")?),
        }),
        _ => {
            tracing::warn!("malformed newgame: expected 'newgame <layout-file> [<players>]'");
            None
        }
    }
}

/// Parses `load <snapshot-file>`.
fn parse_load(args: &[&str]) -> Option<Instruction> {
    match args {
        [path] => Some(Instruction::Load { path: path.to_string() }),
        _ => {
            tracing::warn!("malformed load: expected 'load <snapshot-file>'");
            None
        }
    }
}

/// Parses `setoption name <id> [value <x>]`.
fn parse_setoption(args: &[&str]) -> Option<Instruction> {
    if args.len() < 2 || args[0] != "name" {
        tracing::warn!("malformed setoption: expected 'setoption name <id> [value <x>]'");
        return None;
    }

    let rest = &args[1..];
    let (name_parts, value_parts) = match rest.iter().position(|&t| t == "value") {
        Some(vi) => (&rest[..vi], Some(&rest[vi + 1..])),
        None => (rest, None),
    };
    if name_parts.is_empty() {
        tracing::warn!("malformed setoption: empty name");
        return None;
    }
    let value = value_parts
        .filter(|parts| !parts.is_empty())
        .map(|parts| parts.join(" "));

    Some(Instruction::SetOption {
        name: name_parts.join(" "),
        value,
    })
}

/// Parses `program <player> <hand-idx>...`.
fn parse_program(args: &[&str]) -> Option<Instruction> {
    let Some((player, cards)) = args.split_first() else {
        tracing::warn!("malformed program: expected 'program <player> <hand-idx>...'");
        return None;
    };
    let player = number(player, "player")?;
    let cards = cards
        .iter()
        .map(|t| number(t, "hand index"))
        .collect::<Option<Vec<_>>>()?;
    Some(Instruction::Program { player, cards })
}

/// Parses `choose <command>`.
fn parse_choose(args: &[&str]) -> Option<Instruction> {
    let [token] = args else {
        tracing::warn!("malformed choose: expected 'choose <command>'");
        return None;
    };
    match Command::from_token(token) {
        Some(command) => Some(Instruction::Choose(command)),
        None => {
            tracing::warn!("unknown command: '{}'", token);
            None
        }
    }
}

/// Parses `buy <slot> [<player>]`.
fn parse_buy(args: &[&str]) -> Option<Instruction> {
    match args {
        [slot] => Some(Instruction::Buy {
            slot: number(slot, "slot")?,
            player: None,
        }),
        [slot, player] => Some(Instruction::Buy {
            slot: number(slot, "slot")?,
            player: Some(number(player, "player")?),
        }),
        _ => {
            tracing::warn!("malformed buy: expected 'buy <slot> [<player>]'");
            None
        }
    }
}

/// Parses `toggle <player> <index>`.
fn parse_toggle(args: &[&str]) -> Option<Instruction> {
    let [player, index] = args else {
        tracing::warn!("malformed toggle: expected 'toggle <player> <index>'");
        return None;
    };
    Some(Instruction::Toggle {
        player: number(player, "player")?,
        index: number(index, "upgrade index")?,
    })
}
