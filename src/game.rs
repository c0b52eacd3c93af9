//! This module contains the interface between the analysis and the
//! game-specific engine-function tables.
//!
//! Every Aurora-engine game ships its own set of engine functions reachable
//! through the `ACTION` opcode. The tables themselves live outside this
//! library; the analysis only needs the signatures, which it obtains through
//! the [`FunctionSignatures`] trait.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::variable::VariableType;

/// The Aurora-engine game a script was compiled for.
///
/// The game decides which engine-function table applies and what the
/// engine types 0 through 5 mean.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum GameId {
    #[default]
    Unknown,
    /// Neverwinter Nights.
    Nwn,
    /// Neverwinter Nights 2.
    Nwn2,
    /// Star Wars: Knights of the Old Republic.
    Kotor,
    /// Star Wars: Knights of the Old Republic II.
    Kotor2,
    /// Jade Empire.
    Jade,
    /// The Witcher.
    Witcher,
    /// Sonic Chronicles: The Dark Brotherhood.
    Sonic,
    /// Dragon Age: Origins.
    DragonAge,
    /// Dragon Age II.
    DragonAge2,
}

impl Display for GameId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameId::Unknown => "unknown",
            GameId::Nwn => "nwn",
            GameId::Nwn2 => "nwn2",
            GameId::Kotor => "kotor",
            GameId::Kotor2 => "kotor2",
            GameId::Jade => "jade",
            GameId::Witcher => "witcher",
            GameId::Sonic => "sonic",
            GameId::DragonAge => "dragonage",
            GameId::DragonAge2 => "dragonage2",
        };
        write!(f, "{name}")
    }
}

/// The interface to the engine-function tables, keyed by game and function
/// index.
///
/// The interface is simple, but it can encapsulate arbitrary table storage as
/// far as the analysis is concerned: generated tables, tables loaded from
/// data files, or hand-written stubs in tests.
pub trait FunctionSignatures {
    /// Gets the number of parameters the function `function` declares for
    /// `game`, including parameters with default values.
    #[must_use]
    fn parameter_count(&self, game: GameId, function: u32) -> usize;

    /// Gets the declared parameter types of the function `function` for
    /// `game`, in call order.
    #[must_use]
    fn parameter_types(&self, game: GameId, function: u32) -> &[VariableType];

    /// Gets the return type of the function `function` for `game`.
    ///
    /// Functions without a return value report [`VariableType::Void`].
    #[must_use]
    fn return_type(&self, game: GameId, function: u32) -> VariableType;
}

/// An implementation of [`FunctionSignatures`] that knows no functions at
/// all: every function takes no parameters and returns nothing.
///
/// Useful when analyzing scripts that never execute `ACTION`, or when no
/// table is available for the game in question.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct EmptySignatures;

impl FunctionSignatures for EmptySignatures {
    fn parameter_count(&self, _game: GameId, _function: u32) -> usize {
        0
    }

    fn parameter_types(&self, _game: GameId, _function: u32) -> &[VariableType] {
        &[]
    }

    fn return_type(&self, _game: GameId, _function: u32) -> VariableType {
        VariableType::Void
    }
}
