use alloc::string::String;
use thiserror::Error;

use crate::{PairCount, SpeciesId};

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid card position")]
    InvalidPosition,
    #[error("Species {0} does not appear exactly twice on the board")]
    UnpairedToken(SpeciesId),
    #[error("Species {0} was supplied more than once")]
    DuplicateToken(SpeciesId),
    #[error("Board has no cards")]
    EmptyBoard,
    #[error("Board has more cards than positions")]
    BoardTooLarge,
    #[error("A newer round setup superseded this one")]
    StaleSetup,
}

pub type Result<T> = core::result::Result<T, GameError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupplyError {
    #[error("Cannot build a board with {0} pairs")]
    InvalidPairCount(PairCount),
    #[error("Ran out of species, requested {requested} but only found {obtained}")]
    Exhausted {
        requested: PairCount,
        obtained: PairCount,
    },
    #[error("Token source failed: {0}")]
    Source(String),
    #[error("Malformed token payload: {0}")]
    Payload(String),
    #[error(transparent)]
    Board(#[from] GameError),
}
