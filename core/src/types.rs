/// National dex number used to identify a species.
pub type SpeciesId = u16;

/// Index of a card in display order.
pub type Position = u8;

/// Count type used for pairs on a board.
pub type PairCount = u8;

/// Whole seconds, as reported by the round clock.
pub type Seconds = u32;

/// Highest species id the image API is queried for.
pub const MAX_SPECIES_ID: SpeciesId = 898;

/// Largest board that still has every position addressable by [`Position`].
pub const MAX_PAIRS: PairCount = (Position::MAX / 2) as PairCount;

pub const fn card_count(pairs: PairCount) -> usize {
    pairs as usize * 2
}

pub const fn is_valid_species(id: SpeciesId) -> bool {
    id >= 1 && id <= MAX_SPECIES_ID
}
