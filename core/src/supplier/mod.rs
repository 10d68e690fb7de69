use alloc::vec::Vec;
use core::future::Future;
use rand::prelude::*;

use crate::*;
pub use memory::*;

mod memory;
pub mod pokeapi;

/// Looks up the artwork for a single species.
pub trait TokenSource {
    /// Resolves to `Ok(None)` when the species exists but has no usable image.
    fn lookup(&self, id: SpeciesId) -> impl Future<Output = core::result::Result<Option<Token>, SupplyError>>;
}

/// Draws distinct species from a [`TokenSource`] and lays them out as a board.
///
/// Dropping the future returned by [`Self::prepare_board`] cancels the fetch;
/// nothing is handed to the engine until the whole board is ready.
#[derive(Clone, Debug)]
pub struct CardSupplier<S> {
    source: S,
    rng: SmallRng,
    max_draws: u16,
}

impl<S: TokenSource> CardSupplier<S> {
    pub fn new(source: S, seed: u64) -> Self {
        Self {
            source,
            rng: SmallRng::seed_from_u64(seed),
            max_draws: MAX_SPECIES_ID,
        }
    }

    /// Limits how many species may be looked up for a single board.
    #[must_use]
    pub fn with_max_draws(mut self, max_draws: u16) -> Self {
        self.max_draws = max_draws.min(MAX_SPECIES_ID);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches `pairs` tokens with distinct species ids in `1..=MAX_SPECIES_ID`.
    ///
    /// Species without artwork are skipped and another one is drawn in their
    /// place.
    pub async fn fetch_unique_tokens(
        &mut self,
        pairs: PairCount,
    ) -> core::result::Result<Vec<Token>, SupplyError> {
        if pairs == 0 || pairs > MAX_PAIRS {
            return Err(SupplyError::InvalidPairCount(pairs));
        }

        // partial Fisher-Yates over the id pool, so no species is drawn twice
        let mut pool: Vec<SpeciesId> = (1..=MAX_SPECIES_ID).collect();
        let budget = usize::from(self.max_draws).min(pool.len());
        let mut tokens = Vec::with_capacity(pairs.into());
        let mut draws = 0;

        while tokens.len() < usize::from(pairs) {
            if draws >= budget {
                log::warn!(
                    "gave up after {} draws with {} of {} species",
                    draws,
                    tokens.len(),
                    pairs
                );
                return Err(SupplyError::Exhausted {
                    requested: pairs,
                    obtained: tokens.len() as PairCount,
                });
            }

            let pick = self.rng.random_range(draws..pool.len());
            pool.swap(draws, pick);
            let id = pool[draws];
            draws += 1;

            match self.source.lookup(id).await? {
                Some(token) if token.id() == id => tokens.push(token),
                Some(token) => {
                    log::warn!("asked for species {} but got {}, skipping", id, token.id());
                }
                None => log::warn!("species {} has no artwork, drawing another", id),
            }
        }

        log::debug!("fetched {} species in {} draws", tokens.len(), draws);
        Ok(tokens)
    }

    pub fn build_shuffled_board(&mut self, tokens: Vec<Token>) -> Result<Board> {
        Board::shuffled(tokens, &mut self.rng)
    }

    pub async fn prepare_board(&mut self, pairs: PairCount) -> core::result::Result<Board, SupplyError> {
        let tokens = self.fetch_unique_tokens(pairs).await?;
        Ok(self.build_shuffled_board(tokens)?)
    }
}
