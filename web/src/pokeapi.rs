use gloo::net::http::Request;
use pokeflip_core::{SpeciesId, SupplyError, Token, TokenSource, pokeapi};

/// Artwork base used when playing without network access.
pub(crate) const OFFLINE_ART_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork";

/// [`TokenSource`] backed by PokéAPI over the browser's fetch.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct PokeApiSource;

impl TokenSource for PokeApiSource {
    async fn lookup(&self, id: SpeciesId) -> Result<Option<Token>, SupplyError> {
        let url = pokeapi::species_url(id);
        log::trace!("GET {}", url);

        let response = Request::get(&url)
            .send()
            .await
            .map_err(|err| SupplyError::Source(err.to_string()))?;

        if response.status() == 404 {
            log::warn!("species {} not found", id);
            return Ok(None);
        }
        if !response.ok() {
            return Err(SupplyError::Source(format!(
                "{} answered {} {}",
                url,
                response.status(),
                response.status_text()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|err| SupplyError::Source(err.to_string()))?;
        pokeapi::token_from_payload(id, &body)
    }
}
