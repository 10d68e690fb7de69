//! PokéAPI request and response shapes.
//!
//! Only the URL and payload handling lives here; the HTTP request itself is
//! made by whichever host embeds the engine.

use alloc::format;
use alloc::string::{String, ToString};
use serde::Deserialize;

use crate::*;

pub const API_BASE: &str = "https://pokeapi.co/api/v2/pokemon";

pub fn species_url(id: SpeciesId) -> String {
    format!("{API_BASE}/{id}")
}

#[derive(Deserialize)]
struct PokemonPayload {
    sprites: Sprites,
}

#[derive(Deserialize)]
struct Sprites {
    #[serde(default)]
    other: Option<OtherSprites>,
}

#[derive(Deserialize)]
struct OtherSprites {
    #[serde(rename = "official-artwork", default)]
    official_artwork: Option<Artwork>,
}

#[derive(Deserialize)]
struct Artwork {
    #[serde(default)]
    front_default: Option<String>,
}

/// Extracts `sprites.other["official-artwork"].front_default` from a pokemon
/// payload. A missing or null image yields `Ok(None)`.
pub fn artwork_url(body: &str) -> core::result::Result<Option<String>, SupplyError> {
    let payload: PokemonPayload =
        serde_json::from_str(body).map_err(|err| SupplyError::Payload(err.to_string()))?;

    Ok(payload
        .sprites
        .other
        .and_then(|other| other.official_artwork)
        .and_then(|artwork| artwork.front_default)
        .filter(|url| !url.is_empty()))
}

pub fn token_from_payload(id: SpeciesId, body: &str) -> core::result::Result<Option<Token>, SupplyError> {
    Ok(artwork_url(body)?.map(|image_url| Token::new(id, image_url)))
}
