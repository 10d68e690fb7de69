use alloc::string::String;
use alloc::sync::Arc;
use serde::{Deserialize, Serialize};

use crate::*;

/// A matchable species together with the artwork shown on the card face.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    id: SpeciesId,
    image_url: String,
}

impl Token {
    pub fn new(id: SpeciesId, image_url: impl Into<String>) -> Self {
        Self {
            id,
            image_url: image_url.into(),
        }
    }

    pub const fn id(&self) -> SpeciesId {
        self.id
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }
}

/// Canonical face state of a card as tracked by the match engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardState {
    #[default]
    Hidden,
    Revealed,
    Matched,
}

impl CardState {
    pub const fn is_face_up(self) -> bool {
        matches!(self, Self::Revealed | Self::Matched)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    token: Arc<Token>,
    position: Position,
    state: CardState,
}

impl Card {
    pub(crate) fn new(token: Arc<Token>, position: Position) -> Self {
        Self {
            token,
            position,
            state: CardState::Hidden,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn species(&self) -> SpeciesId {
        self.token.id()
    }

    pub const fn position(&self) -> Position {
        self.position
    }

    pub const fn state(&self) -> CardState {
        self.state
    }

    pub(crate) fn into_token(self) -> Token {
        Arc::unwrap_or_clone(self.token)
    }

    pub(crate) fn set_state(&mut self, state: CardState) {
        self.state = state;
    }

    pub fn matches(&self, other: &Card) -> bool {
        self.species() == other.species()
    }
}
