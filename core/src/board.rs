use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Index;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// Cards in display order, holding exactly two cards per species.
///
/// Every constructor validates the pair invariant, so a `Board` value can be
/// handed to [`MatchEngine::start_round`] without further checks. This
/// includes deserialization, which goes through [`Board::from_layout`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SavedBoard")]
pub struct Board {
    cards: Vec<Card>,
}

/// Unchecked wire form of a [`Board`].
#[derive(Deserialize)]
struct SavedBoard {
    cards: Vec<Card>,
}

impl TryFrom<SavedBoard> for Board {
    type Error = GameError;

    fn try_from(saved: SavedBoard) -> Result<Self> {
        // the board of an idle engine
        if saved.cards.is_empty() {
            return Ok(Self::default());
        }

        let mut states = Vec::with_capacity(saved.cards.len());
        let mut layout = Vec::with_capacity(saved.cards.len());
        for (index, card) in saved.cards.into_iter().enumerate() {
            if usize::from(card.position()) != index {
                return Err(GameError::InvalidPosition);
            }
            states.push(card.state());
            layout.push(card.into_token());
        }

        let mut board = Self::from_layout(layout)?;
        for (card, state) in board.cards.iter_mut().zip(states) {
            card.set_state(state);
        }
        Ok(board)
    }
}

impl Board {
    /// Builds a board from tokens already laid out in display order.
    pub fn from_layout(layout: Vec<Token>) -> Result<Self> {
        if layout.is_empty() {
            return Err(GameError::EmptyBoard);
        }
        if layout.len() > card_count(MAX_PAIRS) {
            return Err(GameError::BoardTooLarge);
        }

        let mut counts: BTreeMap<SpeciesId, u8> = BTreeMap::new();
        for token in &layout {
            let count = counts.entry(token.id()).or_default();
            *count = count.saturating_add(1);
        }
        if let Some((&species, _)) = counts.iter().find(|&(_, &count)| count != 2) {
            return Err(GameError::UnpairedToken(species));
        }

        // both cards of a pair share one allocation
        let mut shared: BTreeMap<SpeciesId, Arc<Token>> = BTreeMap::new();
        let cards = layout
            .into_iter()
            .enumerate()
            .map(|(index, token)| {
                let token = shared
                    .entry(token.id())
                    .or_insert_with(|| Arc::new(token))
                    .clone();
                Card::new(token, index as Position)
            })
            .collect();

        Ok(Self { cards })
    }

    /// Duplicates every token and lays the pairs out in uniformly random order.
    pub fn shuffled<R: Rng + ?Sized>(tokens: Vec<Token>, rng: &mut R) -> Result<Self> {
        if tokens.is_empty() {
            return Err(GameError::EmptyBoard);
        }
        if tokens.len() > MAX_PAIRS as usize {
            return Err(GameError::BoardTooLarge);
        }

        let mut seen = alloc::collections::BTreeSet::new();
        for token in &tokens {
            if !seen.insert(token.id()) {
                return Err(GameError::DuplicateToken(token.id()));
            }
        }

        let mut layout: Vec<Token> = tokens
            .into_iter()
            .flat_map(|token| [token.clone(), token])
            .collect();
        layout.shuffle(rng);

        Self::from_layout(layout)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn total_pairs(&self) -> PairCount {
        (self.cards.len() / 2) as PairCount
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card_at(&self, position: Position) -> Result<&Card> {
        self.cards
            .get(usize::from(position))
            .ok_or(GameError::InvalidPosition)
    }

    pub fn validate_position(&self, position: Position) -> Result<Position> {
        if usize::from(position) < self.cards.len() {
            Ok(position)
        } else {
            Err(GameError::InvalidPosition)
        }
    }

    pub(crate) fn set_state(&mut self, position: Position, state: CardState) {
        if let Some(card) = self.cards.get_mut(usize::from(position)) {
            card.set_state(state);
        }
    }

    pub(crate) fn hide_all(&mut self) {
        for card in &mut self.cards {
            card.set_state(CardState::Hidden);
        }
    }

    pub fn count_in_state(&self, state: CardState) -> usize {
        self.cards.iter().filter(|card| card.state() == state).count()
    }
}

impl Index<Position> for Board {
    type Output = Card;

    fn index(&self, position: Position) -> &Self::Output {
        &self.cards[usize::from(position)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::{format, vec};

    fn token(id: SpeciesId) -> Token {
        Token::new(id, format!("https://img.test/{id}.png"))
    }

    #[test]
    fn layout_must_hold_exactly_two_of_each_species() {
        let board = Board::from_layout(vec![token(1), token(2), token(1), token(2)]).unwrap();
        assert_eq!(board.len(), 4);
        assert_eq!(board.total_pairs(), 2);
        assert_eq!(board[2].species(), 1);
        assert_eq!(board[3].position(), 3);

        assert_eq!(
            Board::from_layout(vec![token(1), token(2), token(1)]),
            Err(GameError::UnpairedToken(2))
        );
        assert_eq!(
            Board::from_layout(vec![token(7), token(7), token(7), token(7)]),
            Err(GameError::UnpairedToken(7))
        );
        assert_eq!(Board::from_layout(vec![]), Err(GameError::EmptyBoard));
    }

    #[test]
    fn pair_shares_one_token() {
        let board = Board::from_layout(vec![token(5), token(5)]).unwrap();
        assert!(core::ptr::eq(board[0].token(), board[1].token()));
        assert!(board[0].matches(&board[1]));
    }

    #[test]
    fn shuffled_board_keeps_pair_invariant() {
        let mut rng = SmallRng::seed_from_u64(7);
        let tokens: Vec<_> = (1..=12).map(token).collect();

        let board = Board::shuffled(tokens, &mut rng).unwrap();

        assert_eq!(board.len(), 24);
        assert_eq!(board.total_pairs(), 12);
        for id in 1..=12 {
            let count = board.cards().iter().filter(|c| c.species() == id).count();
            assert_eq!(count, 2, "species {id}");
        }
        assert_eq!(board.count_in_state(CardState::Hidden), 24);
    }

    #[test]
    fn shuffled_board_depends_on_seed() {
        let tokens: Vec<_> = (1..=12).map(token).collect();
        let order = |seed| {
            let board = Board::shuffled(tokens.clone(), &mut SmallRng::seed_from_u64(seed)).unwrap();
            board.cards().iter().map(Card::species).collect::<Vec<_>>()
        };

        assert_eq!(order(3), order(3));
        assert_ne!(order(3), order(4));
    }

    #[test]
    fn shuffled_board_rejects_repeated_tokens() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(
            Board::shuffled(vec![token(3), token(3)], &mut rng),
            Err(GameError::DuplicateToken(3))
        );
    }

    fn saved_card(id: SpeciesId, position: Position) -> String {
        format!(
            r#"{{"token":{{"id":{id},"image_url":"https://img.test/{id}.png"}},"position":{position},"state":"Hidden"}}"#
        )
    }

    #[test]
    fn deserialized_board_must_be_paired() {
        let json = format!(
            r#"{{"cards":[{},{},{}]}}"#,
            saved_card(1, 0),
            saved_card(1, 1),
            saved_card(1, 2)
        );
        let err = serde_json::from_str::<Board>(&json).unwrap_err();
        assert!(err.to_string().contains("Species 1"), "{err}");
    }

    #[test]
    fn deserialized_board_must_keep_display_order() {
        let json = format!(
            r#"{{"cards":[{},{}]}}"#,
            saved_card(1, 0),
            saved_card(1, 7)
        );
        assert!(serde_json::from_str::<Board>(&json).is_err());
    }

    #[test]
    fn saved_board_restores_card_states() {
        let mut board = Board::from_layout(vec![token(1), token(2), token(1), token(2)]).unwrap();
        board.set_state(0, CardState::Matched);
        board.set_state(2, CardState::Matched);
        board.set_state(1, CardState::Revealed);

        let json = serde_json::to_string(&board).unwrap();
        let restored: Board = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, board);
        assert!(core::ptr::eq(restored[1].token(), restored[3].token()));
        assert_eq!(serde_json::from_str::<Board>(r#"{"cards":[]}"#).unwrap(), Board::default());
    }

    #[test]
    fn positions_outside_the_board_are_invalid() {
        let board = Board::from_layout(vec![token(1), token(1)]).unwrap();
        assert_eq!(board.validate_position(1), Ok(1));
        assert_eq!(board.validate_position(2), Err(GameError::InvalidPosition));
        assert!(board.card_at(9).is_err());
    }
}
