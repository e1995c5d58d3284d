//! Flashcard walk over a list's word snapshots.

use crate::db::Word;

/// Outcome of [`Quiz::next`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    Advanced,
    /// The cursor was already on the last card
    Finished,
}

/// Cursor over a fixed, non-empty deck of cards
#[derive(Debug, Clone)]
pub struct Quiz {
    cards: Vec<Word>,
    index: usize,
    revealed: bool,
}

impl Quiz {
    /// Start a quiz at the first card with the answer hidden.
    /// Returns `None` for an empty deck.
    pub fn new(cards: Vec<Word>) -> Option<Self> {
        if cards.is_empty() {
            return None;
        }
        Some(Self {
            cards,
            index: 0,
            revealed: false,
        })
    }

    pub fn current(&self) -> &Word {
        &self.cards[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.cards.len()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.cards.len()
    }

    pub fn next(&mut self) -> QuizStep {
        if self.is_last() {
            return QuizStep::Finished;
        }
        self.index += 1;
        self.revealed = false;
        QuizStep::Advanced
    }

    pub fn prev(&mut self) {
        self.index = self.index.saturating_sub(1);
        self.revealed = false;
    }

    /// Flip answer visibility; returns the new state
    pub fn toggle_answer(&mut self) -> bool {
        self.revealed = !self.revealed;
        self.revealed
    }

    pub fn restart(&mut self) {
        self.index = 0;
        self.revealed = false;
    }

    pub fn cards(&self) -> impl Iterator<Item = &Word> {
        self.cards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CefrLevel;

    fn card(id: &str) -> Word {
        Word {
            id: id.to_string(),
            word: format!("word-{}", id),
            meaning: format!("meaning-{}", id),
            example: None,
            level: CefrLevel::A1,
            user: "u-1".to_string(),
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000000Z".to_string(),
        }
    }

    fn deck(n: usize) -> Quiz {
        Quiz::new((0..n).map(|i| card(&i.to_string())).collect()).unwrap()
    }

    #[test]
    fn test_empty_deck() {
        assert!(Quiz::new(Vec::new()).is_none());
    }

    #[test]
    fn test_next_next_prev() {
        let mut quiz = deck(3);
        assert_eq!(quiz.next(), QuizStep::Advanced);
        assert_eq!(quiz.next(), QuizStep::Advanced);
        quiz.toggle_answer();
        quiz.prev();

        assert_eq!(quiz.index(), 1);
        assert!(!quiz.is_revealed());
        assert_eq!(quiz.current().id, "1");
    }

    #[test]
    fn test_next_on_last_card_finishes_without_wrapping() {
        let mut quiz = deck(2);
        quiz.next();
        quiz.toggle_answer();

        assert_eq!(quiz.next(), QuizStep::Finished);
        assert_eq!(quiz.index(), 1);
        assert!(quiz.is_revealed());
    }

    #[test]
    fn test_prev_floors_at_zero() {
        let mut quiz = deck(3);
        quiz.toggle_answer();
        quiz.prev();
        assert_eq!(quiz.index(), 0);
        assert!(!quiz.is_revealed());
    }

    #[test]
    fn test_toggle_does_not_move() {
        let mut quiz = deck(3);
        assert!(quiz.toggle_answer());
        assert!(!quiz.toggle_answer());
        assert_eq!(quiz.index(), 0);
    }

    #[test]
    fn test_restart() {
        let mut quiz = deck(3);
        quiz.next();
        quiz.next();
        quiz.toggle_answer();
        quiz.restart();
        assert_eq!(quiz.index(), 0);
        assert!(!quiz.is_revealed());
        assert_eq!(
            quiz.cards().map(|w| w.id.as_str()).collect::<Vec<_>>(),
            vec!["0", "1", "2"]
        );
    }
}
