use super::Card;
use slap_core::MAX_PLAYERS;
use slap_core::MIN_PLAYERS;

/// Copies of each normal card in the default deck.
pub const NORMAL_COPIES: usize = 7;
/// Copies of each action card in the default deck.
pub const ACTION_COPIES: usize = 4;

/// The default 47-card deck: 7x each normal card, 4x each action card.
pub fn standard_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(NORMAL_COPIES * 5 + ACTION_COPIES * 3);
    for card in Card::NORMAL {
        deck.extend(std::iter::repeat_n(card, NORMAL_COPIES));
    }
    for card in Card::ACTION {
        deck.extend(std::iter::repeat_n(card, ACTION_COPIES));
    }
    deck
}

/// Validates a deck for dealing. Card membership is enforced by the type
/// system, so only emptiness can go wrong.
pub fn validate_deck(deck: &[Card]) -> anyhow::Result<()> {
    anyhow::ensure!(!deck.is_empty(), "deck is empty");
    Ok(())
}

/// Validates a player count against the table bounds.
pub fn validate_player_count(n: usize) -> anyhow::Result<()> {
    anyhow::ensure!(
        (MIN_PLAYERS..=MAX_PLAYERS).contains(&n),
        "player count {} outside {}..={}",
        n,
        MIN_PLAYERS,
        MAX_PLAYERS
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn standard_deck_composition() {
        let deck = standard_deck();
        assert_eq!(deck.len(), 47);
        for card in Card::NORMAL {
            assert_eq!(deck.iter().filter(|c| **c == card).count(), 7);
        }
        for card in Card::ACTION {
            assert_eq!(deck.iter().filter(|c| **c == card).count(), 4);
        }
    }
    #[test]
    fn player_count_bounds() {
        assert!(validate_player_count(1).is_err());
        assert!(validate_player_count(2).is_ok());
        assert!(validate_player_count(8).is_ok());
        assert!(validate_player_count(9).is_err());
    }
}
