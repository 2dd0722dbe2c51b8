use serde::Deserialize;
use serde::Serialize;

/// A card face. The five normal cards form the chant cycle; the three
/// action cards open gesture windows when revealed.
///
/// Wire and persistence formats use the upper-case names (`"TACO"`,
/// `"GORILLA"`, ...), matching what clients display and vocalize.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Card {
    Taco,
    Cat,
    Goat,
    Cheese,
    Pizza,
    Gorilla,
    Narwhal,
    Groundhog,
}

impl Card {
    /// The normal cards in chant order. `chant_index` walks this cycle.
    pub const NORMAL: [Self; 5] = [Self::Taco, Self::Cat, Self::Goat, Self::Cheese, Self::Pizza];
    /// The action cards.
    pub const ACTION: [Self; 3] = [Self::Gorilla, Self::Narwhal, Self::Groundhog];
    /// Every card face.
    pub const ALL: [Self; 8] = [
        Self::Taco,
        Self::Cat,
        Self::Goat,
        Self::Cheese,
        Self::Pizza,
        Self::Gorilla,
        Self::Narwhal,
        Self::Groundhog,
    ];

    /// The chant word for a given chant index (taken modulo the cycle).
    pub const fn chant(index: usize) -> Self {
        Self::NORMAL[index % Self::NORMAL.len()]
    }
    /// True if revealing this card opens an ACTION window.
    pub const fn is_action(&self) -> bool {
        matches!(self, Self::Gorilla | Self::Narwhal | Self::Groundhog)
    }
    /// True if this card participates in the chant cycle.
    pub const fn is_normal(&self) -> bool {
        !self.is_action()
    }
    /// Upper-case wire name.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Taco => "TACO",
            Self::Cat => "CAT",
            Self::Goat => "GOAT",
            Self::Cheese => "CHEESE",
            Self::Pizza => "PIZZA",
            Self::Gorilla => "GORILLA",
            Self::Narwhal => "NARWHAL",
            Self::Groundhog => "GROUNDHOG",
        }
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TryFrom<&str> for Card {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown card: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn chant_cycles_over_normal_cards() {
        assert_eq!(Card::chant(0), Card::Taco);
        assert_eq!(Card::chant(4), Card::Pizza);
        assert_eq!(Card::chant(5), Card::Taco);
        assert_eq!(Card::chant(12), Card::Goat);
    }
    #[test]
    fn sets_are_disjoint_and_cover_all() {
        assert!(Card::NORMAL.iter().all(Card::is_normal));
        assert!(Card::ACTION.iter().all(Card::is_action));
        assert_eq!(Card::NORMAL.len() + Card::ACTION.len(), Card::ALL.len());
    }
    #[test]
    fn labels_round_trip() {
        for card in Card::ALL {
            assert_eq!(Card::try_from(card.label()).unwrap(), card);
        }
        assert!(Card::try_from("BURRITO").is_err());
    }
}
