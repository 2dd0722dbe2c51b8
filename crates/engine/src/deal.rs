use super::GameConfig;
use super::GameState;
use super::GameStatus;
use super::Player;
use super::SlapWindow;
use super::UserId;
use slap_cards::Card;
use slap_cards::ChantRng;
use slap_cards::Seed;
use slap_cards::standard_deck;
use slap_cards::validate_deck;
use slap_cards::validate_player_count;

/// Optional knobs for initial state construction. The default shuffles the
/// standard deck with [`DEFAULT_SEED`]; the orchestrator passes a random
/// seed per match so replays stay reproducible from the journal.
#[derive(Debug, Clone)]
pub struct DealOptions {
    pub seed: Option<Seed>,
    pub deck: Option<Vec<Card>>,
    pub shuffle: bool,
}

/// Seed used when a shuffle is requested without one.
pub const DEFAULT_SEED: u32 = 0;

impl Default for DealOptions {
    fn default() -> Self {
        Self {
            seed: None,
            deck: None,
            shuffle: true,
        }
    }
}

impl GameState {
    /// Builds the opening state: validates, optionally shuffles, and deals
    /// the deck round-robin by seat. Hands need not come out equal when the
    /// deck size is not a multiple of the player count.
    pub fn deal(
        entrants: &[(UserId, String)],
        config: GameConfig,
        options: DealOptions,
    ) -> anyhow::Result<Self> {
        validate_player_count(entrants.len())?;
        let mut deck = options.deck.unwrap_or_else(standard_deck);
        validate_deck(&deck)?;
        if options.shuffle {
            let seed = options.seed.unwrap_or(Seed::Number(DEFAULT_SEED));
            ChantRng::new(&seed).shuffle(&mut deck);
        }
        let n = entrants.len();
        let mut hands: Vec<Vec<Card>> = vec![Vec::new(); n];
        for (i, card) in deck.into_iter().enumerate() {
            hands[i % n].push(card);
        }
        let players = entrants
            .iter()
            .zip(hands)
            .enumerate()
            .map(|(seat, ((user_id, display_name), hand))| Player {
                user_id: *user_id,
                display_name: display_name.clone(),
                seat_index: seat,
                connected: true,
                ready: true,
                hand,
            })
            .collect();
        Ok(Self {
            status: GameStatus::InGame,
            players,
            current_turn_seat: 0,
            chant_index: 0,
            pile: Vec::new(),
            last_revealed: None,
            slap_window: SlapWindow::idle(),
            winner_user_id: None,
            version: 1,
            next_slap_event_nonce: 1,
            config,
        })
    }
}
