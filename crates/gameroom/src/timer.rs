use slap_core::Millis;
use slap_engine::GameState;
use slap_engine::WindowReason;

/// What a scheduled fire should feed the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Slap window deadline: fire `RESOLVE_SLAP_WINDOW`.
    SlapDeadline,
    /// Idle turn: fire `TURN_TIMEOUT`.
    TurnTimeout,
}

/// Generation token guarding a room's single outstanding timer. Every
/// reschedule bumps the generation; a callback whose captured generation
/// no longer matches is stale and must be dropped.
#[derive(Debug, Default)]
pub struct TimerGate {
    generation: u64,
}

impl TimerGate {
    pub fn new() -> Self {
        Self::default()
    }
    /// Invalidates any outstanding fire and returns the new generation for
    /// the next one.
    pub fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
    pub fn accepts(&self, generation: u64) -> bool {
        self.generation == generation
    }
    /// Clears timers when the room leaves IN_GAME.
    pub fn reset(&mut self) {
        self.bump();
    }
}

/// Action windows below this table size auto-expire; at or above it, only
/// the slap count can close them.
const ACTION_NO_DEADLINE_PLAYERS: usize = 5;

/// Decides the room's next one-shot fire, if any. SAME_CARD windows (and
/// large-table ACTION windows) wait for every connected player and never
/// get a deadline.
pub fn next_fire(state: &GameState, now: Millis) -> Option<(TimerKind, Millis)> {
    let window = &state.slap_window;
    if window.is_open() {
        match window.reason {
            Some(WindowReason::SameCard) => None,
            Some(WindowReason::Action) if state.players.len() >= ACTION_NO_DEADLINE_PLAYERS => {
                None
            }
            _ => Some((TimerKind::SlapDeadline, window.deadline.saturating_sub(now))),
        }
    } else {
        Some((TimerKind::TurnTimeout, state.config.turn_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::uid;
    use slap_cards::Card;
    use slap_engine::GameEvent;
    use slap_engine::apply;

    #[test]
    fn generations_invalidate_stale_fires() {
        let mut gate = TimerGate::new();
        let first = gate.bump();
        assert!(gate.accepts(first));
        let second = gate.bump();
        assert!(!gate.accepts(first));
        assert!(gate.accepts(second));
        gate.reset();
        assert!(!gate.accepts(second));
    }

    #[test]
    fn idle_turns_get_the_turn_timer() {
        let state = crate::tests::game_of(2, &[Card::Cat, Card::Goat, Card::Cheese, Card::Pizza]);
        assert_eq!(
            next_fire(&state, 0),
            Some((TimerKind::TurnTimeout, state.config.turn_timeout_ms))
        );
    }

    #[test]
    fn match_windows_get_a_deadline() {
        let state = crate::tests::game_of(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&state, &GameEvent::Flip { user_id: uid(1) }, 1000);
        assert_eq!(
            next_fire(&opened.state, 1200),
            Some((TimerKind::SlapDeadline, 1800))
        );
    }

    #[test]
    fn same_card_windows_never_expire() {
        let state = crate::tests::game_of(2, &[Card::Cat, Card::Cat, Card::Goat, Card::Cheese]);
        let first = apply(&state, &GameEvent::Flip { user_id: uid(1) }, 1000);
        let second = apply(&first.state, &GameEvent::Flip { user_id: uid(2) }, 2000);
        assert!(second.state.slap_window.is_open());
        assert_eq!(next_fire(&second.state, 2100), None);
    }

    #[test]
    fn large_table_action_windows_never_expire() {
        let deck = [
            Card::Gorilla,
            Card::Cat,
            Card::Goat,
            Card::Cheese,
            Card::Pizza,
            Card::Taco,
        ];
        let small = crate::tests::game_of(4, &deck);
        let opened = apply(&small, &GameEvent::Flip { user_id: uid(1) }, 1000);
        assert!(matches!(
            next_fire(&opened.state, 1000),
            Some((TimerKind::SlapDeadline, _))
        ));

        let large = crate::tests::game_of(5, &deck);
        let opened = apply(&large, &GameEvent::Flip { user_id: uid(1) }, 1000);
        assert_eq!(next_fire(&opened.state, 1000), None);
    }
}
