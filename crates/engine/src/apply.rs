use super::Effect;
use super::GameError;
use super::GameEvent;
use super::GameState;
use super::GameStatus;
use super::LastRevealed;
use super::PenaltyKind;
use super::SlapAttempt;
use super::SlapResultReason;
use super::SlapWindow;
use super::UserId;
use super::WindowReason;
use slap_core::Millis;
use slap_core::REACTION_CAP_SLACK_MS;
use slap_core::Seat;

/// Result of applying one event: the successor state, the effects to fan
/// out, and an optional rejection code. Some events (false slaps) both
/// mutate and report an error; pure rejections leave the state untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub state: GameState,
    pub effects: Vec<Effect>,
    pub error: Option<GameError>,
}

impl Outcome {
    /// True if this outcome changed state in a way clients must see.
    pub fn mutated(&self, before: &GameState) -> bool {
        self.state.version != before.version
    }
}

/// The reducer. Pure and total: depends only on its arguments, never
/// mutates `state` in place, and returns a fresh value.
pub fn apply(state: &GameState, event: &GameEvent, now: Millis) -> Outcome {
    let mut next = state.clone();
    let mut effects = Vec::new();
    let error = match event {
        GameEvent::Flip { user_id } => on_flip(&mut next, &mut effects, user_id, now),
        GameEvent::Slap {
            user_id,
            event_id,
            gesture,
            client_seq,
            client_time,
            offset_ms,
            rtt_ms,
        } => on_slap(
            &mut next,
            &mut effects,
            SlapAttempt {
                user_id: *user_id,
                event_id: event_id.clone(),
                gesture: *gesture,
                client_seq: *client_seq,
                client_time: *client_time,
                offset_ms: *offset_ms,
                rtt_ms: *rtt_ms,
                received_at: now,
            },
        ),
        GameEvent::ResolveSlapWindow => on_resolve(&mut next, &mut effects),
        GameEvent::TurnTimeout => on_timeout(&mut next, &mut effects),
        GameEvent::SkipSlapWindow => on_skip(&mut next),
    };
    Outcome {
        state: next,
        effects,
        error,
    }
}

fn on_flip(
    s: &mut GameState,
    fx: &mut Vec<Effect>,
    user: &UserId,
    now: Millis,
) -> Option<GameError> {
    if s.status != GameStatus::InGame {
        return Some(GameError::NotInGame);
    }
    if s.slap_window.is_open() {
        return Some(GameError::SlapWindowActive);
    }
    normalize_turn(s);
    let Some(seat) = s.seat_of(user) else {
        return Some(GameError::InternalError);
    };
    if seat != s.current_turn_seat {
        return Some(GameError::NotYourTurn);
    }

    let previous = s.last_revealed;
    let chant_word = s.chant_word();
    let card = s.players[seat].hand.remove(0);
    s.pile.push(card);
    s.last_revealed = Some(LastRevealed { card, seat });

    // Emptying the hand wins outright; no window opens for the final card.
    if s.players[seat].hand.is_empty() {
        s.status = GameStatus::Finished;
        s.winner_user_id = Some(*user);
        s.slap_window = SlapWindow::idle();
        s.advance_chant();
        s.bump();
        fx.push(Effect::GameFinished {
            winner_user_id: *user,
        });
        return None;
    }

    let reason = if card.is_action() {
        Some(WindowReason::Action)
    } else if previous.map(|p| p.card) == Some(card) {
        Some(WindowReason::SameCard)
    } else if card == chant_word {
        Some(WindowReason::Match)
    } else {
        None
    };

    match reason {
        Some(reason) => {
            let slap_window_ms = match reason {
                WindowReason::Action => s.config.slap_window_action_ms,
                _ => s.config.slap_window_match_ms,
            };
            let event_id = s.next_event_id();
            s.slap_window = SlapWindow {
                active: true,
                resolved: false,
                event_id: event_id.clone(),
                reason: Some(reason),
                action_card: (reason == WindowReason::Action).then_some(card),
                start: now,
                deadline: now + slap_window_ms,
                slap_window_ms,
                flipper_seat: seat,
                attempts: Vec::new(),
            };
            fx.push(Effect::SlapWindowOpen {
                event_id,
                reason,
                action_card: s.slap_window.action_card,
                start: now,
                deadline: now + slap_window_ms,
                slap_window_ms,
            });
        }
        None => advance_turn(s),
    }
    s.advance_chant();
    s.bump();
    None
}

fn on_slap(s: &mut GameState, fx: &mut Vec<Effect>, attempt: SlapAttempt) -> Option<GameError> {
    if s.status != GameStatus::InGame {
        return Some(GameError::NotInGame);
    }
    let Some(seat) = s.seat_of(&attempt.user_id) else {
        return Some(GameError::InternalError);
    };
    // A slap against no window, or a stale window id, is a false slap: the
    // penalty applies and the caller gets resynced.
    if !s.slap_window.is_open() || s.slap_window.event_id != attempt.event_id {
        apply_penalty(s, fx, seat, PenaltyKind::FalseSlap);
        return Some(GameError::InvalidEventId);
    }
    if s.slap_window.has_attempt(&attempt.user_id) {
        return Some(GameError::AlreadySlapped);
    }
    let reason = s.slap_window.reason.unwrap_or(WindowReason::Match);
    if reason == WindowReason::Action && attempt.gesture != s.slap_window.action_card {
        apply_penalty(s, fx, seat, PenaltyKind::WrongGesture);
        return None;
    }

    let user = attempt.user_id;
    s.slap_window.attempts.push(attempt);

    // A hand-empty player winning the race ends the match on the spot.
    if s.slap_window.received() == 1 && s.players[seat].hand.is_empty() {
        let event_id = s.slap_window.event_id.clone();
        s.status = GameStatus::Finished;
        s.winner_user_id = Some(user);
        s.slap_window = SlapWindow::idle();
        s.bump();
        fx.push(Effect::SlapResult {
            event_id,
            ordered_user_ids: vec![user],
            loser_user_id: None,
            reason: SlapResultReason::FirstValidSlapWin,
            pile_taken: 0,
        });
        fx.push(Effect::GameFinished {
            winner_user_id: user,
        });
        return None;
    }

    let required = match reason {
        WindowReason::SameCard | WindowReason::Action => s.connected_count().max(1),
        WindowReason::Match => s.players.len(),
    };
    if s.slap_window.received() >= required {
        resolve_window(s, fx);
    } else {
        s.bump();
    }
    None
}

fn on_resolve(s: &mut GameState, fx: &mut Vec<Effect>) -> Option<GameError> {
    if s.status != GameStatus::InGame {
        return Some(GameError::NotInGame);
    }
    if !s.slap_window.is_open() {
        return Some(GameError::NoSlapWindow);
    }
    resolve_window(s, fx);
    None
}

fn on_timeout(s: &mut GameState, fx: &mut Vec<Effect>) -> Option<GameError> {
    if s.status != GameStatus::InGame {
        return Some(GameError::NotInGame);
    }
    if s.slap_window.is_open() {
        return Some(GameError::SlapWindowActive);
    }
    normalize_turn(s);
    apply_penalty(s, fx, s.current_turn_seat, PenaltyKind::TurnTimeout);
    None
}

fn on_skip(s: &mut GameState) -> Option<GameError> {
    if s.status != GameStatus::InGame {
        return Some(GameError::NotInGame);
    }
    if !s.slap_window.is_open() {
        return Some(GameError::NoSlapWindow);
    }
    // The window fizzles: no ranking, no penalty, pile stays put, and the
    // turn moves on past the flipper.
    s.current_turn_seat = s.slap_window.flipper_seat;
    s.slap_window = SlapWindow::idle();
    advance_turn(s);
    s.bump();
    None
}

/// Closes the active window: ranks the attempts, picks a loser (or a
/// winner), assigns the pile, and moves the turn.
fn resolve_window(s: &mut GameState, fx: &mut Vec<Effect>) {
    let window = std::mem::replace(&mut s.slap_window, SlapWindow::idle());
    let ordered = order_attempts(&window, s.config.min_human_reaction_ms);

    if ordered.is_empty() {
        let loser_seat = window.flipper_seat;
        let loser = s.players[loser_seat].user_id;
        let pile_taken = s.pile.len();
        fx.push(Effect::Penalty {
            user_id: loser,
            kind: PenaltyKind::NoSlaps,
            pile_taken,
        });
        fx.push(Effect::SlapResult {
            event_id: window.event_id,
            ordered_user_ids: Vec::new(),
            loser_user_id: Some(loser),
            reason: SlapResultReason::NoSlaps,
            pile_taken,
        });
        take_pile(s, loser_seat);
        s.bump();
        normalize_turn(s);
        return;
    }

    // A hand-empty player at the head of the ranking wins the match.
    let first_seat = s.seat_of(&ordered[0]).unwrap_or(window.flipper_seat);
    if s.players[first_seat].hand.is_empty() {
        let winner = ordered[0];
        s.status = GameStatus::Finished;
        s.winner_user_id = Some(winner);
        s.bump();
        fx.push(Effect::SlapResult {
            event_id: window.event_id,
            ordered_user_ids: ordered,
            loser_user_id: None,
            reason: SlapResultReason::FirstValidSlapWin,
            pile_taken: 0,
        });
        fx.push(Effect::GameFinished {
            winner_user_id: winner,
        });
        return;
    }

    let (loser, reason) = match window.reason {
        Some(WindowReason::SameCard) => {
            (*ordered.last().unwrap(), SlapResultReason::LastSlapper)
        }
        _ => {
            let non_slappers: Vec<&super::Player> = s
                .players
                .iter()
                .filter(|p| !window.has_attempt(&p.user_id))
                .collect();
            match non_slappers.last() {
                Some(p) => (p.user_id, SlapResultReason::NonSlapper),
                None => (*ordered.last().unwrap(), SlapResultReason::LastSlapper),
            }
        }
    };
    let loser_seat = s.seat_of(&loser).unwrap_or(window.flipper_seat);
    let pile_taken = s.pile.len();
    fx.push(Effect::SlapResult {
        event_id: window.event_id,
        ordered_user_ids: ordered,
        loser_user_id: Some(loser),
        reason,
        pile_taken,
    });
    take_pile(s, loser_seat);
    s.bump();
    normalize_turn(s);
}

/// Ranks attempts for resolution. SAME_CARD races on raw server receipt;
/// everything else races on the estimated reaction time, with receipt,
/// client sequence, and user id as tie-breaks.
fn order_attempts(window: &SlapWindow, min_human_ms: u64) -> Vec<UserId> {
    let mut attempts = window.attempts.clone();
    match window.reason {
        Some(WindowReason::SameCard) => attempts.sort_by_key(|a| {
            (a.received_at, a.client_seq, a.user_id)
        }),
        _ => attempts.sort_by_key(|a| {
            (
                reaction_ms(a, window, min_human_ms),
                a.received_at,
                a.client_seq,
                a.user_id,
            )
        }),
    }
    attempts.into_iter().map(|a| a.user_id).collect()
}

/// Estimated reaction: `(clientTime + offsetMs) − startServerTime`, with
/// negatives floored to zero, then raised to the human floor, then capped
/// at the window length plus slack.
pub fn reaction_ms(attempt: &SlapAttempt, window: &SlapWindow, min_human_ms: u64) -> u64 {
    let raw = attempt.client_time as i64 + attempt.offset_ms - window.start as i64;
    let floored = raw.max(0) as u64;
    floored
        .max(min_human_ms)
        .min(window.slap_window_ms + REACTION_CAP_SLACK_MS)
}

/// The penalized player takes the pile, inherits the turn, and the window
/// resets.
fn apply_penalty(s: &mut GameState, fx: &mut Vec<Effect>, seat: Seat, kind: PenaltyKind) {
    fx.push(Effect::Penalty {
        user_id: s.players[seat].user_id,
        kind,
        pile_taken: s.pile.len(),
    });
    take_pile(s, seat);
    s.slap_window = SlapWindow::idle();
    s.bump();
    normalize_turn(s);
}

/// Moves the pile onto the bottom of the seat's hand, in order, and hands
/// them the turn.
fn take_pile(s: &mut GameState, seat: Seat) {
    let pile = std::mem::take(&mut s.pile);
    s.players[seat].hand.extend(pile);
    s.current_turn_seat = seat;
}

/// Walks forward from the next seat until a nonempty hand is found.
/// Zero-card seats never hold the turn while someone can still flip.
fn advance_turn(s: &mut GameState) {
    let n = s.players.len();
    for step in 1..=n {
        let seat = (s.current_turn_seat + step) % n;
        if !s.players[seat].hand.is_empty() {
            s.current_turn_seat = seat;
            return;
        }
    }
}

/// Re-establishes the turn invariant when the current seat ran dry.
fn normalize_turn(s: &mut GameState) {
    if !s.slap_window.is_open() && s.players[s.current_turn_seat].hand.is_empty() {
        advance_turn(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DealOptions;
    use crate::GameConfig;
    use crate::tests::state_with;
    use crate::tests::uid;
    use slap_cards::Card;

    fn flip(user: UserId) -> GameEvent {
        GameEvent::Flip { user_id: user }
    }
    fn slap(user: UserId, event_id: &str, seq: u64, time: Millis) -> GameEvent {
        GameEvent::slap(user, event_id, None, seq, time, 0, 20)
    }
    fn slap_gesture(user: UserId, event_id: &str, gesture: Card, time: Millis) -> GameEvent {
        GameEvent::slap(user, event_id, Some(gesture), 1, time, 0, 20)
    }
    fn open_window(state: &GameState) -> &SlapWindow {
        assert!(state.slap_window.is_open(), "expected an open window");
        &state.slap_window
    }

    #[test]
    fn chant_increments_on_each_flip() {
        let s0 = state_with(2, &[Card::Cat, Card::Goat, Card::Cheese, Card::Pizza]);
        let s1 = apply(&s0, &flip(uid(1)), 1000);
        assert!(s1.error.is_none());
        assert_eq!(s1.state.chant_index, 1);
        assert_eq!(s1.state.current_turn_seat, 1);
        let s2 = apply(&s1.state, &flip(uid(2)), 2000);
        assert!(s2.error.is_none());
        assert_eq!(s2.state.chant_index, 2);
        assert_eq!(s2.state.current_turn_seat, 0);
    }

    #[test]
    fn match_flip_opens_a_window() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let out = apply(&s0, &flip(uid(1)), 1000);
        assert!(out.error.is_none());
        let window = open_window(&out.state);
        assert_eq!(window.reason, Some(WindowReason::Match));
        assert_eq!(window.event_id, "slap-00000001");
        assert_eq!(window.slap_window_ms, 2000);
        assert_eq!(window.start, 1000);
        assert_eq!(window.deadline, 3000);
        assert_eq!(window.flipper_seat, 0);
        assert_eq!(out.state.chant_index, 1);
        assert_eq!(out.state.current_turn_seat, 0);
        assert!(matches!(
            out.effects[0],
            Effect::SlapWindowOpen {
                reason: WindowReason::Match,
                action_card: None,
                ..
            }
        ));
    }

    #[test]
    fn action_window_wrong_gesture_is_penalized() {
        let s0 = state_with(2, &[Card::Gorilla, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let window = open_window(&opened.state);
        assert_eq!(window.reason, Some(WindowReason::Action));
        assert_eq!(window.action_card, Some(Card::Gorilla));
        assert_eq!(window.slap_window_ms, 3200);

        let out = apply(
            &opened.state,
            &slap_gesture(uid(2), "slap-00000001", Card::Narwhal, 1200),
            1200,
        );
        assert!(out.error.is_none());
        assert!(matches!(
            out.effects[0],
            Effect::Penalty {
                kind: PenaltyKind::WrongGesture,
                pile_taken: 1,
                ..
            }
        ));
        assert_eq!(out.state.current_turn_seat, 1);
        assert!(!out.state.slap_window.is_open());
        // The pile lands at the bottom of the penalized hand.
        assert_eq!(
            out.state.players[1].hand,
            vec![Card::Cat, Card::Cheese, Card::Gorilla]
        );
    }

    #[test]
    fn correct_gesture_is_accepted() {
        let s0 = state_with(2, &[Card::Gorilla, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(
            &opened.state,
            &slap_gesture(uid(2), "slap-00000001", Card::Gorilla, 1200),
            1200,
        );
        assert!(out.error.is_none());
        assert!(out.effects.is_empty());
        assert_eq!(out.state.slap_window.received(), 1);
    }

    #[test]
    fn equal_reactions_tie_break_on_receipt_order() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let one = apply(&opened.state, &slap(uid(2), "slap-00000001", 1, 1060), 1020);
        assert!(one.error.is_none());
        let two = apply(&one.state, &slap(uid(1), "slap-00000001", 1, 1060), 1030);
        assert!(two.error.is_none());
        // Both slapped: MATCH auto-resolves at the full player count.
        let result = two
            .effects
            .iter()
            .find_map(|e| match e {
                Effect::SlapResult {
                    ordered_user_ids,
                    loser_user_id,
                    reason,
                    ..
                } => Some((ordered_user_ids.clone(), *loser_user_id, *reason)),
                _ => None,
            })
            .expect("slap result");
        assert_eq!(result.0, vec![uid(2), uid(1)]);
        assert_eq!(result.1, Some(uid(1)));
        assert_eq!(result.2, SlapResultReason::LastSlapper);
        assert_eq!(two.state.current_turn_seat, 0);
        assert!(two.state.pile.is_empty());
    }

    #[test]
    fn expired_window_with_no_slaps_penalizes_the_flipper() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(&opened.state, &GameEvent::ResolveSlapWindow, 3100);
        assert!(out.error.is_none());
        assert!(matches!(
            out.effects[0],
            Effect::Penalty {
                kind: PenaltyKind::NoSlaps,
                pile_taken: 1,
                ..
            }
        ));
        assert!(matches!(
            out.effects[1],
            Effect::SlapResult {
                reason: SlapResultReason::NoSlaps,
                loser_user_id: Some(loser),
                ..
            } if loser == uid(1)
        ));
        assert_eq!(out.state.current_turn_seat, 0);
        assert!(!out.state.slap_window.is_open());
    }

    #[test]
    fn zero_card_seats_are_skipped_on_turn_advance() {
        let mut s0 = state_with(3, &[Card::Cat, Card::Goat, Card::Cheese]);
        s0.players[0].hand = vec![Card::Cat, Card::Pizza];
        s0.players[1].hand = Vec::new();
        s0.players[2].hand = vec![Card::Goat, Card::Cheese];
        let out = apply(&s0, &flip(uid(1)), 1000);
        assert!(out.error.is_none());
        assert!(!out.state.slap_window.is_open());
        assert_eq!(out.state.current_turn_seat, 2);
        assert_eq!(out.state.chant_index, 1);
    }

    #[test]
    fn terminal_flip_wins_without_opening_a_window() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat]);
        // TACO at chant 0 would open MATCH, but the hand empties first.
        let out = apply(&s0, &flip(uid(1)), 1000);
        assert!(out.error.is_none());
        assert_eq!(out.state.status, GameStatus::Finished);
        assert_eq!(out.state.winner_user_id, Some(uid(1)));
        assert!(!out.state.slap_window.is_open());
        assert_eq!(out.state.chant_index, 1);
        assert_eq!(out.effects.len(), 1);
        assert!(matches!(out.effects[0], Effect::GameFinished { .. }));
    }

    #[test]
    fn repeated_card_opens_same_card_window() {
        let s0 = state_with(2, &[Card::Cat, Card::Cat, Card::Goat, Card::Cheese]);
        let first = apply(&s0, &flip(uid(1)), 1000);
        assert!(!first.state.slap_window.is_open());
        let second = apply(&first.state, &flip(uid(2)), 2000);
        let window = open_window(&second.state);
        // Repeat beats chant match in the priority order.
        assert_eq!(window.reason, Some(WindowReason::SameCard));
    }

    #[test]
    fn same_card_resolution_blames_the_slowest_hand() {
        let s0 = state_with(2, &[Card::Cat, Card::Cat, Card::Goat, Card::Cheese]);
        let first = apply(&s0, &flip(uid(1)), 1000);
        let second = apply(&first.state, &flip(uid(2)), 2000);
        let one = apply(&second.state, &slap(uid(1), "slap-00000001", 1, 2100), 2100);
        assert!(one.error.is_none());
        assert!(one.state.slap_window.is_open());
        let two = apply(&one.state, &slap(uid(2), "slap-00000001", 1, 2050), 2200);
        // Receipt order decides SAME_CARD, not the claimed client time.
        let result = two
            .effects
            .iter()
            .find_map(|e| match e {
                Effect::SlapResult {
                    loser_user_id,
                    reason,
                    pile_taken,
                    ..
                } => Some((*loser_user_id, *reason, *pile_taken)),
                _ => None,
            })
            .expect("slap result");
        assert_eq!(result.0, Some(uid(2)));
        assert_eq!(result.1, SlapResultReason::LastSlapper);
        assert_eq!(result.2, 2);
        assert_eq!(two.state.current_turn_seat, 1);
    }

    #[test]
    fn deadline_resolution_blames_the_last_non_slapper() {
        let s0 = state_with(
            3,
            &[
                Card::Taco,
                Card::Cat,
                Card::Goat,
                Card::Cheese,
                Card::Pizza,
                Card::Gorilla,
            ],
        );
        let opened = apply(&s0, &flip(uid(1)), 1000);
        assert_eq!(open_window(&opened.state).reason, Some(WindowReason::Match));
        let one = apply(&opened.state, &slap(uid(2), "slap-00000001", 1, 1100), 1100);
        let out = apply(&one.state, &GameEvent::ResolveSlapWindow, 3100);
        let result = out
            .effects
            .iter()
            .find_map(|e| match e {
                Effect::SlapResult {
                    loser_user_id,
                    reason,
                    ..
                } => Some((*loser_user_id, *reason)),
                _ => None,
            })
            .expect("slap result");
        // Seats 0 and 2 sat out; the later seat takes the pile.
        assert_eq!(result.0, Some(uid(3)));
        assert_eq!(result.1, SlapResultReason::NonSlapper);
        assert_eq!(out.state.current_turn_seat, 2);
    }

    #[test]
    fn duplicate_slap_is_idempotent() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let one = apply(&opened.state, &slap(uid(2), "slap-00000001", 1, 1100), 1100);
        let dup = apply(&one.state, &slap(uid(2), "slap-00000001", 2, 1150), 1150);
        assert_eq!(dup.error, Some(GameError::AlreadySlapped));
        assert!(dup.effects.is_empty());
        assert_eq!(dup.state, one.state);
    }

    #[test]
    fn stale_event_id_is_a_false_slap() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(&opened.state, &slap(uid(2), "slap-deadbeef", 1, 1100), 1100);
        assert_eq!(out.error, Some(GameError::InvalidEventId));
        assert!(matches!(
            out.effects[0],
            Effect::Penalty {
                kind: PenaltyKind::FalseSlap,
                ..
            }
        ));
        assert_eq!(out.state.current_turn_seat, 1);
        assert!(!out.state.slap_window.is_open());
    }

    #[test]
    fn slap_with_no_window_is_a_false_slap() {
        let s0 = state_with(2, &[Card::Cat, Card::Goat, Card::Cheese, Card::Pizza]);
        let out = apply(&s0, &slap(uid(2), "slap-00000001", 1, 900), 900);
        assert_eq!(out.error, Some(GameError::InvalidEventId));
        assert!(matches!(
            out.effects[0],
            Effect::Penalty {
                kind: PenaltyKind::FalseSlap,
                pile_taken: 0,
                ..
            }
        ));
    }

    #[test]
    fn zero_card_slapper_wins_on_first_valid_slap() {
        let mut s0 = state_with(2, &[Card::Gorilla, Card::Cat, Card::Goat, Card::Cheese]);
        s0.players[1].hand = Vec::new();
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(
            &opened.state,
            &slap_gesture(uid(2), "slap-00000001", Card::Gorilla, 1200),
            1200,
        );
        assert!(out.error.is_none());
        assert_eq!(out.state.status, GameStatus::Finished);
        assert_eq!(out.state.winner_user_id, Some(uid(2)));
        assert!(matches!(
            out.effects[0],
            Effect::SlapResult {
                reason: SlapResultReason::FirstValidSlapWin,
                loser_user_id: None,
                ..
            }
        ));
        assert!(matches!(out.effects[1], Effect::GameFinished { .. }));
    }

    #[test]
    fn zero_card_player_heading_the_ranking_wins_at_resolution() {
        let mut s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        s0.players[1].hand = Vec::new();
        let opened = apply(&s0, &flip(uid(1)), 1000);
        // Flipper slaps first but slow; the empty-handed player outranks on
        // estimated reaction and wins when the window closes.
        let one = apply(&opened.state, &slap(uid(1), "slap-00000001", 1, 2500), 2500);
        assert!(one.error.is_none());
        let two = apply(&one.state, &slap(uid(2), "slap-00000001", 1, 1100), 2600);
        assert_eq!(two.state.status, GameStatus::Finished);
        assert_eq!(two.state.winner_user_id, Some(uid(2)));
    }

    #[test]
    fn turn_timeout_penalizes_the_idler() {
        let s0 = state_with(2, &[Card::Cat, Card::Goat, Card::Cheese, Card::Pizza]);
        let flipped = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(&flipped.state, &GameEvent::TurnTimeout, 7000);
        assert!(out.error.is_none());
        assert!(matches!(
            out.effects[0],
            Effect::Penalty {
                kind: PenaltyKind::TurnTimeout,
                pile_taken: 1,
                ..
            }
        ));
        // The penalized seat keeps the turn with the pile in hand.
        assert_eq!(out.state.current_turn_seat, 1);
        assert!(out.state.pile.is_empty());
    }

    #[test]
    fn timeout_during_a_window_is_rejected() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(&opened.state, &GameEvent::TurnTimeout, 7000);
        assert_eq!(out.error, Some(GameError::SlapWindowActive));
        assert_eq!(out.state, opened.state);
    }

    #[test]
    fn resolve_without_a_window_is_rejected() {
        let s0 = state_with(2, &[Card::Cat, Card::Goat, Card::Cheese, Card::Pizza]);
        let out = apply(&s0, &GameEvent::ResolveSlapWindow, 1000);
        assert_eq!(out.error, Some(GameError::NoSlapWindow));
        assert_eq!(out.state, s0);
    }

    #[test]
    fn out_of_turn_flip_is_rejected() {
        let s0 = state_with(2, &[Card::Cat, Card::Goat, Card::Cheese, Card::Pizza]);
        let out = apply(&s0, &flip(uid(2)), 1000);
        assert_eq!(out.error, Some(GameError::NotYourTurn));
        assert_eq!(out.state, s0);
    }

    #[test]
    fn flip_during_a_window_is_rejected() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(&opened.state, &flip(uid(1)), 1100);
        assert_eq!(out.error, Some(GameError::SlapWindowActive));
    }

    #[test]
    fn skip_discards_the_window_without_blame() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(&opened.state, &GameEvent::SkipSlapWindow, 1500);
        assert!(out.error.is_none());
        assert!(out.effects.is_empty());
        assert!(!out.state.slap_window.is_open());
        assert_eq!(out.state.current_turn_seat, 1);
        assert_eq!(out.state.pile, vec![Card::Taco]);
        assert!(out.state.version > opened.state.version);
    }

    #[test]
    fn match_threshold_counts_every_seat() {
        let mut s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        s0.players[1].connected = false;
        let opened = apply(&s0, &flip(uid(1)), 1000);
        let out = apply(&opened.state, &slap(uid(1), "slap-00000001", 1, 1100), 1100);
        assert!(out.error.is_none());
        // One of two seats slapped; MATCH waits for all players.
        assert!(out.state.slap_window.is_open());
    }

    #[test]
    fn same_card_threshold_counts_connected_players_only() {
        let mut s0 = state_with(2, &[Card::Cat, Card::Cat, Card::Goat, Card::Cheese]);
        s0.players[1].connected = false;
        let first = apply(&s0, &flip(uid(1)), 1000);
        let second = apply(&first.state, &flip(uid(2)), 2000);
        assert!(open_window(&second.state).reason == Some(WindowReason::SameCard));
        let out = apply(&second.state, &slap(uid(1), "slap-00000001", 1, 2100), 2100);
        assert!(out.error.is_none());
        assert!(!out.state.slap_window.is_open());
    }

    #[test]
    fn reaction_estimates_clamp_both_ways() {
        let window = SlapWindow {
            active: true,
            resolved: false,
            event_id: "slap-00000001".into(),
            reason: Some(WindowReason::Match),
            action_card: None,
            start: 10_000,
            deadline: 12_000,
            slap_window_ms: 2000,
            flipper_seat: 0,
            attempts: Vec::new(),
        };
        let attempt = |client_time: Millis, offset_ms: i64| SlapAttempt {
            user_id: uid(1),
            event_id: "slap-00000001".into(),
            gesture: None,
            client_seq: 1,
            client_time,
            offset_ms,
            rtt_ms: 20,
            received_at: 0,
        };
        // A claimed pre-window reaction floors to the human minimum.
        assert_eq!(reaction_ms(&attempt(9000, 0), &window, 60), 60);
        // Sub-floor reactions get the same treatment.
        assert_eq!(reaction_ms(&attempt(10_010, 0), &window, 60), 60);
        // Honest reactions pass through.
        assert_eq!(reaction_ms(&attempt(10_250, 0), &window, 60), 250);
        // Offsets shift the estimate.
        assert_eq!(reaction_ms(&attempt(10_250, 100), &window, 60), 350);
        // Nothing exceeds window length plus slack.
        assert_eq!(reaction_ms(&attempt(99_000, 0), &window, 60), 4000);
    }

    #[test]
    fn apply_is_deterministic_and_clone_safe() {
        let s0 = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let snapshot = s0.clone();
        let a = apply(&s0, &flip(uid(1)), 1000);
        let b = apply(&s0, &flip(uid(1)), 1000);
        assert_eq!(a, b);
        assert_eq!(s0, snapshot);
    }

    #[test]
    fn event_ids_are_stable_across_replays() {
        let deck = [
            Card::Taco,
            Card::Cat,
            Card::Goat,
            Card::Taco,
            Card::Cheese,
            Card::Pizza,
        ];
        let run = || {
            let mut state = state_with(2, &deck);
            let mut ids = Vec::new();
            for (event, now) in [
                (flip(uid(1)), 1000),
                (GameEvent::SkipSlapWindow, 1200),
                (flip(uid(2)), 2000),
                (GameEvent::SkipSlapWindow, 2200),
            ] {
                let out = apply(&state, &event, now);
                assert!(out.error.is_none());
                for effect in &out.effects {
                    if let Effect::SlapWindowOpen { event_id, .. } = effect {
                        ids.push(event_id.clone());
                    }
                }
                state = out.state;
            }
            ids
        };
        let first = run();
        assert_eq!(first, run());
        assert_eq!(first, vec!["slap-00000001", "slap-00000002"]);
    }

    #[test]
    fn versions_strictly_increase_across_mutations() {
        let mut state = state_with(2, &[Card::Taco, Card::Cat, Card::Goat, Card::Cheese]);
        let mut version = state.version;
        for (event, now) in [
            (flip(uid(1)), 1000),
            (slap(uid(2), "slap-00000001", 1, 1100), 1100),
            (slap(uid(1), "slap-00000001", 1, 1150), 1150),
            (flip(uid(1)), 5000),
        ] {
            let out = apply(&state, &event, now);
            assert!(out.error.is_none(), "unexpected {:?}", out.error);
            assert!(out.state.version > version);
            version = out.state.version;
            state = out.state;
        }
    }

    #[test]
    fn pile_size_balances_flips_against_takes() {
        let deck = [
            Card::Cat,
            Card::Goat,
            Card::Cheese,
            Card::Pizza,
            Card::Cat,
            Card::Goat,
        ];
        let mut state = state_with(2, &deck);
        let mut flipped = 0;
        let mut taken = 0;
        for (event, now) in [
            (flip(uid(1)), 1000),
            (flip(uid(2)), 2000),
            (GameEvent::TurnTimeout, 8000),
        ] {
            let out = apply(&state, &event, now);
            if matches!(event, GameEvent::Flip { .. }) && out.error.is_none() {
                flipped += 1;
            }
            for effect in &out.effects {
                if let Effect::Penalty { pile_taken, .. } = effect {
                    taken += pile_taken;
                }
            }
            state = out.state;
        }
        assert_eq!(state.pile.len(), flipped - taken);
    }

    #[test]
    fn finished_games_reject_everything() {
        let s0 = state_with(2, &[Card::Cat, Card::Goat]);
        let done = apply(&s0, &flip(uid(1)), 1000);
        assert_eq!(done.state.status, GameStatus::Finished);
        for event in [
            flip(uid(2)),
            slap(uid(2), "slap-00000001", 1, 1100),
            GameEvent::ResolveSlapWindow,
            GameEvent::TurnTimeout,
            GameEvent::SkipSlapWindow,
        ] {
            let out = apply(&done.state, &event, 2000);
            assert_eq!(out.error, Some(GameError::NotInGame));
        }
    }

    #[test]
    fn custom_config_overrides_window_lengths() {
        let entrantz = crate::tests::entrants(2);
        let config = GameConfig {
            slap_window_match_ms: 1500,
            slap_window_action_ms: 4000,
            ..GameConfig::default()
        };
        let state = GameState::deal(
            &entrantz,
            config,
            DealOptions {
                seed: None,
                deck: Some(vec![Card::Taco, Card::Cat, Card::Goat, Card::Cheese]),
                shuffle: false,
            },
        )
        .unwrap();
        let out = apply(&state, &flip(uid(1)), 1000);
        assert_eq!(out.state.slap_window.slap_window_ms, 1500);
        assert_eq!(out.state.slap_window.deadline, 2500);
    }
}
