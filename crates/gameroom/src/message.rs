use super::RoomView;
use serde::Serialize;
use slap_core::Millis;
use slap_core::Version;
use slap_cards::Card;
use slap_engine::Effect;
use slap_engine::GameStateView;
use slap_engine::PenaltyKind;
use slap_engine::SlapResultReason;
use slap_engine::UserId;
use slap_engine::WindowReason;

/// Events sent from server to clients over the websocket.
/// Effect-shaped events go out before the follow-up `game.state` snapshot
/// so clients always see cause, then state.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Per-recipient room snapshot.
    #[serde(rename = "room.state")]
    RoomState { room: RoomView, me_user_id: UserId },
    /// Delivered only to the kicked member.
    #[serde(rename = "room.kicked")]
    RoomKicked {
        room_code: String,
        by_user_id: UserId,
    },
    /// Per-recipient projected game snapshot.
    #[serde(rename = "game.state")]
    GameSnapshot {
        snapshot: GameStateView,
        server_time: Millis,
        version: Version,
    },
    /// Reserved for future incremental patches; nothing emits it yet.
    #[serde(rename = "game.delta")]
    GameDelta { version: Version },
    #[serde(rename = "game.slapWindowOpen")]
    SlapWindowOpen {
        event_id: String,
        reason: WindowReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        action_card: Option<Card>,
        start_server_time: Millis,
        deadline_server_time: Millis,
        slap_window_ms: u64,
    },
    #[serde(rename = "game.slapResult")]
    SlapResult {
        event_id: String,
        ordered_user_ids: Vec<UserId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        loser_user_id: Option<UserId>,
        reason: SlapResultReason,
        pile_taken: usize,
    },
    #[serde(rename = "penalty")]
    Penalty {
        user_id: UserId,
        penalty_type: PenaltyKind,
        pile_taken: usize,
    },
    #[serde(rename = "error")]
    Error {
        code: &'static str,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
    #[serde(rename = "pong")]
    Pong {
        server_time: Millis,
        client_time_echo: Millis,
    },
}

impl ServerMessage {
    pub fn room_state(room: RoomView, me: UserId) -> Self {
        Self::RoomState {
            room,
            me_user_id: me,
        }
    }
    pub fn game_state(snapshot: GameStateView, server_time: Millis) -> Self {
        let version = snapshot.version;
        Self::GameSnapshot {
            snapshot,
            server_time,
            version,
        }
    }
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
            details: None,
        }
    }
    pub fn pong(server_time: Millis, client_time_echo: Millis) -> Self {
        Self::Pong {
            server_time,
            client_time_echo,
        }
    }
    /// Wire rendering of an engine effect. `GameFinished` has no dedicated
    /// event: the trailing snapshot carries the winner.
    pub fn from_effect(effect: &Effect) -> Option<Self> {
        match effect {
            Effect::SlapWindowOpen {
                event_id,
                reason,
                action_card,
                start,
                deadline,
                slap_window_ms,
            } => Some(Self::SlapWindowOpen {
                event_id: event_id.clone(),
                reason: *reason,
                action_card: *action_card,
                start_server_time: *start,
                deadline_server_time: *deadline,
                slap_window_ms: *slap_window_ms,
            }),
            Effect::SlapResult {
                event_id,
                ordered_user_ids,
                loser_user_id,
                reason,
                pile_taken,
            } => Some(Self::SlapResult {
                event_id: event_id.clone(),
                ordered_user_ids: ordered_user_ids.clone(),
                loser_user_id: *loser_user_id,
                reason: *reason,
                pile_taken: *pile_taken,
            }),
            Effect::Penalty {
                user_id,
                kind,
                pile_taken,
            } => Some(Self::Penalty {
                user_id: *user_id,
                penalty_type: *kind,
                pile_taken: *pile_taken,
            }),
            Effect::GameFinished { .. } => None,
        }
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::uid;

    #[test]
    fn messages_tag_with_dotted_names() {
        let json: serde_json::Value =
            serde_json::from_str(&ServerMessage::pong(10, 5).to_json()).unwrap();
        assert_eq!(json["type"], "pong");
        assert_eq!(json["serverTime"], 10);
        assert_eq!(json["clientTimeEcho"], 5);

        let msg = ServerMessage::SlapWindowOpen {
            event_id: "slap-00000001".into(),
            reason: WindowReason::Action,
            action_card: Some(Card::Gorilla),
            start_server_time: 1000,
            deadline_server_time: 4200,
            slap_window_ms: 3200,
        };
        let json: serde_json::Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(json["type"], "game.slapWindowOpen");
        assert_eq!(json["actionCard"], "GORILLA");
        assert_eq!(json["slapWindowMs"], 3200);
    }

    #[test]
    fn penalty_kind_rides_beside_the_event_tag() {
        let msg = ServerMessage::Penalty {
            user_id: uid(2),
            penalty_type: PenaltyKind::WrongGesture,
            pile_taken: 3,
        };
        let json: serde_json::Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert_eq!(json["type"], "penalty");
        assert_eq!(json["penaltyType"], "WRONG_GESTURE");
        assert_eq!(json["pileTaken"], 3);
    }

    #[test]
    fn match_window_effect_omits_action_card() {
        let effect = Effect::SlapWindowOpen {
            event_id: "slap-00000002".into(),
            reason: WindowReason::Match,
            action_card: None,
            start: 0,
            deadline: 2000,
            slap_window_ms: 2000,
        };
        let msg = ServerMessage::from_effect(&effect).unwrap();
        let json: serde_json::Value = serde_json::from_str(&msg.to_json()).unwrap();
        assert!(json.get("actionCard").is_none());
    }

    #[test]
    fn finished_effect_has_no_wire_event() {
        let effect = Effect::GameFinished {
            winner_user_id: uid(1),
        };
        assert!(ServerMessage::from_effect(&effect).is_none());
    }
}
