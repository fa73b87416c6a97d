use chrono::{FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DialogConfig;
use crate::dialog::validate::validate_dining_request;
use crate::domain::request::{DiningRequest, RequestError, SlotField, SlotValues};

/// Session-attribute key the dialog state round-trips through. The platform
/// hands the bag back on every turn, so no state lives in process memory.
pub const SESSION_STATE_KEY: &str = "dialog_state";

pub const GREETING_MESSAGE: &str = "Hi there, how can I help?";
pub const THANK_YOU_MESSAGE: &str = "You're welcome.";
pub const CONFIRMATION_MESSAGE: &str =
    "You're all set. Expect my suggestions shortly! Have a good day.";

/// Where a dialog session stands. Persisted to the session-attribute bag
/// between turns; `Closed` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Initial,
    Eliciting,
    Delegating,
    Fulfilling,
    Closed,
}

impl DialogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Eliciting => "eliciting",
            Self::Delegating => "delegating",
            Self::Fulfilling => "fulfilling",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "initial" => Some(Self::Initial),
            "eliciting" => Some(Self::Eliciting),
            "delegating" => Some(Self::Delegating),
            "fulfilling" => Some(Self::Fulfilling),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Which hook of the platform invoked us: `DialogHook` turns run before the
/// user confirms the intent, `Fulfillment` turns after.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationPhase {
    DialogHook,
    Fulfillment,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FulfillmentState {
    Fulfilled,
    Failed,
}

/// The single action a dialog turn produces, serialized exhaustively at the
/// platform boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogAction {
    /// Re-ask the user for exactly one slot. `message` of `None` means
    /// "use the platform's own built-in prompt for this slot".
    ElicitSlot { field: SlotField, slots: SlotValues, message: Option<String> },
    /// Defer further slot-filling to the platform's own model.
    Delegate { slots: SlotValues },
    /// End the session with a final message.
    Close { state: FulfillmentState, message: String },
}

/// Outcome of advancing the machine one turn. `request` is populated only on
/// the transition into `Closed` from the fulfillment branch; the caller must
/// enqueue it exactly once before responding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogTurn {
    pub from: DialogState,
    pub action: DialogAction,
    pub next_state: DialogState,
    pub request: Option<DiningRequest>,
}

pub struct DialogMachine<'a> {
    config: &'a DialogConfig,
}

impl<'a> DialogMachine<'a> {
    pub fn new(config: &'a DialogConfig) -> Self {
        Self { config }
    }

    /// Advances the dining-suggestions dialog by one invocation.
    ///
    /// Pre-confirmation (`DialogHook`) turns validate the slots collected so
    /// far: the first violation clears that slot and elicits it again; a
    /// clean pass delegates back to the platform's completion check. A
    /// fulfillment turn promotes the slots into a [`DiningRequest`] and
    /// closes the session.
    pub fn advance(
        &self,
        current: DialogState,
        phase: InvocationPhase,
        slots: SlotValues,
        today: NaiveDate,
    ) -> Result<DialogTurn, RequestError> {
        // A closed session the platform re-enters starts over.
        let from = match current {
            DialogState::Closed => DialogState::Initial,
            other => other,
        };

        match phase {
            InvocationPhase::DialogHook => {
                let result = validate_dining_request(&slots, today, self.config);
                match result.violated_field {
                    Some(field) if !result.valid => {
                        let mut remaining = slots;
                        remaining.clear(field);
                        Ok(DialogTurn {
                            from,
                            action: DialogAction::ElicitSlot {
                                field,
                                slots: remaining,
                                message: result.message,
                            },
                            next_state: DialogState::Eliciting,
                            request: None,
                        })
                    }
                    _ => Ok(DialogTurn {
                        from,
                        action: DialogAction::Delegate { slots },
                        next_state: DialogState::Delegating,
                        request: None,
                    }),
                }
            }
            InvocationPhase::Fulfillment => {
                let request = slots.complete()?;
                Ok(DialogTurn {
                    from: DialogState::Fulfilling,
                    action: DialogAction::Close {
                        state: FulfillmentState::Fulfilled,
                        message: CONFIRMATION_MESSAGE.to_string(),
                    },
                    next_state: DialogState::Closed,
                    request: Some(request),
                })
            }
        }
    }
}

/// "Today" in the configured service timezone, given as a fixed UTC offset
/// in whole hours.
pub fn local_today(utc_offset_hours: i32) -> NaiveDate {
    match FixedOffset::east_opt(utc_offset_hours * 3600) {
        Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
        None => Utc::now().date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        DialogAction, DialogMachine, DialogState, DialogTurn, FulfillmentState, InvocationPhase,
    };
    use crate::config::DialogConfig;
    use crate::domain::request::{RequestError, SlotField, SlotValues};

    fn config() -> DialogConfig {
        DialogConfig {
            cuisines: vec!["italian".to_string(), "thai".to_string()],
            location: "boston".to_string(),
            utc_offset_hours: -5,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).expect("date")
    }

    fn filled() -> SlotValues {
        SlotValues {
            cuisine: Some("italian".to_string()),
            location: Some("boston".to_string()),
            party_size: Some("2".to_string()),
            dining_date: Some("2026-09-04".to_string()),
            dining_time: Some("13:00".to_string()),
            contact_handle: Some("+15550001111".to_string()),
        }
    }

    #[test]
    fn dialog_turn_with_violation_elicits_and_clears_the_slot() {
        let config = config();
        let machine = DialogMachine::new(&config);
        let mut slots = filled();
        slots.cuisine = Some("klingon".to_string());

        let turn = machine
            .advance(DialogState::Initial, InvocationPhase::DialogHook, slots, today())
            .expect("turn");

        assert_eq!(turn.from, DialogState::Initial);
        assert_eq!(turn.next_state, DialogState::Eliciting);
        assert!(turn.request.is_none());
        match turn.action {
            DialogAction::ElicitSlot { field, slots, message } => {
                assert_eq!(field, SlotField::Cuisine);
                assert_eq!(slots.cuisine, None, "violated slot must be cleared");
                assert_eq!(slots.location.as_deref(), Some("boston"));
                assert!(message.expect("message").contains("klingon"));
            }
            other => panic!("expected ElicitSlot, got {other:?}"),
        }
    }

    #[test]
    fn clean_dialog_turn_delegates_with_slots_unchanged() {
        let config = config();
        let machine = DialogMachine::new(&config);

        let turn = machine
            .advance(DialogState::Eliciting, InvocationPhase::DialogHook, filled(), today())
            .expect("turn");

        assert_eq!(turn.next_state, DialogState::Delegating);
        assert!(turn.request.is_none());
        assert_eq!(turn.action, DialogAction::Delegate { slots: filled() });
    }

    #[test]
    fn partially_filled_dialog_turn_still_delegates() {
        let config = config();
        let machine = DialogMachine::new(&config);
        let slots = SlotValues { cuisine: Some("thai".to_string()), ..SlotValues::default() };

        let turn = machine
            .advance(DialogState::Initial, InvocationPhase::DialogHook, slots, today())
            .expect("turn");

        assert_eq!(turn.next_state, DialogState::Delegating);
    }

    #[test]
    fn fulfillment_turn_closes_and_carries_the_request_exactly_once() {
        let config = config();
        let machine = DialogMachine::new(&config);

        let turn: DialogTurn = machine
            .advance(DialogState::Delegating, InvocationPhase::Fulfillment, filled(), today())
            .expect("turn");

        assert_eq!(turn.from, DialogState::Fulfilling);
        assert_eq!(turn.next_state, DialogState::Closed);
        let request = turn.request.expect("request to enqueue");
        assert_eq!(request.cuisine, "italian");
        assert_eq!(request.party_size, 2);
        match turn.action {
            DialogAction::Close { state, message } => {
                assert_eq!(state, FulfillmentState::Fulfilled);
                assert!(message.contains("all set"));
            }
            other => panic!("expected Close, got {other:?}"),
        }
    }

    #[test]
    fn fulfillment_turn_with_missing_slot_fails_instead_of_enqueueing() {
        let config = config();
        let machine = DialogMachine::new(&config);
        let mut slots = filled();
        slots.clear(SlotField::DiningTime);

        let error = machine
            .advance(DialogState::Delegating, InvocationPhase::Fulfillment, slots, today())
            .expect_err("incomplete request must not close");

        assert_eq!(error, RequestError::MissingSlot { field: SlotField::DiningTime });
    }

    #[test]
    fn dialog_state_round_trips_through_its_string_form() {
        for state in [
            DialogState::Initial,
            DialogState::Eliciting,
            DialogState::Delegating,
            DialogState::Fulfilling,
            DialogState::Closed,
        ] {
            assert_eq!(DialogState::parse(state.as_str()), Some(state));
        }
        assert_eq!(DialogState::parse("spelunking"), None);
    }
}
