use std::collections::BTreeMap;
use std::sync::Arc;

use chowline_core::dialog::machine::{
    local_today, DialogMachine, DialogState, FulfillmentState, GREETING_MESSAGE,
    SESSION_STATE_KEY, THANK_YOU_MESSAGE,
};
use chowline_core::{DialogAction, DialogConfig, RequestError, SlotValues};
use chowline_db::{HandoffQueue, QueueError};
use thiserror::Error;
use tracing::{debug, info};

use crate::wire::{respond, PlatformEvent, PlatformResponse};

pub const INTENT_GREETING: &str = "greeting";
pub const INTENT_THANK_YOU: &str = "thank-you";
pub const INTENT_DINING_SUGGESTIONS: &str = "dining-suggestions";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("intent `{0}` is not supported")]
    UnknownIntent(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("dining request could not be assembled: {0}")]
    Request(#[from] RequestError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Routes one platform event to its intent handler and serializes the
/// resulting dialog action back to the platform schema.
pub struct IntentDispatcher {
    dialog: DialogConfig,
    queue: Arc<dyn HandoffQueue>,
}

impl IntentDispatcher {
    pub fn new(dialog: DialogConfig, queue: Arc<dyn HandoffQueue>) -> Self {
        Self { dialog, queue }
    }

    pub async fn dispatch(&self, event: PlatformEvent) -> Result<PlatformResponse, ChannelError> {
        debug!(
            user_id = %event.user_id,
            intent_name = %event.current_intent.name,
            invocation_source = %event.invocation_source,
            "dispatching platform event"
        );

        match event.current_intent.name.as_str() {
            INTENT_GREETING => Ok(canned_close(event, GREETING_MESSAGE)),
            INTENT_THANK_YOU => Ok(canned_close(event, THANK_YOU_MESSAGE)),
            INTENT_DINING_SUGGESTIONS => self.dining_suggestions(event).await,
            unknown => Err(DispatchError::UnknownIntent(unknown.to_string()).into()),
        }
    }

    async fn dining_suggestions(
        &self,
        event: PlatformEvent,
    ) -> Result<PlatformResponse, ChannelError> {
        let mut session = event.session_attributes.clone().unwrap_or_default();
        let state = session
            .get(SESSION_STATE_KEY)
            .and_then(|raw| DialogState::parse(raw))
            .unwrap_or_default();
        let slots = SlotValues::from_wire(&event.current_intent.slots);
        let today = local_today(self.dialog.utc_offset_hours);

        let machine = DialogMachine::new(&self.dialog);
        let turn = machine.advance(state, event.phase(), slots, today)?;

        // The sole enqueue point: only the turn that closes the dialog from
        // the fulfillment branch carries a request.
        if let Some(request) = &turn.request {
            let message_id = self.queue.enqueue(request).await?;
            info!(
                user_id = %event.user_id,
                message_id = %message_id,
                cuisine = %request.cuisine,
                "dining request enqueued for the recommendation worker"
            );
        }

        session.insert(SESSION_STATE_KEY.to_string(), turn.next_state.as_str().to_string());
        Ok(respond(session, &event.current_intent.name, turn.action))
    }
}

/// Greeting and thank-you intents close immediately with a canned message,
/// bypassing the slot-filling machine entirely.
fn canned_close(event: PlatformEvent, message: &str) -> PlatformResponse {
    let session = event.session_attributes.unwrap_or_else(BTreeMap::new);
    respond(
        session,
        &event.current_intent.name,
        DialogAction::Close { state: FulfillmentState::Fulfilled, message: message.to_string() },
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use chowline_core::dialog::machine::SESSION_STATE_KEY;
    use chowline_core::DialogConfig;
    use chowline_db::{connect_with_settings, migrations, DbPool, SqliteHandoffQueue};

    use super::{ChannelError, DispatchError, IntentDispatcher};
    use crate::wire::{CurrentIntent, PlatformEvent, WireDialogAction};

    async fn setup() -> (DbPool, IntentDispatcher, Arc<SqliteHandoffQueue>) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        let queue = Arc::new(SqliteHandoffQueue::new(pool.clone()));
        let dialog = DialogConfig {
            cuisines: vec!["italian".to_string(), "thai".to_string()],
            location: "boston".to_string(),
            utc_offset_hours: 0,
        };
        (pool.clone(), IntentDispatcher::new(dialog, queue.clone()), queue)
    }

    fn event(intent: &str, source: &str, slots: &[(&str, &str)]) -> PlatformEvent {
        PlatformEvent {
            bot: None,
            user_id: "user-7".to_string(),
            invocation_source: source.to_string(),
            session_attributes: Some(BTreeMap::new()),
            current_intent: CurrentIntent {
                name: intent.to_string(),
                slots: slots
                    .iter()
                    .map(|(name, value)| (name.to_string(), Some(value.to_string())))
                    .collect(),
            },
        }
    }

    fn full_slots() -> Vec<(&'static str, &'static str)> {
        vec![
            ("cuisine", "italian"),
            ("location", "boston"),
            ("party_size", "2"),
            ("dining_date", "2099-01-01"),
            ("dining_time", "12:00"),
            ("contact_handle", "+15550001111"),
        ]
    }

    #[tokio::test]
    async fn dialog_phase_turns_never_enqueue() {
        let (pool, dispatcher, queue) = setup().await;

        let response = dispatcher
            .dispatch(event("dining-suggestions", "DialogCodeHook", &full_slots()))
            .await
            .expect("dispatch");

        assert!(matches!(response.dialog_action, WireDialogAction::Delegate { .. }));
        assert!(queue.is_empty().await.expect("count"), "dialog turn must not enqueue");
        assert_eq!(
            response.session_attributes.get(SESSION_STATE_KEY).map(String::as_str),
            Some("delegating")
        );

        pool.close().await;
    }

    #[tokio::test]
    async fn violation_elicits_the_offending_slot() {
        let (pool, dispatcher, queue) = setup().await;
        let mut slots = full_slots();
        slots[0] = ("cuisine", "klingon");

        let response = dispatcher
            .dispatch(event("dining-suggestions", "DialogCodeHook", &slots))
            .await
            .expect("dispatch");

        match response.dialog_action {
            WireDialogAction::ElicitSlot { slot_to_elicit, slots, message, .. } => {
                assert_eq!(slot_to_elicit, "cuisine");
                assert_eq!(slots.get("cuisine"), Some(&None), "violated slot is cleared");
                assert!(message.expect("message").content.contains("klingon"));
            }
            other => panic!("expected ElicitSlot, got {other:?}"),
        }
        assert!(queue.is_empty().await.expect("count"));

        pool.close().await;
    }

    #[tokio::test]
    async fn fulfillment_turn_enqueues_exactly_one_request_and_closes() {
        let (pool, dispatcher, queue) = setup().await;

        let response = dispatcher
            .dispatch(event("dining-suggestions", "FulfillmentCodeHook", &full_slots()))
            .await
            .expect("dispatch");

        match response.dialog_action {
            WireDialogAction::Close { fulfillment_state, message } => {
                assert_eq!(fulfillment_state, "Fulfilled");
                assert!(message.content.contains("all set"));
            }
            other => panic!("expected Close, got {other:?}"),
        }
        assert_eq!(queue.len().await.expect("count"), 1);
        assert_eq!(
            response.session_attributes.get(SESSION_STATE_KEY).map(String::as_str),
            Some("closed")
        );

        pool.close().await;
    }

    #[tokio::test]
    async fn greeting_and_thank_you_close_without_touching_the_queue() {
        let (pool, dispatcher, queue) = setup().await;

        for intent in ["greeting", "thank-you"] {
            let response = dispatcher
                .dispatch(event(intent, "FulfillmentCodeHook", &[]))
                .await
                .expect("dispatch");
            assert!(matches!(response.dialog_action, WireDialogAction::Close { .. }), "{intent}");
        }
        assert!(queue.is_empty().await.expect("count"));

        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_intent_is_a_fatal_dispatch_error() {
        let (pool, dispatcher, _queue) = setup().await;

        let error = dispatcher
            .dispatch(event("order-pizza", "DialogCodeHook", &[]))
            .await
            .expect_err("unknown intent must fail");

        assert!(matches!(
            error,
            ChannelError::Dispatch(DispatchError::UnknownIntent(ref name)) if name == "order-pizza"
        ));

        pool.close().await;
    }

    #[tokio::test]
    async fn session_state_round_trips_between_turns() {
        let (pool, dispatcher, _queue) = setup().await;
        let mut slots = full_slots();
        slots[4] = ("dining_time", "23:00");

        let first = dispatcher
            .dispatch(event("dining-suggestions", "DialogCodeHook", &slots))
            .await
            .expect("dispatch");
        assert_eq!(
            first.session_attributes.get(SESSION_STATE_KEY).map(String::as_str),
            Some("eliciting")
        );

        // Next turn carries the returned attributes back in.
        let mut next = event("dining-suggestions", "DialogCodeHook", &full_slots());
        next.session_attributes = Some(first.session_attributes.clone());

        let second = dispatcher.dispatch(next).await.expect("dispatch");
        assert_eq!(
            second.session_attributes.get(SESSION_STATE_KEY).map(String::as_str),
            Some("delegating")
        );

        pool.close().await;
    }
}
