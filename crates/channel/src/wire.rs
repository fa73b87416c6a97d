//! Serde view of the conversational platform's event schema. The platform
//! performs intent recognition and slot extraction; we only see the
//! structured request it posts per turn and answer with one dialog action.

use std::collections::BTreeMap;

use chowline_core::{DialogAction, FulfillmentState, InvocationPhase, SlotValues};
use serde::{Deserialize, Serialize};

pub const DIALOG_CODE_HOOK: &str = "DialogCodeHook";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<BotInfo>,
    pub user_id: String,
    pub invocation_source: String,
    #[serde(default)]
    pub session_attributes: Option<BTreeMap<String, String>>,
    pub current_intent: CurrentIntent,
}

impl PlatformEvent {
    /// Anything other than the dialog hook means the user has confirmed
    /// the intent and we are fulfilling it.
    pub fn phase(&self) -> InvocationPhase {
        if self.invocation_source == DIALOG_CODE_HOOK {
            InvocationPhase::DialogHook
        } else {
            InvocationPhase::Fulfillment
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BotInfo {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentIntent {
    pub name: String,
    #[serde(default)]
    pub slots: BTreeMap<String, Option<String>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformResponse {
    pub session_attributes: BTreeMap<String, String>,
    pub dialog_action: WireDialogAction,
}

/// The platform's tagged dialog-action schema. Closed set; the `From`
/// conversion below is the single serialization point for [`DialogAction`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireDialogAction {
    ElicitSlot {
        #[serde(rename = "intentName")]
        intent_name: String,
        slots: BTreeMap<String, Option<String>>,
        #[serde(rename = "slotToElicit")]
        slot_to_elicit: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<WireMessage>,
    },
    Delegate {
        slots: BTreeMap<String, Option<String>>,
    },
    Close {
        #[serde(rename = "fulfillmentState")]
        fulfillment_state: String,
        message: WireMessage,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub content: String,
}

impl WireMessage {
    pub fn plain(content: impl Into<String>) -> Self {
        Self { content_type: "PlainText".to_string(), content: content.into() }
    }
}

fn fulfillment_state_str(state: FulfillmentState) -> &'static str {
    match state {
        FulfillmentState::Fulfilled => "Fulfilled",
        FulfillmentState::Failed => "Failed",
    }
}

fn slots_to_wire(slots: &SlotValues) -> BTreeMap<String, Option<String>> {
    slots.to_wire()
}

/// Builds the platform response for one finished turn.
pub fn respond(
    session_attributes: BTreeMap<String, String>,
    intent_name: &str,
    action: DialogAction,
) -> PlatformResponse {
    let dialog_action = match action {
        DialogAction::ElicitSlot { field, slots, message } => WireDialogAction::ElicitSlot {
            intent_name: intent_name.to_string(),
            slots: slots_to_wire(&slots),
            slot_to_elicit: field.as_str().to_string(),
            message: message.map(WireMessage::plain),
        },
        DialogAction::Delegate { slots } => {
            WireDialogAction::Delegate { slots: slots_to_wire(&slots) }
        }
        DialogAction::Close { state, message } => WireDialogAction::Close {
            fulfillment_state: fulfillment_state_str(state).to_string(),
            message: WireMessage::plain(message),
        },
    };

    PlatformResponse { session_attributes, dialog_action }
}
