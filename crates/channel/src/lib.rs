//! Platform boundary for the dining concierge: the serde view of the
//! conversational platform's event schema (`wire`) and the intent router
//! that drives the dialog state machine and the handoff queue (`dispatch`).

pub mod dispatch;
pub mod wire;

pub use dispatch::{ChannelError, DispatchError, IntentDispatcher};
pub use wire::{PlatformEvent, PlatformResponse, WireDialogAction, WireMessage};
