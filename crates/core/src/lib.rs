pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;
pub mod format;

pub use config::{AppConfig, ConfigError, ConfigOverrides, DialogConfig, LoadOptions, ShortfallPolicy};
pub use dialog::machine::{
    DialogAction, DialogMachine, DialogState, DialogTurn, FulfillmentState, InvocationPhase,
};
pub use dialog::validate::{validate_dining_request, ValidationResult};
pub use domain::request::{DiningRequest, RequestError, SlotField, SlotValues};
pub use domain::restaurant::{CandidateId, CandidateSet, Coordinates, RestaurantRecord};
pub use errors::{DeliveryError, LookupError};
pub use format::format_recommendations;

// Re-export so downstream crates track one chrono version.
pub use chrono;
