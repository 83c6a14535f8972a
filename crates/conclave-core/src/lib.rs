//! Conclave core: meeting session orchestration.
//!
//! Pure Rust crate with no platform dependencies. Observes the lifecycle of a
//! conferencing SDK and derives UI state, foreground-service lifecycle and
//! subscription lifetime from it. Consumed by native UI shells via UniFFI
//! bindings.

pub mod coordinator;
pub mod devices;
pub mod errors;
pub mod events;
pub mod foreground;
pub mod in_meeting;
pub mod participants;
pub mod sdk;
pub mod settings;
pub mod subscriptions;
pub mod view;

#[cfg(test)]
mod testing;

pub use coordinator::{JoinRequest, SessionConfig, SessionCoordinator, SessionHandle, UserAction};
pub use errors::ConclaveError;
pub use events::{EventEmitter, Notice, SessionEvent, SessionEventListener};
pub use sdk::{MeetingState, Sdk};
pub use settings::{Settings, SettingsStore};
pub use subscriptions::{Subscription, SubscriptionGroup, SubscriptionLifetime};
pub use view::UiState;
