use std::fmt;
use std::sync::{Arc, RwLock};

use crate::sdk::{Participant, Permission};
use crate::view::UiState;

/// Events emitted by the core to native UI listeners.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The derived UI state changed.
    UiChanged(UiState),
    /// A transient message for the user (toast).
    Notice(Notice),
    /// Ask the platform for screen capture consent, then report back with
    /// `UserAction::ScreenCaptureResult`.
    ScreenCaptureRequested,
    /// Show the moderator's waiting-room dialog.
    WaitingRoomDialogRequested(Vec<Participant>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    MeetingInProgress,
    Reconnecting,
    Reconnected,
    ModeratorApproved,
    DeniedByModerator,
    DemotedByModerator,
    ParticipantArrived(String),
    MultipleParticipantsArrived,
    ParticipantLeft(String),
    MultipleParticipantsLeft,
    NoWaitingRoomParticipants,
    PermissionsDenied(Vec<Permission>),
    PermissionServiceNotRegistered,
    EnterComments,
    LogUploadSucceeded,
    LogUploadFailed,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeetingInProgress => f.write_str("A meeting is already in progress"),
            Self::Reconnecting => f.write_str("Reconnecting..."),
            Self::Reconnected => f.write_str("Reconnected"),
            Self::ModeratorApproved => f.write_str("Moderator has approved"),
            Self::DeniedByModerator => f.write_str("Denied by moderator"),
            Self::DemotedByModerator => f.write_str("Demoted by moderator"),
            Self::ParticipantArrived(name) => write!(f, "{name} has arrived in the waiting room"),
            Self::MultipleParticipantsArrived => {
                f.write_str("Multiple participants have arrived in the waiting room")
            }
            Self::ParticipantLeft(name) => write!(f, "{name} has left the waiting room"),
            Self::MultipleParticipantsLeft => {
                f.write_str("Multiple participants have left the waiting room")
            }
            Self::NoWaitingRoomParticipants => {
                f.write_str("There are no participants in waiting room")
            }
            Self::PermissionsDenied(permissions) => {
                let names: Vec<String> = permissions.iter().map(ToString::to_string).collect();
                write!(f, "User didn't grant {} even after asking.", names.join(", "))
            }
            Self::PermissionServiceNotRegistered => f.write_str("Permission Service not registered."),
            Self::EnterComments => f.write_str("Please enter your comments."),
            Self::LogUploadSucceeded => f.write_str("Logs uploaded successfully"),
            Self::LogUploadFailed => f.write_str("Failed to upload logs"),
        }
    }
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait SessionEventListener: Send + Sync {
    fn on_event(&self, event: SessionEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone, Default)]
pub struct EventEmitter {
    listeners: Arc<RwLock<Vec<Arc<dyn SessionEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionEventListener>) {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(listener);
    }

    pub fn emit(&self, event: SessionEvent) {
        let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            listener.on_event(event.clone());
        }
    }
}
