//! Collaborator interfaces of the conferencing SDK.
//!
//! The coordinator never talks to a concrete SDK. Every service it consumes is
//! a trait object bundled in [`Sdk`] and passed in at construction. Streams
//! yield `Result` items so a failing stream can report an error and keep
//! going.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::BoxFuture;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;

use crate::errors::ConclaveError;

/// A continuous stream of values produced by the SDK.
pub type EventStream<T> = BoxStream<'static, Result<T, ConclaveError>>;

/// A one-shot asynchronous SDK call.
pub type SdkFuture<T> = BoxFuture<'static, Result<T, ConclaveError>>;

/// Lifecycle phase of the meeting, driven by the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeetingState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    WaitingRoom,
}

impl MeetingState {
    /// States in which in-meeting SDK calls (mute, layout) are accepted.
    pub fn accepts_meeting_calls(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Reconnecting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoState {
    Active,
    SingleParticipant,
    NoOneHasVideo,
    NeedsModerator,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentShareState {
    #[default]
    Stopped,
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentShareAvailability {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentShareEvent {
    Started,
    Stopped,
    Interrupted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedCaptioningState {
    Started,
    Stopped,
}

/// Admission events for the local participant while in the waiting room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitingRoomEvent {
    Admitted,
    Denied,
    Demoted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

/// Waiting-room roster changes, seen by moderators only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitingRoomParticipantEvent {
    Added(Vec<Participant>),
    Removed(Vec<Participant>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoLayout {
    Speaker,
    People,
    Gallery,
}

impl VideoLayout {
    /// Menu order.
    pub const ALL: [VideoLayout; 3] = [Self::People, Self::Speaker, Self::Gallery];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Speaker => "Speaker View",
            Self::People => "People View",
            Self::Gallery => "Gallery View",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    RecordAudio,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Camera => f.write_str("Camera"),
            Self::RecordAudio => f.write_str("RecordAudio"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    NotGranted,
    NotRegistered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinParams {
    pub meeting_id: String,
    pub passcode: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinResult {
    Success,
    Rejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogUploadResult {
    Success,
    Failed,
}

pub trait MeetingService: Send + Sync {
    /// Current lifecycle state, readable synchronously.
    fn meeting_state(&self) -> MeetingState;
    /// Lifecycle stream. Emits the current state on subscription.
    fn meeting_state_stream(&self) -> EventStream<MeetingState>;
    /// Whether the local participant moderates the current meeting.
    fn is_moderator(&self) -> bool;
    /// Title of the meeting being joined, once the SDK knows it.
    fn meeting_title(&self) -> Option<String>;
    fn join_meeting(&self, params: JoinParams) -> SdkFuture<JoinResult>;
    fn end_meeting(&self);
    fn set_audio_muted(&self, muted: bool);
    fn set_video_muted(&self, muted: bool);
    fn set_video_layout(&self, layout: VideoLayout);
    fn audio_muted(&self) -> EventStream<bool>;
    fn video_muted(&self) -> EventStream<bool>;
    fn video_state(&self) -> EventStream<VideoState>;
    fn video_layout(&self) -> EventStream<VideoLayout>;
    fn waiting_room_events(&self) -> EventStream<WaitingRoomEvent>;
}

pub trait ContentShareService: Send + Sync {
    fn content_share_state_value(&self) -> ContentShareState;
    fn content_share_state(&self) -> EventStream<ContentShareState>;
    fn content_share_availability(&self) -> EventStream<ContentShareAvailability>;
    fn content_share_events(&self) -> EventStream<ContentShareEvent>;
    fn receiving_remote_content(&self) -> EventStream<bool>;
    fn start_content_share(&self);
    fn stop_content_share(&self);
}

pub trait ClosedCaptioningService: Send + Sync {
    fn is_available(&self) -> bool;
    fn closed_caption_text(&self) -> EventStream<String>;
    fn closed_captioning_state(&self) -> EventStream<ClosedCaptioningState>;
    fn start_closed_captioning(&self);
    fn stop_closed_captioning(&self);
}

pub trait ParticipantsService: Send + Sync {
    fn participants(&self) -> EventStream<Vec<Participant>>;
    fn active_speaker(&self) -> EventStream<Option<Participant>>;
}

pub trait ModeratorWaitingRoomService: Send + Sync {
    fn is_waiting_room_enabled(&self) -> EventStream<bool>;
    fn waiting_room_participant_events(&self) -> EventStream<WaitingRoomParticipantEvent>;
    fn set_waiting_room_enabled(&self, enabled: bool);
    fn admit_participant(&self, participant: &Participant);
    fn deny_participant(&self, participant: &Participant);
    fn admit_all(&self);
    fn deny_all(&self);
}

pub trait AudioDeviceService: Send + Sync {
    fn audio_devices(&self) -> EventStream<Vec<AudioDevice>>;
    fn current_audio_device(&self) -> EventStream<AudioDevice>;
    fn select_audio_device(&self, device: &AudioDevice);
}

pub trait VideoDeviceService: Send + Sync {
    fn video_devices(&self) -> EventStream<Vec<VideoDevice>>;
    fn current_video_device(&self) -> EventStream<VideoDevice>;
    fn select_video_device(&self, device: &VideoDevice);
    fn enable_self_video_preview(&self, enabled: bool);
}

pub trait PermissionService: Send + Sync {
    fn has_permission(&self, permission: Permission) -> bool;
    fn has_minimum_permissions(&self) -> bool;
    fn request_permissions(&self, permissions: &[Permission]) -> SdkFuture<PermissionStatus>;
    fn denied_permissions(&self) -> Vec<Permission>;
}

pub trait LoggingService: Send + Sync {
    fn upload_log(&self, comments: String, user_name: String) -> SdkFuture<LogUploadResult>;
}

/// OS-level signal keeping the process prioritized during a meeting.
pub trait ForegroundService: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn update_message(&self, message: &str);
}

/// Every SDK collaborator the coordinator consumes.
#[derive(Clone)]
pub struct Sdk {
    pub meeting: Arc<dyn MeetingService>,
    pub content_share: Arc<dyn ContentShareService>,
    pub closed_captioning: Arc<dyn ClosedCaptioningService>,
    pub participants: Arc<dyn ParticipantsService>,
    pub waiting_room: Arc<dyn ModeratorWaitingRoomService>,
    pub audio_devices: Arc<dyn AudioDeviceService>,
    pub video_devices: Arc<dyn VideoDeviceService>,
    pub permissions: Arc<dyn PermissionService>,
    pub logging: Arc<dyn LoggingService>,
    pub foreground: Arc<dyn ForegroundService>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Subscribers<T> = Vec<mpsc::UnboundedSender<Result<T, ConclaveError>>>;

fn receiver_stream<T: Send + 'static>(
    rx: mpsc::UnboundedReceiver<Result<T, ConclaveError>>,
) -> EventStream<T> {
    stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) }).boxed()
}

/// A value with a current state that replays it to every new subscriber.
///
/// Used by SDK adapters to expose state streams (meeting state, mute state,
/// device lists) without coalescing intermediate values.
pub struct StateChannel<T> {
    inner: Mutex<(T, Subscribers<T>)>,
}

impl<T: Clone + Send + 'static> StateChannel<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new((value, Vec::new())),
        }
    }

    pub fn value(&self) -> T {
        lock(&self.inner).0.clone()
    }

    pub fn set(&self, value: T) {
        let mut inner = lock(&self.inner);
        inner.0 = value.clone();
        inner.1.retain(|tx| tx.send(Ok(value.clone())).is_ok());
    }

    /// Deliver an error to current subscribers. The stored value is kept.
    pub fn fail(&self, error: ConclaveError) {
        lock(&self.inner).1.retain(|tx| tx.send(Err(error.clone())).is_ok());
    }

    pub fn subscribe(&self) -> EventStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = lock(&self.inner);
        if tx.send(Ok(inner.0.clone())).is_ok() {
            inner.1.push(tx);
        }
        receiver_stream(rx)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        let mut inner = lock(&self.inner);
        inner.1.retain(|tx| !tx.is_closed());
        inner.1.len()
    }
}

/// A stream of discrete events with no replay.
pub struct EventChannel<T> {
    subscribers: Mutex<Subscribers<T>>,
}

impl<T: Clone + Send + 'static> EventChannel<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn emit(&self, event: T) {
        lock(&self.subscribers).retain(|tx| tx.send(Ok(event.clone())).is_ok());
    }

    pub fn fail(&self, error: ConclaveError) {
        lock(&self.subscribers).retain(|tx| tx.send(Err(error.clone())).is_ok());
    }

    pub fn subscribe(&self) -> EventStream<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.subscribers).push(tx);
        receiver_stream(rx)
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

impl<T: Clone + Send + 'static> Default for EventChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn state_channel_replays_current_value() {
        let channel = StateChannel::new(MeetingState::Idle);
        channel.set(MeetingState::Connecting);

        let mut stream = channel.subscribe();
        assert_eq!(stream.next().await, Some(Ok(MeetingState::Connecting)));

        channel.set(MeetingState::Connected);
        assert_eq!(stream.next().await, Some(Ok(MeetingState::Connected)));
    }

    #[tokio::test]
    async fn state_channel_keeps_every_intermediate_value() {
        let channel = StateChannel::new(MeetingState::Idle);
        let mut stream = channel.subscribe();
        channel.set(MeetingState::Connecting);
        channel.set(MeetingState::Connected);

        let seen: Vec<_> = (&mut stream).take(3).collect().await;
        assert_eq!(
            seen,
            vec![
                Ok(MeetingState::Idle),
                Ok(MeetingState::Connecting),
                Ok(MeetingState::Connected),
            ]
        );
    }

    #[tokio::test]
    async fn errors_do_not_end_the_stream() {
        let channel = EventChannel::new();
        let mut stream = channel.subscribe();
        channel.fail(ConclaveError::Stream("boom".into()));
        channel.emit(WaitingRoomEvent::Admitted);

        assert_eq!(
            stream.next().await,
            Some(Err(ConclaveError::Stream("boom".into())))
        );
        assert_eq!(stream.next().await, Some(Ok(WaitingRoomEvent::Admitted)));
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let channel = StateChannel::new(false);
        let stream = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 1);
        drop(stream);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn meeting_calls_are_accepted_only_while_in_a_call() {
        assert!(MeetingState::Connecting.accepts_meeting_calls());
        assert!(MeetingState::Connected.accepts_meeting_calls());
        assert!(MeetingState::Reconnecting.accepts_meeting_calls());
        assert!(!MeetingState::Idle.accepts_meeting_calls());
        assert!(!MeetingState::WaitingRoom.accepts_meeting_calls());
    }
}
