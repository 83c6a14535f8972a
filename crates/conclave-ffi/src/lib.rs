//! UniFFI bindings for conclave-core.
//!
//! The platform SDK lives on the host side. The host implements
//! [`MeetingHost`] for commands and pushes every SDK stream value through the
//! `publish_*` methods of [`MeetingSession`]. Asynchronous host calls (join,
//! permission requests, log upload) carry a request id that the host hands
//! back through the matching `complete_*` method.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::FutureExt;
use tokio::sync::oneshot;

use conclave_core::coordinator::{JoinRequest, SessionConfig, SessionCoordinator, SessionHandle, UserAction};
use conclave_core::events::SessionEvent as CoreSessionEvent;
use conclave_core::in_meeting::MeetingPage as CoreMeetingPage;
use conclave_core::sdk::{
    AudioDevice as CoreAudioDevice, AudioDeviceService, ClosedCaptioningService, ClosedCaptioningState,
    ContentShareAvailability, ContentShareEvent as CoreContentShareEvent, ContentShareService,
    ContentShareState, EventChannel, EventStream, ForegroundService, JoinParams as CoreJoinParams,
    JoinResult, LogUploadResult, LoggingService, MeetingService, MeetingState as CoreMeetingState,
    ModeratorWaitingRoomService, Participant as CoreParticipant, ParticipantsService,
    Permission as CorePermission, PermissionService, PermissionStatus, Sdk, SdkFuture, StateChannel,
    VideoDevice as CoreVideoDevice, VideoDeviceService, VideoLayout as CoreVideoLayout,
    VideoState as CoreVideoState, WaitingRoomEvent as CoreWaitingRoomEvent,
    WaitingRoomParticipantEvent,
};
use conclave_core::view::{MenuState as CoreMenuState, UiState as CoreUiState};
use conclave_core::{ConclaveError as CoreError, SettingsStore};

uniffi::include_scaffolding!("conclave");

// ── Namespace functions ──────────────────────────────────────────────

/// Initialize tracing/logging. Call once from the host before creating a
/// MeetingSession. On Android, stderr goes to logcat for debuggable builds.
fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("conclave_core=debug,conclave_ffi=debug")),
            )
            .with_ansi(false)
            .init();
    });
}

// ── FFI-safe type conversions ────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum MeetingState {
    Idle,
    Connecting,
    Connected,
    Reconnecting,
    WaitingRoom,
}

impl From<CoreMeetingState> for MeetingState {
    fn from(s: CoreMeetingState) -> Self {
        match s {
            CoreMeetingState::Idle => Self::Idle,
            CoreMeetingState::Connecting => Self::Connecting,
            CoreMeetingState::Connected => Self::Connected,
            CoreMeetingState::Reconnecting => Self::Reconnecting,
            CoreMeetingState::WaitingRoom => Self::WaitingRoom,
        }
    }
}

impl From<MeetingState> for CoreMeetingState {
    fn from(s: MeetingState) -> Self {
        match s {
            MeetingState::Idle => Self::Idle,
            MeetingState::Connecting => Self::Connecting,
            MeetingState::Connected => Self::Connected,
            MeetingState::Reconnecting => Self::Reconnecting,
            MeetingState::WaitingRoom => Self::WaitingRoom,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum VideoState {
    Active,
    SingleParticipant,
    NoOneHasVideo,
    NeedsModerator,
    Inactive,
}

impl From<VideoState> for CoreVideoState {
    fn from(s: VideoState) -> Self {
        match s {
            VideoState::Active => Self::Active,
            VideoState::SingleParticipant => Self::SingleParticipant,
            VideoState::NoOneHasVideo => Self::NoOneHasVideo,
            VideoState::NeedsModerator => Self::NeedsModerator,
            VideoState::Inactive => Self::Inactive,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum VideoLayout {
    Speaker,
    People,
    Gallery,
}

impl From<VideoLayout> for CoreVideoLayout {
    fn from(l: VideoLayout) -> Self {
        match l {
            VideoLayout::Speaker => Self::Speaker,
            VideoLayout::People => Self::People,
            VideoLayout::Gallery => Self::Gallery,
        }
    }
}

impl From<CoreVideoLayout> for VideoLayout {
    fn from(l: CoreVideoLayout) -> Self {
        match l {
            CoreVideoLayout::Speaker => Self::Speaker,
            CoreVideoLayout::People => Self::People,
            CoreVideoLayout::Gallery => Self::Gallery,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum MeetingPage {
    RemoteVideo,
    RemoteContent,
}

impl From<MeetingPage> for CoreMeetingPage {
    fn from(p: MeetingPage) -> Self {
        match p {
            MeetingPage::RemoteVideo => Self::RemoteVideo,
            MeetingPage::RemoteContent => Self::RemoteContent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    RecordAudio,
}

impl From<Permission> for CorePermission {
    fn from(p: Permission) -> Self {
        match p {
            Permission::Camera => Self::Camera,
            Permission::RecordAudio => Self::RecordAudio,
        }
    }
}

impl From<CorePermission> for Permission {
    fn from(p: CorePermission) -> Self {
        match p {
            CorePermission::Camera => Self::Camera,
            CorePermission::RecordAudio => Self::RecordAudio,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum WaitingRoomEvent {
    Admitted,
    Denied,
    Demoted,
}

impl From<WaitingRoomEvent> for CoreWaitingRoomEvent {
    fn from(e: WaitingRoomEvent) -> Self {
        match e {
            WaitingRoomEvent::Admitted => Self::Admitted,
            WaitingRoomEvent::Denied => Self::Denied,
            WaitingRoomEvent::Demoted => Self::Demoted,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ContentShareEvent {
    Started,
    Stopped,
    Interrupted { reason: String },
}

impl From<ContentShareEvent> for CoreContentShareEvent {
    fn from(e: ContentShareEvent) -> Self {
        match e {
            ContentShareEvent::Started => Self::Started,
            ContentShareEvent::Stopped => Self::Stopped,
            ContentShareEvent::Interrupted { reason } => Self::Interrupted(reason),
        }
    }
}

#[derive(Debug, Clone)]
pub enum JoinOutcome {
    Success,
    Rejected { reason: String },
    Failed { msg: String },
}

impl From<JoinOutcome> for Result<JoinResult, CoreError> {
    fn from(o: JoinOutcome) -> Self {
        match o {
            JoinOutcome::Success => Ok(JoinResult::Success),
            JoinOutcome::Rejected { reason } => Ok(JoinResult::Rejected(reason)),
            JoinOutcome::Failed { msg } => Err(CoreError::Join(msg)),
        }
    }
}

#[derive(Debug, Clone)]
pub enum PermissionOutcome {
    Granted,
    NotGranted,
    NotRegistered,
    Failed { msg: String },
}

impl From<PermissionOutcome> for Result<PermissionStatus, CoreError> {
    fn from(o: PermissionOutcome) -> Self {
        match o {
            PermissionOutcome::Granted => Ok(PermissionStatus::Granted),
            PermissionOutcome::NotGranted => Ok(PermissionStatus::NotGranted),
            PermissionOutcome::NotRegistered => Ok(PermissionStatus::NotRegistered),
            PermissionOutcome::Failed { msg } => Err(CoreError::Permission(msg)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub name: String,
}

impl From<Participant> for CoreParticipant {
    fn from(p: Participant) -> Self {
        Self { id: p.id, name: p.name }
    }
}

impl From<CoreParticipant> for Participant {
    fn from(p: CoreParticipant) -> Self {
        Self { id: p.id, name: p.name }
    }
}

#[derive(Debug, Clone)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
}

impl From<AudioDevice> for CoreAudioDevice {
    fn from(d: AudioDevice) -> Self {
        Self { id: d.id, name: d.name }
    }
}

#[derive(Debug, Clone)]
pub struct VideoDevice {
    pub id: String,
    pub name: String,
}

impl From<VideoDevice> for CoreVideoDevice {
    fn from(d: VideoDevice) -> Self {
        Self { id: d.id, name: d.name }
    }
}

#[derive(Debug, Clone)]
pub struct JoinParams {
    pub meeting_id: String,
    pub passcode: String,
    pub display_name: String,
}

impl From<CoreJoinParams> for JoinParams {
    fn from(p: CoreJoinParams) -> Self {
        Self {
            meeting_id: p.meeting_id,
            passcode: p.passcode,
            display_name: p.display_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub display_name: Option<String>,
    pub audio_muted_on_join: bool,
    pub video_muted_on_join: bool,
}

impl From<conclave_core::Settings> for Settings {
    fn from(s: conclave_core::Settings) -> Self {
        Self {
            display_name: s.display_name,
            audio_muted_on_join: s.audio_muted_on_join,
            video_muted_on_join: s.video_muted_on_join,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MenuState {
    pub layout_label: String,
    pub audio_device_label: Option<String>,
    pub video_device_label: Option<String>,
    pub closed_captions_available: bool,
    pub closed_captions_on: bool,
    pub waiting_room_controls_visible: bool,
    pub waiting_room_enabled: bool,
}

impl From<CoreMenuState> for MenuState {
    fn from(m: CoreMenuState) -> Self {
        Self {
            layout_label: m.layout_label,
            audio_device_label: m.audio_device_label,
            video_device_label: m.video_device_label,
            closed_captions_available: m.closed_captions_available,
            closed_captions_on: m.closed_captions_on,
            waiting_room_controls_visible: m.waiting_room_controls_visible,
            waiting_room_enabled: m.waiting_room_enabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub meeting_state: MeetingState,
    pub join_form_visible: bool,
    pub waiting_room_visible: bool,
    pub meeting_title: Option<String>,
    pub meeting_controls_visible: bool,
    pub in_meeting_panel_visible: bool,
    pub panel_message: Option<String>,
    pub roster_button_visible: bool,
    pub screen_share_button_visible: bool,
    pub screen_share_selected: bool,
    pub progress_message: Option<String>,
    pub closed_caption_visible: bool,
    pub closed_caption_text: Option<String>,
    pub audio_muted: bool,
    pub video_muted: bool,
    pub camera_settings_visible: bool,
    pub self_view_visible: bool,
    pub upload_logs_visible: bool,
    pub app_version: Option<String>,
    pub secure_window: bool,
    pub menu: MenuState,
}

impl From<CoreUiState> for UiState {
    fn from(s: CoreUiState) -> Self {
        Self {
            meeting_state: s.meeting_state.into(),
            join_form_visible: s.join_form_visible,
            waiting_room_visible: s.waiting_room_visible,
            meeting_title: s.meeting_title,
            meeting_controls_visible: s.meeting_controls_visible,
            in_meeting_panel_visible: s.in_meeting_panel_visible,
            panel_message: s.panel_message,
            roster_button_visible: s.roster_button_visible,
            screen_share_button_visible: s.screen_share_button_visible,
            screen_share_selected: s.screen_share_selected,
            progress_message: s.progress_message,
            closed_caption_visible: s.closed_caption_visible,
            closed_caption_text: s.closed_caption_text,
            audio_muted: s.audio_muted,
            video_muted: s.video_muted,
            camera_settings_visible: s.camera_settings_visible,
            self_view_visible: s.self_view_visible,
            upload_logs_visible: s.upload_logs_visible,
            app_version: s.app_version,
            secure_window: s.secure_window,
            menu: s.menu.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    UiChanged { state: UiState },
    Notice { message: String },
    ScreenCaptureRequested,
    WaitingRoomDialogRequested { participants: Vec<Participant> },
}

impl From<CoreSessionEvent> for SessionEvent {
    fn from(e: CoreSessionEvent) -> Self {
        match e {
            CoreSessionEvent::UiChanged(state) => Self::UiChanged { state: state.into() },
            CoreSessionEvent::Notice(notice) => Self::Notice {
                message: notice.to_string(),
            },
            CoreSessionEvent::ScreenCaptureRequested => Self::ScreenCaptureRequested,
            CoreSessionEvent::WaitingRoomDialogRequested(participants) => Self::WaitingRoomDialogRequested {
                participants: participants.into_iter().map(Participant::from).collect(),
            },
        }
    }
}

// ── Error conversion ─────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConclaveError {
    #[error("Stream error: {msg}")]
    Stream { msg: String },
    #[error("Join error: {msg}")]
    Join { msg: String },
    #[error("Permission error: {msg}")]
    Permission { msg: String },
    #[error("Log upload error: {msg}")]
    LogUpload { msg: String },
    #[error("Host error: {msg}")]
    Host { msg: String },
    #[error("Runtime error: {msg}")]
    Runtime { msg: String },
}

impl From<CoreError> for ConclaveError {
    fn from(e: CoreError) -> Self {
        tracing::error!("ConclaveError: {e}");
        match e {
            CoreError::Stream(msg) => Self::Stream { msg },
            CoreError::Join(msg) => Self::Join { msg },
            CoreError::Permission(msg) => Self::Permission { msg },
            CoreError::LogUpload(msg) => Self::LogUpload { msg },
            CoreError::Host(msg) => Self::Host { msg },
            e @ CoreError::SubscriptionsActive(_) => Self::Host { msg: e.to_string() },
        }
    }
}

// ── Callback interfaces ──────────────────────────────────────────────

pub trait SessionListener: Send + Sync {
    fn on_event(&self, event: SessionEvent);
}

pub trait MeetingHost: Send + Sync {
    fn is_moderator(&self) -> bool;
    fn meeting_title(&self) -> Option<String>;
    fn join_meeting(&self, request_id: u64, params: JoinParams);
    fn end_meeting(&self);
    fn set_audio_muted(&self, muted: bool);
    fn set_video_muted(&self, muted: bool);
    fn set_video_layout(&self, layout: VideoLayout);

    fn start_content_share(&self);
    fn stop_content_share(&self);

    fn is_closed_captioning_available(&self) -> bool;
    fn set_closed_captioning(&self, enabled: bool);

    fn set_waiting_room_enabled(&self, enabled: bool);
    fn admit_participant(&self, participant_id: String);
    fn deny_participant(&self, participant_id: String);
    fn admit_all(&self);
    fn deny_all(&self);

    fn select_audio_device(&self, device_id: String);
    fn select_video_device(&self, device_id: String);
    fn enable_self_video_preview(&self, enabled: bool);

    fn has_permission(&self, permission: Permission) -> bool;
    fn has_minimum_permissions(&self) -> bool;
    fn request_permissions(&self, request_id: u64, permissions: Vec<Permission>);
    fn denied_permissions(&self) -> Vec<Permission>;

    fn upload_log(&self, request_id: u64, comments: String, user_name: String);

    fn start_foreground_service(&self);
    fn stop_foreground_service(&self);
    fn update_foreground_message(&self, message: String);
}

// ── Bridge listener: core events → FFI callback ──────────────────────

struct BridgeListener {
    ffi_listener: Arc<dyn SessionListener>,
}

impl conclave_core::SessionEventListener for BridgeListener {
    fn on_event(&self, event: CoreSessionEvent) {
        self.ffi_listener.on_event(event.into());
    }
}

// ── Host-backed SDK ──────────────────────────────────────────────────

/// Host calls waiting for a `complete_*` answer, keyed by request id.
struct PendingCalls<T> {
    next_id: AtomicU64,
    waiting: Mutex<HashMap<u64, oneshot::Sender<Result<T, CoreError>>>>,
}

impl<T: Send + 'static> PendingCalls<T> {
    fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            waiting: Mutex::new(HashMap::new()),
        }
    }

    fn register(&self) -> (u64, SdkFuture<T>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let mut waiting = self.waiting.lock().unwrap_or_else(PoisonError::into_inner);
        // Calls the coordinator gave up on (cancelled join, destroyed session).
        waiting.retain(|_, pending| !pending.is_closed());
        waiting.insert(id, tx);
        drop(waiting);
        let future = async move {
            rx.await
                .unwrap_or_else(|_| Err(CoreError::Host("request abandoned by host".into())))
        }
        .boxed();
        (id, future)
    }

    /// Returns false for unknown ids and for requests nobody waits on anymore.
    fn complete(&self, id: u64, result: Result<T, CoreError>) -> bool {
        let sender = self
            .waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        match sender {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }
}

/// The core's SDK services implemented over the host callback interface and
/// the values the host publishes.
struct HostSdk {
    host: Arc<dyn MeetingHost>,
    meeting_state: StateChannel<CoreMeetingState>,
    audio_muted: StateChannel<bool>,
    video_muted: StateChannel<bool>,
    video_state: StateChannel<CoreVideoState>,
    video_layout: StateChannel<CoreVideoLayout>,
    waiting_room_events: EventChannel<CoreWaitingRoomEvent>,
    content_share_state: StateChannel<ContentShareState>,
    content_share_availability: StateChannel<ContentShareAvailability>,
    content_share_events: EventChannel<CoreContentShareEvent>,
    remote_content: StateChannel<bool>,
    caption_text: EventChannel<String>,
    captioning_state: StateChannel<ClosedCaptioningState>,
    participants: StateChannel<Vec<CoreParticipant>>,
    active_speaker: StateChannel<Option<CoreParticipant>>,
    waiting_room_enabled: StateChannel<bool>,
    waiting_room_participants: EventChannel<WaitingRoomParticipantEvent>,
    audio_devices: StateChannel<Vec<CoreAudioDevice>>,
    current_audio_device: EventChannel<CoreAudioDevice>,
    video_devices: StateChannel<Vec<CoreVideoDevice>>,
    current_video_device: EventChannel<CoreVideoDevice>,
    joins: PendingCalls<JoinResult>,
    permission_requests: PendingCalls<PermissionStatus>,
    log_uploads: PendingCalls<LogUploadResult>,
}

impl HostSdk {
    fn new(host: Arc<dyn MeetingHost>) -> Self {
        Self {
            host,
            meeting_state: StateChannel::new(CoreMeetingState::Idle),
            audio_muted: StateChannel::new(false),
            video_muted: StateChannel::new(false),
            video_state: StateChannel::new(CoreVideoState::Inactive),
            video_layout: StateChannel::new(CoreVideoLayout::Speaker),
            waiting_room_events: EventChannel::new(),
            content_share_state: StateChannel::new(ContentShareState::Stopped),
            content_share_availability: StateChannel::new(ContentShareAvailability::Unavailable),
            content_share_events: EventChannel::new(),
            remote_content: StateChannel::new(false),
            caption_text: EventChannel::new(),
            captioning_state: StateChannel::new(ClosedCaptioningState::Stopped),
            participants: StateChannel::new(Vec::new()),
            active_speaker: StateChannel::new(None),
            waiting_room_enabled: StateChannel::new(false),
            waiting_room_participants: EventChannel::new(),
            audio_devices: StateChannel::new(Vec::new()),
            current_audio_device: EventChannel::new(),
            video_devices: StateChannel::new(Vec::new()),
            current_video_device: EventChannel::new(),
            joins: PendingCalls::new(),
            permission_requests: PendingCalls::new(),
            log_uploads: PendingCalls::new(),
        }
    }

    fn sdk(self: &Arc<Self>) -> Sdk {
        Sdk {
            meeting: self.clone(),
            content_share: self.clone(),
            closed_captioning: self.clone(),
            participants: self.clone(),
            waiting_room: self.clone(),
            audio_devices: self.clone(),
            video_devices: self.clone(),
            permissions: self.clone(),
            logging: self.clone(),
            foreground: self.clone(),
        }
    }

    /// Deliver a host-reported error on the named stream.
    fn fail_stream(&self, stream: &str, error: CoreError) -> bool {
        match stream {
            "meeting_state" => self.meeting_state.fail(error),
            "audio_muted" => self.audio_muted.fail(error),
            "video_muted" => self.video_muted.fail(error),
            "video_state" => self.video_state.fail(error),
            "video_layout" => self.video_layout.fail(error),
            "waiting_room_events" => self.waiting_room_events.fail(error),
            "content_share_state" => self.content_share_state.fail(error),
            "content_share_availability" => self.content_share_availability.fail(error),
            "content_share_events" => self.content_share_events.fail(error),
            "remote_content" => self.remote_content.fail(error),
            "closed_caption_text" => self.caption_text.fail(error),
            "closed_captioning_state" => self.captioning_state.fail(error),
            "participants" => self.participants.fail(error),
            "active_speaker" => self.active_speaker.fail(error),
            "waiting_room_enabled" => self.waiting_room_enabled.fail(error),
            "waiting_room_participants" => self.waiting_room_participants.fail(error),
            "audio_devices" => self.audio_devices.fail(error),
            "current_audio_device" => self.current_audio_device.fail(error),
            "video_devices" => self.video_devices.fail(error),
            "current_video_device" => self.current_video_device.fail(error),
            _ => return false,
        }
        true
    }
}

impl MeetingService for HostSdk {
    fn meeting_state(&self) -> CoreMeetingState {
        self.meeting_state.value()
    }

    fn meeting_state_stream(&self) -> EventStream<CoreMeetingState> {
        self.meeting_state.subscribe()
    }

    fn is_moderator(&self) -> bool {
        self.host.is_moderator()
    }

    fn meeting_title(&self) -> Option<String> {
        self.host.meeting_title()
    }

    fn join_meeting(&self, params: CoreJoinParams) -> SdkFuture<JoinResult> {
        let (request_id, future) = self.joins.register();
        self.host.join_meeting(request_id, params.into());
        future
    }

    fn end_meeting(&self) {
        self.host.end_meeting();
    }

    fn set_audio_muted(&self, muted: bool) {
        self.host.set_audio_muted(muted);
    }

    fn set_video_muted(&self, muted: bool) {
        self.host.set_video_muted(muted);
    }

    fn set_video_layout(&self, layout: CoreVideoLayout) {
        self.host.set_video_layout(layout.into());
    }

    fn audio_muted(&self) -> EventStream<bool> {
        self.audio_muted.subscribe()
    }

    fn video_muted(&self) -> EventStream<bool> {
        self.video_muted.subscribe()
    }

    fn video_state(&self) -> EventStream<CoreVideoState> {
        self.video_state.subscribe()
    }

    fn video_layout(&self) -> EventStream<CoreVideoLayout> {
        self.video_layout.subscribe()
    }

    fn waiting_room_events(&self) -> EventStream<CoreWaitingRoomEvent> {
        self.waiting_room_events.subscribe()
    }
}

impl ContentShareService for HostSdk {
    fn content_share_state_value(&self) -> ContentShareState {
        self.content_share_state.value()
    }

    fn content_share_state(&self) -> EventStream<ContentShareState> {
        self.content_share_state.subscribe()
    }

    fn content_share_availability(&self) -> EventStream<ContentShareAvailability> {
        self.content_share_availability.subscribe()
    }

    fn content_share_events(&self) -> EventStream<CoreContentShareEvent> {
        self.content_share_events.subscribe()
    }

    fn receiving_remote_content(&self) -> EventStream<bool> {
        self.remote_content.subscribe()
    }

    fn start_content_share(&self) {
        self.host.start_content_share();
    }

    fn stop_content_share(&self) {
        self.host.stop_content_share();
    }
}

impl ClosedCaptioningService for HostSdk {
    fn is_available(&self) -> bool {
        self.host.is_closed_captioning_available()
    }

    fn closed_caption_text(&self) -> EventStream<String> {
        self.caption_text.subscribe()
    }

    fn closed_captioning_state(&self) -> EventStream<ClosedCaptioningState> {
        self.captioning_state.subscribe()
    }

    fn start_closed_captioning(&self) {
        self.host.set_closed_captioning(true);
    }

    fn stop_closed_captioning(&self) {
        self.host.set_closed_captioning(false);
    }
}

impl ParticipantsService for HostSdk {
    fn participants(&self) -> EventStream<Vec<CoreParticipant>> {
        self.participants.subscribe()
    }

    fn active_speaker(&self) -> EventStream<Option<CoreParticipant>> {
        self.active_speaker.subscribe()
    }
}

impl ModeratorWaitingRoomService for HostSdk {
    fn is_waiting_room_enabled(&self) -> EventStream<bool> {
        self.waiting_room_enabled.subscribe()
    }

    fn waiting_room_participant_events(&self) -> EventStream<WaitingRoomParticipantEvent> {
        self.waiting_room_participants.subscribe()
    }

    fn set_waiting_room_enabled(&self, enabled: bool) {
        self.host.set_waiting_room_enabled(enabled);
    }

    fn admit_participant(&self, participant: &CoreParticipant) {
        self.host.admit_participant(participant.id.clone());
    }

    fn deny_participant(&self, participant: &CoreParticipant) {
        self.host.deny_participant(participant.id.clone());
    }

    fn admit_all(&self) {
        self.host.admit_all();
    }

    fn deny_all(&self) {
        self.host.deny_all();
    }
}

impl AudioDeviceService for HostSdk {
    fn audio_devices(&self) -> EventStream<Vec<CoreAudioDevice>> {
        self.audio_devices.subscribe()
    }

    fn current_audio_device(&self) -> EventStream<CoreAudioDevice> {
        self.current_audio_device.subscribe()
    }

    fn select_audio_device(&self, device: &CoreAudioDevice) {
        self.host.select_audio_device(device.id.clone());
    }
}

impl VideoDeviceService for HostSdk {
    fn video_devices(&self) -> EventStream<Vec<CoreVideoDevice>> {
        self.video_devices.subscribe()
    }

    fn current_video_device(&self) -> EventStream<CoreVideoDevice> {
        self.current_video_device.subscribe()
    }

    fn select_video_device(&self, device: &CoreVideoDevice) {
        self.host.select_video_device(device.id.clone());
    }

    fn enable_self_video_preview(&self, enabled: bool) {
        self.host.enable_self_video_preview(enabled);
    }
}

impl PermissionService for HostSdk {
    fn has_permission(&self, permission: CorePermission) -> bool {
        self.host.has_permission(permission.into())
    }

    fn has_minimum_permissions(&self) -> bool {
        self.host.has_minimum_permissions()
    }

    fn request_permissions(&self, permissions: &[CorePermission]) -> SdkFuture<PermissionStatus> {
        let (request_id, future) = self.permission_requests.register();
        self.host
            .request_permissions(request_id, permissions.iter().copied().map(Permission::from).collect());
        future
    }

    fn denied_permissions(&self) -> Vec<CorePermission> {
        self.host
            .denied_permissions()
            .into_iter()
            .map(CorePermission::from)
            .collect()
    }
}

impl LoggingService for HostSdk {
    fn upload_log(&self, comments: String, user_name: String) -> SdkFuture<LogUploadResult> {
        let (request_id, future) = self.log_uploads.register();
        self.host.upload_log(request_id, comments, user_name);
        future
    }
}

impl ForegroundService for HostSdk {
    fn start(&self) {
        self.host.start_foreground_service();
    }

    fn stop(&self) {
        self.host.stop_foreground_service();
    }

    fn update_message(&self, message: &str) {
        self.host.update_foreground_message(message.to_string());
    }
}

// ── MeetingSession: main FFI object ──────────────────────────────────

pub struct MeetingSession {
    sdk: Arc<HostSdk>,
    handle: SessionHandle,
    settings: Arc<SettingsStore>,
    rt: tokio::runtime::Runtime,
}

impl MeetingSession {
    pub fn new(
        data_dir: String,
        app_version: String,
        host: Box<dyn MeetingHost>,
        listener: Box<dyn SessionListener>,
    ) -> Result<Self, ConclaveError> {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ConclaveError::Runtime { msg: e.to_string() })?;
        let settings = Arc::new(SettingsStore::new(&data_dir));
        let sdk = Arc::new(HostSdk::new(Arc::from(host)));

        let config = SessionConfig {
            app_version,
            ..SessionConfig::default()
        };
        let mut coordinator = SessionCoordinator::new(sdk.sdk(), settings.clone(), config);
        coordinator.add_listener(Arc::new(BridgeListener {
            ffi_listener: Arc::from(listener),
        }));
        let handle = coordinator.handle();
        tracing::info!(session = %coordinator.id(), "meeting session created");

        let session = Self {
            sdk,
            handle,
            settings,
            rt,
        };
        session.rt.spawn(async move {
            coordinator.start();
            coordinator.run().await;
        });
        Ok(session)
    }

    fn send(&self, action: UserAction) {
        if let Err(e) = self.handle.send(action) {
            tracing::warn!("action dropped: {e}");
        }
    }

    // ── User actions ─────────────────────────────────────────────────

    pub fn resume(&self) {
        self.send(UserAction::Resume);
    }

    pub fn join(&self, meeting_id: String, passcode: String, display_name: String) {
        self.send(UserAction::Join(JoinRequest {
            meeting_id,
            passcode,
            display_name,
        }));
    }

    pub fn leave(&self) {
        self.send(UserAction::Leave);
    }

    pub fn exit_waiting_room(&self) {
        self.send(UserAction::ExitWaitingRoom);
    }

    pub fn toggle_microphone(&self) {
        self.send(UserAction::ToggleMicrophone);
    }

    pub fn toggle_camera(&self) {
        self.send(UserAction::ToggleCamera);
    }

    pub fn toggle_screen_share(&self) {
        self.send(UserAction::ToggleScreenShare);
    }

    pub fn screen_capture_result(&self, granted: bool) {
        self.send(UserAction::ScreenCaptureResult { granted });
    }

    pub fn select_page(&self, page: MeetingPage) {
        self.send(UserAction::SelectPage(page.into()));
    }

    pub fn select_video_layout(&self, layout: VideoLayout) {
        self.send(UserAction::SelectVideoLayout(layout.into()));
    }

    pub fn select_audio_device(&self, position: u32) {
        self.send(UserAction::SelectAudioDevice(position as usize));
    }

    pub fn select_video_device(&self, position: u32) {
        self.send(UserAction::SelectVideoDevice(position as usize));
    }

    pub fn set_closed_captions(&self, enabled: bool) {
        self.send(UserAction::SetClosedCaptions(enabled));
    }

    pub fn show_waiting_room(&self) {
        self.send(UserAction::ShowWaitingRoom);
    }

    pub fn set_waiting_room_enabled(&self, enabled: bool) {
        self.send(UserAction::SetWaitingRoomEnabled(enabled));
    }

    pub fn admit(&self, participant_id: String) {
        self.send(UserAction::Admit(participant_id));
    }

    pub fn deny(&self, participant_id: String) {
        self.send(UserAction::Deny(participant_id));
    }

    pub fn admit_all(&self) {
        self.send(UserAction::AdmitAll);
    }

    pub fn deny_all(&self) {
        self.send(UserAction::DenyAll);
    }

    pub fn upload_logs(&self, comments: String) {
        self.send(UserAction::UploadLogs(comments));
    }

    /// The app task was removed while the foreground service kept running.
    ///
    /// Returns whether a connected meeting is being ended. The foreground
    /// service is stopped in every state.
    pub fn task_removed(&self) -> bool {
        let connected = self.sdk.meeting_state.value() == CoreMeetingState::Connected;
        self.send(UserAction::TaskRemoved);
        connected
    }

    pub fn destroy(&self) {
        self.send(UserAction::Destroy);
    }

    // ── SDK stream values ────────────────────────────────────────────

    pub fn publish_meeting_state(&self, state: MeetingState) {
        self.sdk.meeting_state.set(state.into());
    }

    pub fn publish_audio_muted(&self, muted: bool) {
        self.sdk.audio_muted.set(muted);
    }

    pub fn publish_video_muted(&self, muted: bool) {
        self.sdk.video_muted.set(muted);
    }

    pub fn publish_video_state(&self, state: VideoState) {
        self.sdk.video_state.set(state.into());
    }

    pub fn publish_video_layout(&self, layout: VideoLayout) {
        self.sdk.video_layout.set(layout.into());
    }

    pub fn publish_waiting_room_event(&self, event: WaitingRoomEvent) {
        self.sdk.waiting_room_events.emit(event.into());
    }

    pub fn publish_content_share_active(&self, active: bool) {
        let state = if active {
            ContentShareState::Started
        } else {
            ContentShareState::Stopped
        };
        self.sdk.content_share_state.set(state);
    }

    pub fn publish_content_share_available(&self, available: bool) {
        let availability = if available {
            ContentShareAvailability::Available
        } else {
            ContentShareAvailability::Unavailable
        };
        self.sdk.content_share_availability.set(availability);
    }

    pub fn publish_content_share_event(&self, event: ContentShareEvent) {
        self.sdk.content_share_events.emit(event.into());
    }

    pub fn publish_remote_content(&self, available: bool) {
        self.sdk.remote_content.set(available);
    }

    pub fn publish_closed_caption_text(&self, text: String) {
        self.sdk.caption_text.emit(text);
    }

    pub fn publish_closed_captioning_active(&self, active: bool) {
        let state = if active {
            ClosedCaptioningState::Started
        } else {
            ClosedCaptioningState::Stopped
        };
        self.sdk.captioning_state.set(state);
    }

    pub fn publish_participants(&self, participants: Vec<Participant>) {
        self.sdk
            .participants
            .set(participants.into_iter().map(CoreParticipant::from).collect());
    }

    pub fn publish_active_speaker(&self, speaker: Option<Participant>) {
        self.sdk.active_speaker.set(speaker.map(CoreParticipant::from));
    }

    pub fn publish_waiting_room_enabled(&self, enabled: bool) {
        self.sdk.waiting_room_enabled.set(enabled);
    }

    pub fn publish_waiting_room_joined(&self, participants: Vec<Participant>) {
        self.sdk.waiting_room_participants.emit(WaitingRoomParticipantEvent::Added(
            participants.into_iter().map(CoreParticipant::from).collect(),
        ));
    }

    pub fn publish_waiting_room_left(&self, participants: Vec<Participant>) {
        self.sdk.waiting_room_participants.emit(WaitingRoomParticipantEvent::Removed(
            participants.into_iter().map(CoreParticipant::from).collect(),
        ));
    }

    pub fn publish_audio_devices(&self, devices: Vec<AudioDevice>) {
        self.sdk
            .audio_devices
            .set(devices.into_iter().map(CoreAudioDevice::from).collect());
    }

    pub fn publish_current_audio_device(&self, device: AudioDevice) {
        self.sdk.current_audio_device.emit(device.into());
    }

    pub fn publish_video_devices(&self, devices: Vec<VideoDevice>) {
        self.sdk
            .video_devices
            .set(devices.into_iter().map(CoreVideoDevice::from).collect());
    }

    pub fn publish_current_video_device(&self, device: VideoDevice) {
        self.sdk.current_video_device.emit(device.into());
    }

    pub fn publish_stream_error(&self, stream: String, msg: String) {
        if !self.sdk.fail_stream(&stream, CoreError::Stream(msg)) {
            tracing::warn!(stream = %stream, "error reported for unknown stream");
        }
    }

    // ── Completions of host requests ─────────────────────────────────

    pub fn complete_join(&self, request_id: u64, outcome: JoinOutcome) -> bool {
        self.sdk.joins.complete(request_id, outcome.into())
    }

    pub fn complete_permission_request(&self, request_id: u64, outcome: PermissionOutcome) -> bool {
        self.sdk.permission_requests.complete(request_id, outcome.into())
    }

    pub fn complete_log_upload(&self, request_id: u64, success: bool) -> bool {
        let result = if success {
            LogUploadResult::Success
        } else {
            LogUploadResult::Failed
        };
        self.sdk.log_uploads.complete(request_id, Ok(result))
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn get_settings(&self) -> Settings {
        self.settings.get().into()
    }

    pub fn set_display_name(&self, name: Option<String>) {
        self.settings.set_display_name(name);
    }
}
