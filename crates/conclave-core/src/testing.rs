//! In-process SDK fakes for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;

use crate::coordinator::SessionCoordinator;
use crate::errors::ConclaveError;
use crate::events::{Notice, SessionEvent, SessionEventListener};
use crate::sdk::*;
use crate::view::UiState;

pub(crate) struct FakeMeeting {
    pub state: StateChannel<MeetingState>,
    pub audio_muted: StateChannel<bool>,
    pub video_muted: StateChannel<bool>,
    pub video_state: StateChannel<VideoState>,
    pub video_layout: StateChannel<VideoLayout>,
    pub waiting_room_events: EventChannel<WaitingRoomEvent>,
    moderator: AtomicBool,
    title: Mutex<Option<String>>,
    join_result: Mutex<Result<JoinResult, ConclaveError>>,
    joins: Mutex<Vec<JoinParams>>,
    ends: AtomicUsize,
    audio_mute_calls: Mutex<Vec<bool>>,
    video_mute_calls: Mutex<Vec<bool>>,
    layouts: Mutex<Vec<VideoLayout>>,
}

impl FakeMeeting {
    fn new() -> Self {
        Self {
            state: StateChannel::new(MeetingState::Idle),
            audio_muted: StateChannel::new(false),
            video_muted: StateChannel::new(false),
            video_state: StateChannel::new(VideoState::Active),
            video_layout: StateChannel::new(VideoLayout::Speaker),
            waiting_room_events: EventChannel::new(),
            moderator: AtomicBool::new(false),
            title: Mutex::new(None),
            join_result: Mutex::new(Ok(JoinResult::Success)),
            joins: Mutex::new(Vec::new()),
            ends: AtomicUsize::new(0),
            audio_mute_calls: Mutex::new(Vec::new()),
            video_mute_calls: Mutex::new(Vec::new()),
            layouts: Mutex::new(Vec::new()),
        }
    }

    pub fn set_moderator(&self, moderator: bool) {
        self.moderator.store(moderator, Ordering::SeqCst);
    }

    pub fn set_title(&self, title: Option<&str>) {
        *lock(&self.title) = title.map(str::to_string);
    }

    pub fn set_join_result(&self, result: Result<JoinResult, ConclaveError>) {
        *lock(&self.join_result) = result;
    }

    pub fn joins(&self) -> Vec<JoinParams> {
        lock(&self.joins).clone()
    }

    pub fn end_calls(&self) -> usize {
        self.ends.load(Ordering::SeqCst)
    }

    pub fn audio_mute_calls(&self) -> Vec<bool> {
        lock(&self.audio_mute_calls).clone()
    }

    pub fn video_mute_calls(&self) -> Vec<bool> {
        lock(&self.video_mute_calls).clone()
    }

    pub fn layouts(&self) -> Vec<VideoLayout> {
        lock(&self.layouts).clone()
    }
}

impl MeetingService for FakeMeeting {
    fn meeting_state(&self) -> MeetingState {
        self.state.value()
    }

    fn meeting_state_stream(&self) -> EventStream<MeetingState> {
        self.state.subscribe()
    }

    fn is_moderator(&self) -> bool {
        self.moderator.load(Ordering::SeqCst)
    }

    fn meeting_title(&self) -> Option<String> {
        lock(&self.title).clone()
    }

    fn join_meeting(&self, params: JoinParams) -> SdkFuture<JoinResult> {
        lock(&self.joins).push(params);
        let result = lock(&self.join_result).clone();
        async move { result }.boxed()
    }

    fn end_meeting(&self) {
        self.ends.fetch_add(1, Ordering::SeqCst);
    }

    fn set_audio_muted(&self, muted: bool) {
        lock(&self.audio_mute_calls).push(muted);
    }

    fn set_video_muted(&self, muted: bool) {
        lock(&self.video_mute_calls).push(muted);
    }

    fn set_video_layout(&self, layout: VideoLayout) {
        lock(&self.layouts).push(layout);
    }

    fn audio_muted(&self) -> EventStream<bool> {
        self.audio_muted.subscribe()
    }

    fn video_muted(&self) -> EventStream<bool> {
        self.video_muted.subscribe()
    }

    fn video_state(&self) -> EventStream<VideoState> {
        self.video_state.subscribe()
    }

    fn video_layout(&self) -> EventStream<VideoLayout> {
        self.video_layout.subscribe()
    }

    fn waiting_room_events(&self) -> EventStream<WaitingRoomEvent> {
        self.waiting_room_events.subscribe()
    }
}

pub(crate) struct FakeContentShare {
    pub state: StateChannel<ContentShareState>,
    pub availability: StateChannel<ContentShareAvailability>,
    pub events: EventChannel<ContentShareEvent>,
    pub remote: StateChannel<bool>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl FakeContentShare {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl ContentShareService for FakeContentShare {
    fn content_share_state_value(&self) -> ContentShareState {
        self.state.value()
    }

    fn content_share_state(&self) -> EventStream<ContentShareState> {
        self.state.subscribe()
    }

    fn content_share_availability(&self) -> EventStream<ContentShareAvailability> {
        self.availability.subscribe()
    }

    fn content_share_events(&self) -> EventStream<ContentShareEvent> {
        self.events.subscribe()
    }

    fn receiving_remote_content(&self) -> EventStream<bool> {
        self.remote.subscribe()
    }

    fn start_content_share(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_content_share(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) struct FakeClosedCaptioning {
    pub text: StateChannel<String>,
    pub state: StateChannel<ClosedCaptioningState>,
    available: AtomicBool,
}

impl ClosedCaptioningService for FakeClosedCaptioning {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn closed_caption_text(&self) -> EventStream<String> {
        self.text.subscribe()
    }

    fn closed_captioning_state(&self) -> EventStream<ClosedCaptioningState> {
        self.state.subscribe()
    }

    fn start_closed_captioning(&self) {
        self.state.set(ClosedCaptioningState::Started);
    }

    fn stop_closed_captioning(&self) {
        self.state.set(ClosedCaptioningState::Stopped);
    }
}

pub(crate) struct FakeParticipants {
    pub participants: StateChannel<Vec<Participant>>,
    pub active_speaker: StateChannel<Option<Participant>>,
}

impl ParticipantsService for FakeParticipants {
    fn participants(&self) -> EventStream<Vec<Participant>> {
        self.participants.subscribe()
    }

    fn active_speaker(&self) -> EventStream<Option<Participant>> {
        self.active_speaker.subscribe()
    }
}

pub(crate) struct FakeWaitingRoom {
    pub enabled: StateChannel<bool>,
    pub events: EventChannel<WaitingRoomParticipantEvent>,
    calls: Mutex<Vec<String>>,
}

impl FakeWaitingRoom {
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }
}

impl ModeratorWaitingRoomService for FakeWaitingRoom {
    fn is_waiting_room_enabled(&self) -> EventStream<bool> {
        self.enabled.subscribe()
    }

    fn waiting_room_participant_events(&self) -> EventStream<WaitingRoomParticipantEvent> {
        self.events.subscribe()
    }

    fn set_waiting_room_enabled(&self, enabled: bool) {
        self.record(format!("enabled:{enabled}"));
    }

    fn admit_participant(&self, participant: &Participant) {
        self.record(format!("admit:{}", participant.id));
    }

    fn deny_participant(&self, participant: &Participant) {
        self.record(format!("deny:{}", participant.id));
    }

    fn admit_all(&self) {
        self.record("admit_all".into());
    }

    fn deny_all(&self) {
        self.record("deny_all".into());
    }
}

pub(crate) struct FakeAudioDevices {
    pub list: StateChannel<Vec<AudioDevice>>,
    pub current: EventChannel<AudioDevice>,
    selected: Mutex<Vec<AudioDevice>>,
}

impl FakeAudioDevices {
    pub fn selected(&self) -> Vec<AudioDevice> {
        lock(&self.selected).clone()
    }
}

impl AudioDeviceService for FakeAudioDevices {
    fn audio_devices(&self) -> EventStream<Vec<AudioDevice>> {
        self.list.subscribe()
    }

    fn current_audio_device(&self) -> EventStream<AudioDevice> {
        self.current.subscribe()
    }

    fn select_audio_device(&self, device: &AudioDevice) {
        lock(&self.selected).push(device.clone());
    }
}

pub(crate) struct FakeVideoDevices {
    pub list: StateChannel<Vec<VideoDevice>>,
    pub current: EventChannel<VideoDevice>,
    selected: Mutex<Vec<VideoDevice>>,
    previews: Mutex<Vec<bool>>,
}

impl FakeVideoDevices {
    pub fn selected(&self) -> Vec<VideoDevice> {
        lock(&self.selected).clone()
    }

    pub fn previews(&self) -> Vec<bool> {
        lock(&self.previews).clone()
    }
}

impl VideoDeviceService for FakeVideoDevices {
    fn video_devices(&self) -> EventStream<Vec<VideoDevice>> {
        self.list.subscribe()
    }

    fn current_video_device(&self) -> EventStream<VideoDevice> {
        self.current.subscribe()
    }

    fn select_video_device(&self, device: &VideoDevice) {
        lock(&self.selected).push(device.clone());
    }

    fn enable_self_video_preview(&self, enabled: bool) {
        lock(&self.previews).push(enabled);
    }
}

pub(crate) struct FakePermissions {
    granted: Mutex<Vec<Permission>>,
    minimum: AtomicBool,
    response: Mutex<Result<PermissionStatus, ConclaveError>>,
    denied: Mutex<Vec<Permission>>,
    requests: Mutex<Vec<Vec<Permission>>>,
}

impl FakePermissions {
    pub fn revoke(&self, permission: Permission) {
        lock(&self.granted).retain(|p| *p != permission);
    }

    pub fn set_minimum(&self, granted: bool) {
        self.minimum.store(granted, Ordering::SeqCst);
    }

    pub fn set_response(&self, response: Result<PermissionStatus, ConclaveError>) {
        *lock(&self.response) = response;
    }

    pub fn set_denied(&self, denied: Vec<Permission>) {
        *lock(&self.denied) = denied;
    }

    pub fn requests(&self) -> Vec<Vec<Permission>> {
        lock(&self.requests).clone()
    }
}

impl PermissionService for FakePermissions {
    fn has_permission(&self, permission: Permission) -> bool {
        lock(&self.granted).contains(&permission)
    }

    fn has_minimum_permissions(&self) -> bool {
        self.minimum.load(Ordering::SeqCst)
    }

    fn request_permissions(&self, permissions: &[Permission]) -> SdkFuture<PermissionStatus> {
        lock(&self.requests).push(permissions.to_vec());
        let response = lock(&self.response).clone();
        async move { response }.boxed()
    }

    fn denied_permissions(&self) -> Vec<Permission> {
        lock(&self.denied).clone()
    }
}

pub(crate) struct FakeLogging {
    result: Mutex<Result<LogUploadResult, ConclaveError>>,
    uploads: Mutex<Vec<(String, String)>>,
}

impl FakeLogging {
    pub fn set_result(&self, result: Result<LogUploadResult, ConclaveError>) {
        *lock(&self.result) = result;
    }

    pub fn uploads(&self) -> Vec<(String, String)> {
        lock(&self.uploads).clone()
    }
}

impl LoggingService for FakeLogging {
    fn upload_log(&self, comments: String, user_name: String) -> SdkFuture<LogUploadResult> {
        lock(&self.uploads).push((comments, user_name));
        let result = lock(&self.result).clone();
        async move { result }.boxed()
    }
}

#[derive(Default)]
pub(crate) struct FakeForeground {
    starts: AtomicUsize,
    stops: AtomicUsize,
    messages: Mutex<Vec<String>>,
}

impl FakeForeground {
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn last_message(&self) -> Option<String> {
        lock(&self.messages).last().cloned()
    }
}

impl ForegroundService for FakeForeground {
    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn update_message(&self, message: &str) {
        lock(&self.messages).push(message.to_string());
    }
}

/// A full set of fakes. Everything is permitted and idle by default.
pub(crate) struct FakeSdk {
    pub meeting: Arc<FakeMeeting>,
    pub content_share: Arc<FakeContentShare>,
    pub closed_captioning: Arc<FakeClosedCaptioning>,
    pub participants: Arc<FakeParticipants>,
    pub waiting_room: Arc<FakeWaitingRoom>,
    pub audio_devices: Arc<FakeAudioDevices>,
    pub video_devices: Arc<FakeVideoDevices>,
    pub permissions: Arc<FakePermissions>,
    pub logging: Arc<FakeLogging>,
    pub foreground: Arc<FakeForeground>,
}

impl FakeSdk {
    pub fn new() -> Self {
        Self {
            meeting: Arc::new(FakeMeeting::new()),
            content_share: Arc::new(FakeContentShare {
                state: StateChannel::new(ContentShareState::Stopped),
                availability: StateChannel::new(ContentShareAvailability::Unavailable),
                events: EventChannel::new(),
                remote: StateChannel::new(false),
                starts: AtomicUsize::new(0),
                stops: AtomicUsize::new(0),
            }),
            closed_captioning: Arc::new(FakeClosedCaptioning {
                text: StateChannel::new(String::new()),
                state: StateChannel::new(ClosedCaptioningState::Stopped),
                available: AtomicBool::new(true),
            }),
            participants: Arc::new(FakeParticipants {
                participants: StateChannel::new(Vec::new()),
                active_speaker: StateChannel::new(None),
            }),
            waiting_room: Arc::new(FakeWaitingRoom {
                enabled: StateChannel::new(false),
                events: EventChannel::new(),
                calls: Mutex::new(Vec::new()),
            }),
            audio_devices: Arc::new(FakeAudioDevices {
                list: StateChannel::new(Vec::new()),
                current: EventChannel::new(),
                selected: Mutex::new(Vec::new()),
            }),
            video_devices: Arc::new(FakeVideoDevices {
                list: StateChannel::new(Vec::new()),
                current: EventChannel::new(),
                selected: Mutex::new(Vec::new()),
                previews: Mutex::new(Vec::new()),
            }),
            permissions: Arc::new(FakePermissions {
                granted: Mutex::new(vec![Permission::Camera, Permission::RecordAudio]),
                minimum: AtomicBool::new(true),
                response: Mutex::new(Ok(PermissionStatus::Granted)),
                denied: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
            }),
            logging: Arc::new(FakeLogging {
                result: Mutex::new(Ok(LogUploadResult::Success)),
                uploads: Mutex::new(Vec::new()),
            }),
            foreground: Arc::new(FakeForeground::default()),
        }
    }

    pub fn sdk(&self) -> Sdk {
        Sdk {
            meeting: self.meeting.clone(),
            content_share: self.content_share.clone(),
            closed_captioning: self.closed_captioning.clone(),
            participants: self.participants.clone(),
            waiting_room: self.waiting_room.clone(),
            audio_devices: self.audio_devices.clone(),
            video_devices: self.video_devices.clone(),
            permissions: self.permissions.clone(),
            logging: self.logging.clone(),
            foreground: self.foreground.clone(),
        }
    }
}

#[derive(Default)]
pub(crate) struct RecordingListener {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingListener {
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                SessionEvent::Notice(notice) => Some(notice.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count_notice(&self, notice: &Notice) -> usize {
        self.notices().iter().filter(|n| *n == notice).count()
    }

    pub fn last_ui(&self) -> Option<UiState> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            SessionEvent::UiChanged(ui) => Some(ui.clone()),
            _ => None,
        })
    }

    pub fn screen_capture_requests(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|event| matches!(event, SessionEvent::ScreenCaptureRequested))
            .count()
    }

    pub fn dialog_requests(&self) -> usize {
        lock(&self.events)
            .iter()
            .filter(|event| matches!(event, SessionEvent::WaitingRoomDialogRequested(_)))
            .count()
    }
}

impl SessionEventListener for RecordingListener {
    fn on_event(&self, event: SessionEvent) {
        lock(&self.events).push(event);
    }
}

/// Let spawned forwarding tasks run, then handle whatever they queued.
pub(crate) async fn settle(coordinator: &mut SessionCoordinator) {
    for _ in 0..4 {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
        coordinator.drain();
    }
}
