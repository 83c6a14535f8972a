//! Meeting session coordinator.
//!
//! Owns the client-side view of the meeting lifecycle. Every input (SDK
//! stream values, completions of asynchronous SDK calls, user actions) goes
//! through one mailbox and is handled on the coordinator's own task, so state
//! is only ever touched from one place.
//!
//! State transitions drive four kinds of side effects:
//! - derived [`UiState`] pushed to listeners,
//! - the foreground meeting indicator,
//! - activation and teardown of the in-meeting subscription group,
//! - one-shot notices (reconnecting / reconnected, waiting room, ...).

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::devices::DeviceMenu;
use crate::errors::ConclaveError;
use crate::events::{EventEmitter, Notice, SessionEvent, SessionEventListener};
use crate::foreground::{self, MeetingIndicator};
use crate::in_meeting::{InMeetingPanel, MeetingPage};
use crate::participants::Roster;
use crate::sdk::{
    AudioDevice, ClosedCaptioningState, ContentShareAvailability, ContentShareEvent,
    ContentShareState, EventStream, JoinParams, JoinResult, LogUploadResult, MeetingState,
    Participant, Permission, PermissionStatus, Sdk, VideoDevice, VideoLayout, VideoState,
    WaitingRoomEvent, WaitingRoomParticipantEvent,
};
use crate::settings::SettingsStore;
use crate::subscriptions::{Subscription, SubscriptionLifetime};
use crate::view::{SessionFlags, UiState, ViewInputs};

/// Process-level constants.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub app_version: String,
    /// Display name used when the join form leaves it empty.
    pub default_join_name: String,
    /// User name attached to log uploads when no display name is known.
    pub default_log_user: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_version: format!("v{}", env!("CARGO_PKG_VERSION")),
            default_join_name: "AndroidSDK".to_string(),
            default_log_user: "Guest".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub meeting_id: String,
    pub passcode: String,
    pub display_name: String,
}

/// Everything the user can do from the native UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    /// The screen came back to the foreground.
    Resume,
    Join(JoinRequest),
    Leave,
    ExitWaitingRoom,
    ToggleMicrophone,
    ToggleCamera,
    ToggleScreenShare,
    ScreenCaptureResult { granted: bool },
    SelectPage(MeetingPage),
    SelectVideoLayout(VideoLayout),
    SelectAudioDevice(usize),
    SelectVideoDevice(usize),
    SetClosedCaptions(bool),
    ShowWaitingRoom,
    SetWaitingRoomEnabled(bool),
    Admit(String),
    Deny(String),
    AdmitAll,
    DenyAll,
    UploadLogs(String),
    /// The app task was swiped away from the recents screen.
    TaskRemoved,
    Destroy,
}

/// A value delivered by one of the SDK streams.
#[derive(Debug, Clone)]
pub(crate) enum SdkUpdate {
    MeetingState(MeetingState),
    WaitingRoomEvent(WaitingRoomEvent),
    AudioDevices(Vec<AudioDevice>),
    CurrentAudioDevice(AudioDevice),
    VideoDevices(Vec<VideoDevice>),
    CurrentVideoDevice(VideoDevice),
    AudioMuted(bool),
    VideoMuted(bool),
    VideoState(VideoState),
    VideoLayout(VideoLayout),
    Participants(Vec<Participant>),
    ActiveSpeaker(Option<Participant>),
    ContentShareState(ContentShareState),
    ContentShareAvailability(ContentShareAvailability),
    ContentShareEvent(ContentShareEvent),
    RemoteContent(bool),
    ClosedCaptionText(String),
    ClosedCaptioningState(ClosedCaptioningState),
    WaitingRoomEnabled(bool),
    WaitingRoomParticipants(WaitingRoomParticipantEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Session,
    Meeting(u64),
}

#[derive(Debug, Clone)]
pub(crate) enum PermissionPurpose {
    SelfView,
    Join(JoinParams),
}

#[derive(Debug)]
pub(crate) enum Input {
    Action(UserAction),
    Update { scope: Scope, update: SdkUpdate },
    PermissionResult {
        purpose: PermissionPurpose,
        result: Result<PermissionStatus, ConclaveError>,
    },
    JoinResult(Result<JoinResult, ConclaveError>),
    LogUploadResult(Result<LogUploadResult, ConclaveError>),
}

/// Cloneable handle for posting user actions to a running coordinator.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Input>,
}

impl SessionHandle {
    pub fn send(&self, action: UserAction) -> Result<(), ConclaveError> {
        self.tx
            .send(Input::Action(action))
            .map_err(|_| ConclaveError::Host("session closed".into()))
    }
}

pub struct SessionCoordinator {
    id: Uuid,
    sdk: Sdk,
    config: SessionConfig,
    settings: Arc<SettingsStore>,
    emitter: EventEmitter,
    lifetime: SubscriptionLifetime,
    indicator: MeetingIndicator,
    tx: mpsc::UnboundedSender<Input>,
    rx: mpsc::UnboundedReceiver<Input>,
    state: MeetingState,
    flags: SessionFlags,
    // Last user choice, applied on Connecting. `flags` holds what the SDK reports.
    audio_muted: bool,
    video_muted: bool,
    screen_share_in_progress: bool,
    panel: InMeetingPanel,
    roster: Roster,
    menu: DeviceMenu,
    caption_text: String,
    meeting_title: Option<String>,
    last_ui: Option<UiState>,
    destroyed: bool,
}

impl SessionCoordinator {
    pub fn new(sdk: Sdk, settings: Arc<SettingsStore>, config: SessionConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let saved = settings.get();
        let indicator = MeetingIndicator::new(sdk.foreground.clone());
        let flags = SessionFlags {
            audio_muted: saved.audio_muted_on_join,
            video_muted: saved.video_muted_on_join,
            ..SessionFlags::default()
        };
        Self {
            id: Uuid::new_v4(),
            sdk,
            config,
            settings,
            emitter: EventEmitter::new(),
            lifetime: SubscriptionLifetime::new(),
            indicator,
            tx,
            rx,
            state: MeetingState::Idle,
            flags,
            audio_muted: saved.audio_muted_on_join,
            video_muted: saved.video_muted_on_join,
            screen_share_in_progress: false,
            panel: InMeetingPanel::new(),
            roster: Roster::new(),
            menu: DeviceMenu::new(),
            caption_text: String::new(),
            meeting_title: None,
            last_ui: None,
            destroyed: false,
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionEventListener>) {
        self.emitter.add_listener(listener);
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle { tx: self.tx.clone() }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Subscribe to the session-scoped streams and bring up the self view.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        tracing::info!(session = %self.id, "starting meeting session");
        let meeting = self.sdk.meeting.clone();
        let audio = self.sdk.audio_devices.clone();
        let video = self.sdk.video_devices.clone();

        let subscriptions = [
            self.forward("meeting_state", Scope::Session, meeting.meeting_state_stream(), SdkUpdate::MeetingState),
            self.forward("waiting_room_events", Scope::Session, meeting.waiting_room_events(), SdkUpdate::WaitingRoomEvent),
            self.forward("audio_devices", Scope::Session, audio.audio_devices(), SdkUpdate::AudioDevices),
            self.forward("current_audio_device", Scope::Session, audio.current_audio_device(), SdkUpdate::CurrentAudioDevice),
            self.forward("video_devices", Scope::Session, video.video_devices(), SdkUpdate::VideoDevices),
            self.forward("current_video_device", Scope::Session, video.current_video_device(), SdkUpdate::CurrentVideoDevice),
        ];
        for subscription in subscriptions {
            self.lifetime.add_session(subscription);
        }

        self.check_camera_permission_and_start_self_video();
        self.render();
    }

    /// Process inputs until the session is destroyed.
    pub async fn run(mut self) {
        while !self.destroyed {
            match self.rx.recv().await {
                Some(input) => self.process(input),
                None => break,
            }
        }
        self.destroy();
        tracing::info!(session = %self.id, "session coordinator stopped");
    }

    /// Process every input already queued. Returns how many were handled.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(input) = self.rx.try_recv() {
            self.process(input);
            handled += 1;
        }
        handled
    }

    pub fn handle_meeting_state(&mut self, state: MeetingState) {
        self.process(Input::Update {
            scope: Scope::Session,
            update: SdkUpdate::MeetingState(state),
        });
    }

    pub fn handle_action(&mut self, action: UserAction) {
        self.process(Input::Action(action));
    }

    /// Release every subscription. The coordinator ignores input afterwards.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        tracing::info!(session = %self.id, "destroying meeting session");
        self.lifetime.release_all();
        self.flags.call_in_progress = false;
        self.destroyed = true;
    }

    pub fn meeting_state(&self) -> MeetingState {
        self.state
    }

    pub fn is_call_in_progress(&self) -> bool {
        self.flags.call_in_progress
    }

    pub fn is_reconnecting(&self) -> bool {
        self.flags.reconnecting
    }

    pub fn is_in_waiting_room(&self) -> bool {
        self.flags.in_waiting_room
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn subscriptions(&self) -> &SubscriptionLifetime {
        &self.lifetime
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn menu(&self) -> &DeviceMenu {
        &self.menu
    }

    pub fn ui_state(&self) -> UiState {
        UiState::derive(&ViewInputs {
            state: self.state,
            flags: &self.flags,
            panel: &self.panel,
            menu: &self.menu,
            caption_text: &self.caption_text,
            meeting_title: self.meeting_title.as_deref(),
            app_version: &self.config.app_version,
        })
    }

    pub(crate) fn process(&mut self, input: Input) {
        if self.destroyed {
            tracing::debug!(session = %self.id, "input after destroy ignored");
            return;
        }
        match input {
            Input::Action(action) => self.on_action(action),
            Input::Update { scope, update } => {
                if let Scope::Meeting(epoch) = scope {
                    if self.lifetime.active_epoch() != Some(epoch) {
                        tracing::debug!(epoch, "dropping update from torn-down meeting scope");
                        return;
                    }
                }
                self.on_update(update);
            }
            Input::PermissionResult { purpose, result } => self.on_permission_result(purpose, result),
            Input::JoinResult(result) => self.on_join_result(result),
            Input::LogUploadResult(result) => self.on_log_upload_result(result),
        }
        self.render();
    }

    // ── Meeting lifecycle ─────────────────────────────────────────────

    fn on_meeting_state(&mut self, state: MeetingState) {
        tracing::info!(session = %self.id, "meeting state: {state:?}");
        self.state = state;
        match state {
            MeetingState::Connecting => {
                self.sdk.meeting.set_audio_muted(self.audio_muted);
                self.sdk.meeting.set_video_muted(self.video_muted);
                self.sdk.video_devices.enable_self_video_preview(false);
                self.flags.joining = false;
                self.flags.in_waiting_room = false;
            }
            MeetingState::Connected => {
                // Stays on until Idle, through reconnects and the waiting room.
                self.flags.secure_window = true;
                self.flags.joining = false;
                self.flags.in_waiting_room = false;
                if !self.flags.call_in_progress {
                    self.indicator.start();
                    self.activate_in_meeting_subscriptions();
                }
                if self.flags.reconnecting {
                    self.flags.reconnecting = false;
                    self.notify(Notice::Reconnected);
                }
            }
            MeetingState::Reconnecting => {
                self.flags.reconnecting = true;
                self.notify(Notice::Reconnecting);
            }
            MeetingState::WaitingRoom => {
                tracing::info!("moving to waiting room");
                self.flags.joining = false;
                self.flags.in_waiting_room = true;
                self.lifetime.teardown();
                self.flags.call_in_progress = false;
                self.reset_meeting_view();
                self.meeting_title = self.sdk.meeting.meeting_title();
            }
            MeetingState::Idle => {
                self.end_meeting_locally();
                self.flags.in_waiting_room = false;
                self.flags.secure_window = false;
            }
        }
    }

    fn activate_in_meeting_subscriptions(&mut self) {
        let epoch = match self.lifetime.activate() {
            Ok(epoch) => epoch,
            Err(e) => {
                tracing::warn!("in-meeting subscriptions not activated: {e}");
                return;
            }
        };
        let scope = Scope::Meeting(epoch);
        let meeting = self.sdk.meeting.clone();
        let content = self.sdk.content_share.clone();
        let captions = self.sdk.closed_captioning.clone();
        let participants = self.sdk.participants.clone();

        let mut subscriptions = vec![
            self.forward("video_muted", scope, meeting.video_muted(), SdkUpdate::VideoMuted),
            self.forward("audio_muted", scope, meeting.audio_muted(), SdkUpdate::AudioMuted),
            self.forward("video_state", scope, meeting.video_state(), SdkUpdate::VideoState),
            self.forward("video_layout", scope, meeting.video_layout(), SdkUpdate::VideoLayout),
            self.forward("participants", scope, participants.participants(), SdkUpdate::Participants),
            self.forward("active_speaker", scope, participants.active_speaker(), SdkUpdate::ActiveSpeaker),
            self.forward("content_share_state", scope, content.content_share_state(), SdkUpdate::ContentShareState),
            self.forward(
                "content_share_availability",
                scope,
                content.content_share_availability(),
                SdkUpdate::ContentShareAvailability,
            ),
            self.forward("content_share_events", scope, content.content_share_events(), SdkUpdate::ContentShareEvent),
            self.forward("remote_content", scope, content.receiving_remote_content(), SdkUpdate::RemoteContent),
            self.forward("closed_caption_text", scope, captions.closed_caption_text(), SdkUpdate::ClosedCaptionText),
            self.forward(
                "closed_captioning_state",
                scope,
                captions.closed_captioning_state(),
                SdkUpdate::ClosedCaptioningState,
            ),
        ];

        self.flags.is_moderator = meeting.is_moderator();
        self.flags.closed_captions_available = captions.is_available();
        if self.flags.is_moderator {
            let waiting_room = self.sdk.waiting_room.clone();
            subscriptions.push(self.forward(
                "waiting_room_enabled",
                scope,
                waiting_room.is_waiting_room_enabled(),
                SdkUpdate::WaitingRoomEnabled,
            ));
            subscriptions.push(self.forward(
                "waiting_room_participants",
                scope,
                waiting_room.waiting_room_participant_events(),
                SdkUpdate::WaitingRoomParticipants,
            ));
        }

        for subscription in subscriptions {
            self.lifetime.add_meeting(subscription);
        }
        self.flags.call_in_progress = true;
    }

    /// Local side of ending a meeting, shared by Idle, leave and exit.
    fn end_meeting_locally(&mut self) {
        tracing::info!(session = %self.id, "ending meeting");
        self.flags.reconnecting = false;
        self.flags.in_waiting_room = false;
        self.flags.joining = false;
        self.flags.call_in_progress = false;
        self.indicator.stop();
        self.lifetime.teardown();
        self.lifetime.clear_pending_join();
        self.reset_meeting_view();
        self.meeting_title = None;
    }

    fn reset_meeting_view(&mut self) {
        self.panel.reset();
        self.roster.clear();
        self.menu.reset_meeting_options();
        self.caption_text.clear();
        self.flags.is_moderator = false;
        self.flags.content_share_available = false;
        self.flags.content_sharing = false;
        self.screen_share_in_progress = false;
    }

    // ── User actions ──────────────────────────────────────────────────

    fn on_action(&mut self, action: UserAction) {
        tracing::debug!(session = %self.id, "user action: {action:?}");
        match action {
            UserAction::Resume => {
                if !self.screen_share_in_progress {
                    let state = self.sdk.meeting.meeting_state();
                    self.on_meeting_state(state);
                }
            }
            UserAction::Join(request) => self.on_join_requested(request),
            UserAction::Leave => {
                self.sdk.meeting.end_meeting();
                self.sdk.video_devices.enable_self_video_preview(!self.video_muted);
                self.end_meeting_locally();
            }
            UserAction::ExitWaitingRoom => {
                self.sdk.meeting.end_meeting();
                self.end_meeting_locally();
            }
            UserAction::ToggleMicrophone => {
                self.audio_muted = !self.audio_muted;
                self.sdk.meeting.set_audio_muted(self.audio_muted);
                self.flags.audio_muted = self.audio_muted;
                self.settings.set_audio_muted_on_join(self.audio_muted);
            }
            UserAction::ToggleCamera => {
                self.video_muted = !self.video_muted;
                if self.sdk.meeting.meeting_state().accepts_meeting_calls() {
                    self.sdk.meeting.set_video_muted(self.video_muted);
                } else {
                    self.sdk.video_devices.enable_self_video_preview(!self.video_muted);
                }
                self.flags.video_muted = self.video_muted;
                self.settings.set_video_muted_on_join(self.video_muted);
            }
            UserAction::ToggleScreenShare => {
                if self.sdk.content_share.content_share_state_value() == ContentShareState::Stopped {
                    self.screen_share_in_progress = true;
                    self.emitter.emit(SessionEvent::ScreenCaptureRequested);
                } else {
                    self.screen_share_in_progress = false;
                    self.sdk.content_share.stop_content_share();
                }
            }
            UserAction::ScreenCaptureResult { granted } => {
                if granted {
                    self.sdk.content_share.start_content_share();
                } else {
                    tracing::info!("screen capture declined");
                    self.screen_share_in_progress = false;
                }
            }
            UserAction::SelectPage(page) => self.panel.select_page(page),
            UserAction::SelectVideoLayout(layout) => {
                self.menu.layouts.set_current(layout);
                self.sdk.meeting.set_video_layout(layout);
            }
            UserAction::SelectAudioDevice(position) => match self.menu.audio.select(position) {
                Some(device) => self.sdk.audio_devices.select_audio_device(&device),
                None => tracing::warn!(position, "no audio device at position"),
            },
            UserAction::SelectVideoDevice(position) => match self.menu.video.select(position) {
                Some(device) => self.sdk.video_devices.select_video_device(&device),
                None => tracing::warn!(position, "no video device at position"),
            },
            UserAction::SetClosedCaptions(enabled) => {
                if enabled {
                    self.sdk.closed_captioning.start_closed_captioning();
                } else {
                    self.sdk.closed_captioning.stop_closed_captioning();
                }
                self.menu.closed_captions_on = enabled;
            }
            UserAction::ShowWaitingRoom => {
                if self.roster.waiting().is_empty() {
                    self.notify(Notice::NoWaitingRoomParticipants);
                } else {
                    self.emitter.emit(SessionEvent::WaitingRoomDialogRequested(
                        self.roster.waiting().to_vec(),
                    ));
                }
            }
            UserAction::SetWaitingRoomEnabled(enabled) => {
                self.sdk.waiting_room.set_waiting_room_enabled(enabled);
            }
            UserAction::Admit(id) => match self.roster.find_waiting(&id) {
                Some(participant) => self.sdk.waiting_room.admit_participant(participant),
                None => tracing::warn!(participant = %id, "admit: not in waiting room"),
            },
            UserAction::Deny(id) => match self.roster.find_waiting(&id) {
                Some(participant) => self.sdk.waiting_room.deny_participant(participant),
                None => tracing::warn!(participant = %id, "deny: not in waiting room"),
            },
            UserAction::AdmitAll => self.sdk.waiting_room.admit_all(),
            UserAction::DenyAll => self.sdk.waiting_room.deny_all(),
            UserAction::UploadLogs(comments) => self.upload_logs(comments),
            UserAction::TaskRemoved => {
                let ended = foreground::on_task_removed(self.sdk.meeting.as_ref(), &mut self.indicator);
                tracing::info!(session = %self.id, ended, "app task removed");
                self.end_meeting_locally();
            }
            UserAction::Destroy => self.destroy(),
        }
    }

    fn on_join_requested(&mut self, request: JoinRequest) {
        if self.sdk.meeting.meeting_state() != MeetingState::Idle {
            self.notify(Notice::MeetingInProgress);
            return;
        }
        let display_name = request.display_name.trim();
        let display_name = if display_name.is_empty() {
            self.config.default_join_name.clone()
        } else {
            self.settings.set_display_name(Some(display_name.to_string()));
            display_name.to_string()
        };
        let params = JoinParams {
            meeting_id: request.meeting_id,
            passcode: request.passcode,
            display_name,
        };

        if self.sdk.permissions.has_minimum_permissions() {
            self.join_meeting(params);
        } else {
            self.request_permissions(&[Permission::RecordAudio], PermissionPurpose::Join(params));
        }
    }

    fn join_meeting(&mut self, params: JoinParams) {
        tracing::info!(session = %self.id, meeting_id = %params.meeting_id, "joining meeting");
        self.flags.joining = true;
        let join = self.sdk.meeting.join_meeting(params);
        let tx = self.tx.clone();
        self.lifetime.set_pending_join(Subscription::spawn("join", async move {
            let _ = tx.send(Input::JoinResult(join.await));
        }));
    }

    fn on_join_result(&mut self, result: Result<JoinResult, ConclaveError>) {
        self.lifetime.clear_pending_join();
        match result {
            Ok(JoinResult::Success) => tracing::info!("join succeeded"),
            Ok(JoinResult::Rejected(reason)) => {
                tracing::info!("join result: {reason}");
                self.flags.joining = false;
            }
            Err(e) => {
                tracing::warn!("join failed: {e}");
                self.flags.joining = false;
            }
        }
    }

    fn upload_logs(&mut self, comments: String) {
        if comments.trim().is_empty() {
            self.notify(Notice::EnterComments);
            return;
        }
        let user_name = self
            .settings
            .get()
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.config.default_log_user.clone());
        let upload = self.sdk.logging.upload_log(comments, user_name);
        let tx = self.tx.clone();
        self.lifetime.add_session(Subscription::spawn("log_upload", async move {
            let _ = tx.send(Input::LogUploadResult(upload.await));
        }));
    }

    fn on_log_upload_result(&mut self, result: Result<LogUploadResult, ConclaveError>) {
        match result {
            Ok(LogUploadResult::Success) => {
                tracing::info!("log uploaded successfully");
                self.notify(Notice::LogUploadSucceeded);
            }
            Ok(LogUploadResult::Failed) => {
                tracing::warn!("log upload rejected");
                self.notify(Notice::LogUploadFailed);
            }
            Err(e) => {
                tracing::error!("error while uploading logs: {e}");
                self.notify(Notice::LogUploadFailed);
            }
        }
    }

    // ── Permissions ───────────────────────────────────────────────────

    fn check_camera_permission_and_start_self_video(&mut self) {
        if self.sdk.permissions.has_permission(Permission::Camera) {
            self.start_self_video();
        } else {
            self.request_permissions(&[Permission::Camera], PermissionPurpose::SelfView);
        }
    }

    fn start_self_video(&mut self) {
        self.flags.self_view_attached = true;
        self.sdk.video_devices.enable_self_video_preview(!self.video_muted);
    }

    fn request_permissions(&mut self, permissions: &[Permission], purpose: PermissionPurpose) {
        let request = self.sdk.permissions.request_permissions(permissions);
        let tx = self.tx.clone();
        self.lifetime.add_session(Subscription::spawn("permission_request", async move {
            let result = request.await;
            let _ = tx.send(Input::PermissionResult { purpose, result });
        }));
    }

    fn on_permission_result(
        &mut self,
        purpose: PermissionPurpose,
        result: Result<PermissionStatus, ConclaveError>,
    ) {
        match result {
            Ok(PermissionStatus::Granted) => match purpose {
                PermissionPurpose::SelfView => self.start_self_video(),
                PermissionPurpose::Join(params) => {
                    if self.sdk.meeting.meeting_state() == MeetingState::Idle {
                        self.join_meeting(params);
                    } else {
                        self.notify(Notice::MeetingInProgress);
                    }
                }
            },
            Ok(PermissionStatus::NotGranted) => {
                let denied = self.sdk.permissions.denied_permissions();
                tracing::info!(?purpose, "permissions not granted: {denied:?}");
                if !denied.is_empty() {
                    self.notify(Notice::PermissionsDenied(denied));
                }
            }
            Ok(PermissionStatus::NotRegistered) => {
                tracing::info!("permission service not registered");
                self.notify(Notice::PermissionServiceNotRegistered);
            }
            Err(e) => tracing::error!(?purpose, "error in requesting permissions: {e}"),
        }
    }

    // ── SDK stream values ─────────────────────────────────────────────

    fn on_update(&mut self, update: SdkUpdate) {
        match update {
            SdkUpdate::MeetingState(state) => self.on_meeting_state(state),
            SdkUpdate::WaitingRoomEvent(event) => match event {
                WaitingRoomEvent::Admitted => self.notify(Notice::ModeratorApproved),
                WaitingRoomEvent::Denied => self.notify(Notice::DeniedByModerator),
                WaitingRoomEvent::Demoted => {
                    self.notify(Notice::DemotedByModerator);
                    self.sdk.video_devices.enable_self_video_preview(!self.video_muted);
                }
            },
            SdkUpdate::AudioDevices(devices) => self.menu.audio.set_items(devices),
            SdkUpdate::CurrentAudioDevice(device) => self.menu.audio.set_current(device),
            SdkUpdate::VideoDevices(devices) => self.menu.video.set_items(devices),
            SdkUpdate::CurrentVideoDevice(device) => self.menu.video.set_current(device),
            // Local or remote mute; only the icons follow it.
            SdkUpdate::AudioMuted(muted) => {
                tracing::info!("audio mute state {muted}");
                self.flags.audio_muted = muted;
            }
            SdkUpdate::VideoMuted(muted) => {
                tracing::info!("video mute state {muted}");
                self.flags.video_muted = muted;
            }
            SdkUpdate::VideoState(state) => self.panel.set_video_state(state),
            SdkUpdate::VideoLayout(layout) => self.menu.layouts.set_current(layout),
            SdkUpdate::Participants(participants) => self.roster.set_participants(participants),
            SdkUpdate::ActiveSpeaker(speaker) => {
                match &speaker {
                    Some(p) => tracing::info!("{} is the active speaker", p.name),
                    None => tracing::warn!("active speaker information is missing"),
                }
                self.roster.set_active_speaker(speaker);
            }
            SdkUpdate::ContentShareState(state) => {
                self.flags.content_sharing = state == ContentShareState::Started;
                self.indicator.follow_content_share(state);
            }
            SdkUpdate::ContentShareAvailability(availability) => {
                self.flags.content_share_available =
                    availability == ContentShareAvailability::Available;
            }
            SdkUpdate::ContentShareEvent(event) => {
                tracing::info!("content share event is {event:?}");
            }
            SdkUpdate::RemoteContent(available) => self.panel.set_remote_content_available(available),
            SdkUpdate::ClosedCaptionText(text) => self.caption_text = text,
            SdkUpdate::ClosedCaptioningState(state) => {
                self.menu.closed_captions_on = state == ClosedCaptioningState::Started;
            }
            SdkUpdate::WaitingRoomEnabled(enabled) => self.menu.waiting_room_enabled = enabled,
            SdkUpdate::WaitingRoomParticipants(event) => {
                if let Some(notice) = self.roster.apply_waiting_room_event(event) {
                    tracing::info!("waiting room: {notice}");
                    self.notify(notice);
                }
            }
        }
    }

    // ── Plumbing ──────────────────────────────────────────────────────

    /// Forward a stream into the mailbox. Stream errors are logged and the
    /// stream stays subscribed.
    fn forward<T, F>(&self, name: &'static str, scope: Scope, stream: EventStream<T>, wrap: F) -> Subscription
    where
        T: Send + 'static,
        F: Fn(T) -> SdkUpdate + Send + 'static,
    {
        let tx = self.tx.clone();
        Subscription::spawn(name, async move {
            let mut stream = stream;
            while let Some(item) = stream.next().await {
                match item {
                    Ok(value) => {
                        let input = Input::Update {
                            scope,
                            update: wrap(value),
                        };
                        if tx.send(input).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!(stream = name, "error in {name} subscription: {e}"),
                }
            }
            tracing::debug!(stream = name, "stream ended");
        })
    }

    fn notify(&self, notice: Notice) {
        self.emitter.emit(SessionEvent::Notice(notice));
    }

    fn render(&mut self) {
        let ui = self.ui_state();
        if self.last_ui.as_ref() != Some(&ui) {
            self.last_ui = Some(ui.clone());
            self.emitter.emit(SessionEvent::UiChanged(ui));
        }
    }
}
