//! Derived UI state.
//!
//! Nothing here is stored by the coordinator. [`UiState::derive`] is a pure
//! function of the meeting state and the per-session flags, recomputed after
//! every input and pushed to listeners when it changes.

use crate::devices::DeviceMenu;
use crate::in_meeting::InMeetingPanel;
use crate::sdk::MeetingState;

pub const CONNECTING_MESSAGE: &str = "Connecting...";

/// Per-session booleans the view depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    pub call_in_progress: bool,
    pub joining: bool,
    pub in_waiting_room: bool,
    pub reconnecting: bool,
    pub audio_muted: bool,
    pub video_muted: bool,
    pub content_share_available: bool,
    pub content_sharing: bool,
    pub self_view_attached: bool,
    pub is_moderator: bool,
    pub closed_captions_available: bool,
    /// Set on the first Connected, cleared on Idle.
    pub secure_window: bool,
}

/// Everything [`UiState::derive`] reads.
pub struct ViewInputs<'a> {
    pub state: MeetingState,
    pub flags: &'a SessionFlags,
    pub panel: &'a InMeetingPanel,
    pub menu: &'a DeviceMenu,
    pub caption_text: &'a str,
    pub meeting_title: Option<&'a str>,
    pub app_version: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuState {
    pub layout_label: String,
    pub audio_device_label: Option<String>,
    pub video_device_label: Option<String>,
    pub closed_captions_available: bool,
    pub closed_captions_on: bool,
    /// Waiting-room controls are offered to moderators only.
    pub waiting_room_controls_visible: bool,
    pub waiting_room_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub meeting_state: MeetingState,
    pub join_form_visible: bool,
    pub waiting_room_visible: bool,
    /// Shown in the waiting-room panel.
    pub meeting_title: Option<String>,
    /// Close and menu buttons.
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
    /// Block screenshots and third-party casting of the window.
    pub secure_window: bool,
    pub menu: MenuState,
}

impl UiState {
    pub fn derive(inputs: &ViewInputs<'_>) -> Self {
        let state = inputs.state;
        let flags = inputs.flags;

        let in_call = flags.joining || state.accepts_meeting_calls();
        let panel_visible =
            flags.call_in_progress && matches!(state, MeetingState::Connected | MeetingState::Reconnecting);
        let connecting = state == MeetingState::Connecting
            || (flags.joining && state == MeetingState::Idle);
        let captions_visible = panel_visible && inputs.menu.closed_captions_on;
        let waiting_room_visible = flags.in_waiting_room && !in_call;

        Self {
            meeting_state: state,
            join_form_visible: !in_call && !flags.in_waiting_room,
            waiting_room_visible,
            meeting_title: inputs.meeting_title.filter(|_| waiting_room_visible).map(str::to_string),
            meeting_controls_visible: in_call,
            in_meeting_panel_visible: panel_visible,
            panel_message: panel_visible
                .then(|| inputs.panel.status_message())
                .flatten()
                .map(str::to_string),
            roster_button_visible: state.accepts_meeting_calls(),
            screen_share_button_visible: panel_visible && flags.content_share_available,
            screen_share_selected: flags.content_sharing,
            progress_message: connecting.then(|| CONNECTING_MESSAGE.to_string()),
            closed_caption_visible: captions_visible,
            closed_caption_text: (captions_visible && !inputs.caption_text.is_empty())
                .then(|| inputs.caption_text.to_string()),
            audio_muted: flags.audio_muted,
            video_muted: flags.video_muted,
            camera_settings_visible: !flags.video_muted,
            self_view_visible: flags.self_view_attached,
            upload_logs_visible: !in_call,
            app_version: (!in_call).then(|| inputs.app_version.to_string()),
            secure_window: flags.secure_window,
            menu: MenuState {
                layout_label: inputs.menu.layout_label().to_string(),
                audio_device_label: inputs.menu.audio_label().map(str::to_string),
                video_device_label: inputs.menu.video_label().map(str::to_string),
                closed_captions_available: flags.closed_captions_available,
                closed_captions_on: inputs.menu.closed_captions_on,
                waiting_room_controls_visible: flags.is_moderator && panel_visible,
                waiting_room_enabled: inputs.menu.waiting_room_enabled,
            },
        }
    }
}
