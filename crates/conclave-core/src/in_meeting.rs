use crate::sdk::VideoState;

/// Page shown by the in-meeting pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeetingPage {
    #[default]
    RemoteVideo,
    RemoteContent,
}

/// Remote video / remote content panel shown while a call is in progress.
///
/// Tracks the last video state and remote content availability, and
/// resolves the status line for the selected page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMeetingPanel {
    page: MeetingPage,
    video_state: Option<VideoState>,
    remote_content_available: bool,
}

impl InMeetingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_page(&mut self, page: MeetingPage) {
        self.page = page;
    }

    pub fn page(&self) -> MeetingPage {
        self.page
    }

    pub fn set_video_state(&mut self, state: VideoState) {
        self.video_state = Some(state);
    }

    pub fn set_remote_content_available(&mut self, available: bool) {
        self.remote_content_available = available;
    }

    pub fn remote_content_available(&self) -> bool {
        self.remote_content_available
    }

    /// Status line for the selected page, `None` when media is flowing.
    pub fn status_message(&self) -> Option<&'static str> {
        match self.page {
            MeetingPage::RemoteVideo => match self.video_state {
                Some(VideoState::SingleParticipant) => {
                    Some("You are the only participant. Please wait some one to join.")
                }
                Some(VideoState::NoOneHasVideo) => Some("No one is sharing their video"),
                Some(VideoState::NeedsModerator) => Some("Need moderator"),
                Some(VideoState::Active) | Some(VideoState::Inactive) | None => None,
            },
            MeetingPage::RemoteContent if self.remote_content_available => None,
            MeetingPage::RemoteContent => Some("No one is sharing the remote content."),
        }
    }

    /// Forget everything learned during the call. The page resets to video.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
