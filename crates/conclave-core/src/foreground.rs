use std::sync::Arc;

use crate::sdk::{ContentShareState, ForegroundService, MeetingService, MeetingState};

pub const MEETING_NOTIFICATION_MESSAGE: &str = "Meeting in progress";
pub const SCREEN_SHARE_NOTIFICATION_MESSAGE: &str = "Screen share in progress";

/// Foreground meeting indicator.
///
/// Start and stop are idempotent: the OS service is only signalled on an
/// actual change.
pub struct MeetingIndicator {
    service: Arc<dyn ForegroundService>,
    running: bool,
}

impl MeetingIndicator {
    pub fn new(service: Arc<dyn ForegroundService>) -> Self {
        Self {
            service,
            running: false,
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        tracing::info!("starting foreground meeting service");
        self.service.start();
        self.running = true;
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        tracing::info!("stopping foreground meeting service");
        self.service.stop();
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reflect content share in the notification text.
    pub fn follow_content_share(&self, state: ContentShareState) {
        let message = match state {
            ContentShareState::Stopped => MEETING_NOTIFICATION_MESSAGE,
            ContentShareState::Started => SCREEN_SHARE_NOTIFICATION_MESSAGE,
        };
        self.service.update_message(message);
    }
}

/// The app task was swiped away while the service kept running.
///
/// Ends a connected meeting so it does not keep running headless, then stops
/// the service whatever the state. Returns whether the meeting was ended.
pub fn on_task_removed(meeting: &dyn MeetingService, indicator: &mut MeetingIndicator) -> bool {
    let ended = meeting.meeting_state() == MeetingState::Connected;
    if ended {
        tracing::info!("leaving meeting on task removal");
        meeting.end_meeting();
    }
    indicator.stop();
    ended
}
