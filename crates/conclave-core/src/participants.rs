use crate::events::Notice;
use crate::sdk::{Participant, WaitingRoomParticipantEvent};

/// Meeting roster and, for moderators, the waiting-room queue.
///
/// Updated by the coordinator from the in-meeting streams. Read by the
/// native roster list and waiting-room dialog.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<Participant>,
    active_speaker: Option<Participant>,
    waiting: Vec<Participant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_participants(&mut self, participants: Vec<Participant>) {
        self.participants = participants;
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn set_active_speaker(&mut self, speaker: Option<Participant>) {
        self.active_speaker = speaker;
    }

    pub fn active_speaker(&self) -> Option<&Participant> {
        self.active_speaker.as_ref()
    }

    pub fn waiting(&self) -> &[Participant] {
        &self.waiting
    }

    pub fn find_waiting(&self, id: &str) -> Option<&Participant> {
        self.waiting.iter().find(|p| p.id == id)
    }

    /// Apply a waiting-room change and return the notice to show, if any.
    pub fn apply_waiting_room_event(&mut self, event: WaitingRoomParticipantEvent) -> Option<Notice> {
        match event {
            WaitingRoomParticipantEvent::Added(added) => {
                let notice = match added.as_slice() {
                    [] => None,
                    [one] => Some(Notice::ParticipantArrived(one.name.clone())),
                    _ => Some(Notice::MultipleParticipantsArrived),
                };
                for participant in added {
                    if !self.waiting.iter().any(|p| p.id == participant.id) {
                        self.waiting.push(participant);
                    }
                }
                notice
            }
            WaitingRoomParticipantEvent::Removed(removed) => {
                self.waiting.retain(|p| !removed.iter().any(|r| r.id == p.id));
                match removed.as_slice() {
                    [] => None,
                    [one] => Some(Notice::ParticipantLeft(one.name.clone())),
                    _ => Some(Notice::MultipleParticipantsLeft),
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.participants.clear();
        self.active_speaker = None;
        self.waiting.clear();
    }
}
