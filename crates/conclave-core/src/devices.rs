use crate::sdk::{AudioDevice, VideoDevice, VideoLayout};

/// A single-choice list whose selection follows the SDK's "current" value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionList<T> {
    items: Vec<T>,
    current: Option<T>,
}

impl<T: Clone + PartialEq> SelectionList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, current: None }
    }

    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Record the SDK's current value. It may not be listed yet.
    pub fn set_current(&mut self, current: T) {
        self.current = Some(current);
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Position of the current value in the list.
    pub fn selected_position(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.items.iter().position(|item| item == current)
    }

    /// Select by position. Returns the chosen item, `None` when out of range.
    pub fn select(&mut self, position: usize) -> Option<T> {
        let item = self.items.get(position)?.clone();
        self.current = Some(item.clone());
        Some(item)
    }
}

impl<T> Default for SelectionList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
        }
    }
}

/// Options menu: layouts, devices, captions and waiting-room switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMenu {
    pub layouts: SelectionList<VideoLayout>,
    pub audio: SelectionList<AudioDevice>,
    pub video: SelectionList<VideoDevice>,
    pub closed_captions_on: bool,
    pub waiting_room_enabled: bool,
}

impl DeviceMenu {
    pub fn new() -> Self {
        let mut layouts = SelectionList::new(VideoLayout::ALL.to_vec());
        layouts.set_current(VideoLayout::Speaker);
        Self {
            layouts,
            audio: SelectionList::default(),
            video: SelectionList::default(),
            closed_captions_on: false,
            waiting_room_enabled: false,
        }
    }

    pub fn layout_label(&self) -> &'static str {
        self.layouts
            .current()
            .copied()
            .unwrap_or(VideoLayout::Speaker)
            .display_name()
    }

    pub fn audio_label(&self) -> Option<&str> {
        self.audio.current().map(|d| d.name.as_str())
    }

    pub fn video_label(&self) -> Option<&str> {
        self.video.current().map(|d| d.name.as_str())
    }

    /// Reset per-meeting switches. Device lists survive meetings.
    pub fn reset_meeting_options(&mut self) {
        self.closed_captions_on = false;
        self.waiting_room_enabled = false;
    }
}

impl Default for DeviceMenu {
    fn default() -> Self {
        Self::new()
    }
}
