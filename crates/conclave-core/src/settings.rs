use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::sdk::lock;

/// User preferences persisted across sessions.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Settings {
    #[serde(default)]
    pub display_name: Option<String>,
    /// Last microphone choice, applied when the next meeting connects.
    #[serde(default)]
    pub audio_muted_on_join: bool,
    /// Last camera choice, applied when the next meeting connects.
    #[serde(default)]
    pub video_muted_on_join: bool,
}

pub struct SettingsStore {
    settings: Mutex<Settings>,
    file_path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new(data_dir: &str) -> Self {
        let file_path = PathBuf::from(data_dir).join("settings.json");
        let settings = Self::load(&file_path);
        Self {
            settings: Mutex::new(settings),
            file_path: Some(file_path),
        }
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            file_path: None,
        }
    }

    pub fn get(&self) -> Settings {
        lock(&self.settings).clone()
    }

    pub fn set_display_name(&self, name: Option<String>) {
        lock(&self.settings).display_name = name;
        self.save();
    }

    pub fn set_audio_muted_on_join(&self, muted: bool) {
        lock(&self.settings).audio_muted_on_join = muted;
        self.save();
    }

    pub fn set_video_muted_on_join(&self, muted: bool) {
        lock(&self.settings).video_muted_on_join = muted;
        self.save();
    }

    fn save(&self) {
        let Some(path) = &self.file_path else { return };
        let settings = self.get();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("cannot create settings dir {}: {e}", parent.display());
                return;
            }
        }
        match serde_json::to_string_pretty(&settings) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    tracing::warn!("cannot write settings {}: {e}", path.display());
                }
            }
            Err(e) => tracing::warn!("cannot serialize settings: {e}"),
        }
    }

    fn load(path: &Path) -> Settings {
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("corrupt settings {}, using defaults: {e}", path.display());
                Settings::default()
            }),
            Err(_) => Settings::default(),
        }
    }
}
