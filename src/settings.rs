use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

pub const MIN_TICK_INTERVAL_MS: u64 = 10;
pub const MAX_TICK_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackSettings {
    /// Cadence of the driving loop. Only affects display smoothness, never accuracy.
    pub tick_interval_ms: u64,
    /// Log every segment change at info level.
    pub log_transitions: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            log_transitions: true,
        }
    }
}

impl PlaybackSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(
            self.tick_interval_ms
                .clamp(MIN_TICK_INTERVAL_MS, MAX_TICK_INTERVAL_MS),
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    playback: PlaybackSettings,
}

pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            let data: UserSettings = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
            log_info!("Loaded settings from {}", path.display());
            data
        } else {
            log_info!("No settings at {}, using defaults", path.display());
            UserSettings::default()
        };

        let requested = data.playback.tick_interval_ms;
        if !(MIN_TICK_INTERVAL_MS..=MAX_TICK_INTERVAL_MS).contains(&requested) {
            log_warn!(
                "tickIntervalMs {} out of range, clamping to {}..={}",
                requested,
                MIN_TICK_INTERVAL_MS,
                MAX_TICK_INTERVAL_MS
            );
        }

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Defaults only, never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(UserSettings::default()),
        }
    }

    pub fn playback(&self) -> PlaybackSettings {
        match self.data.read() {
            Ok(guard) => guard.playback.clone(),
            Err(poisoned) => poisoned.into_inner().playback.clone(),
        }
    }

    pub fn update_playback(&self, settings: PlaybackSettings) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.playback = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }
}
