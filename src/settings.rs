//! Race settings
//!
//! Persisted in LocalStorage on the web; natively the defaults are used.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FRAME_DT, TRACK_START_Y};
use crate::error::SettingsError;

/// Who gets knocked out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationPolicy {
    /// Everyone at rank `n` or worse is in danger
    Rank(usize),
    /// The last `n` places of the pool are in danger
    LastPlaces(usize),
}

impl Default for EliminationPolicy {
    fn default() -> Self {
        EliminationPolicy::Rank(13)
    }
}

impl EliminationPolicy {
    /// First rank that is in danger for a pool of `pool` characters.
    ///
    /// A cutoff above the pool size means nobody can be eliminated by rank.
    pub fn cutoff_rank(&self, pool: usize) -> usize {
        match *self {
            EliminationPolicy::Rank(n) => n,
            EliminationPolicy::LastPlaces(n) => {
                // Somebody always survives
                let n = n.min(pool.saturating_sub(1));
                pool - n + 1
            }
        }
    }

    /// True if the policy can eliminate anyone in a pool of `pool`
    pub fn is_active(&self, pool: usize) -> bool {
        self.cutoff_rank(pool) <= pool
    }
}

/// Race settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceSettings {
    /// Seed for placement, scales and AI decisions
    pub seed: u64,
    /// Computer-controlled characters alongside the player
    pub ai_count: usize,
    pub elimination: EliminationPolicy,
    /// How long a fall lasts before respawn or elimination (ms)
    pub fall_timeout_ms: f32,
    /// Y of the starting line
    pub start_y: f32,
    /// Upper bound for a single tick's dt (ms)
    pub max_frame_dt: f32,
}

impl Default for RaceSettings {
    fn default() -> Self {
        Self {
            seed: 13,
            ai_count: 19,
            elimination: EliminationPolicy::default(),
            fall_timeout_ms: 700.0,
            start_y: TRACK_START_Y,
            max_frame_dt: MAX_FRAME_DT,
        }
    }
}

impl RaceSettings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.fall_timeout_ms.is_finite() || self.fall_timeout_ms <= 0.0 {
            return Err(SettingsError::Invalid("fall_timeout_ms must be positive"));
        }
        if !self.max_frame_dt.is_finite() || self.max_frame_dt <= 0.0 {
            return Err(SettingsError::Invalid("max_frame_dt must be positive"));
        }
        if !self.start_y.is_finite() {
            return Err(SettingsError::Invalid("start_y must be finite"));
        }
        match self.elimination {
            EliminationPolicy::Rank(0) | EliminationPolicy::LastPlaces(0) => {
                Err(SettingsError::Invalid("elimination cutoff must be at least 1"))
            }
            _ => Ok(()),
        }
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "thirteenth_guy_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
