//! Engine settings and their persistence
//!
//! Saves and loads [`GameSettings`] to/from a JSON file. Settings carry the
//! board dimensions, loop timing, input queue capacity and the per-kind
//! physics table every piece state machine is built from.
//!
//! # File Location
//!
//! By default settings live in `settings.json` inside the platform config
//! directory (see [`default_settings_path`]). An explicit path always wins.
//!
//! # Error Handling
//!
//! [`GameSettings::load_or_default`] never fails: a missing, unreadable or
//! invalid file falls back to defaults with a logged warning. The strict
//! [`GameSettings::load_from`] / [`GameSettings::save_to`] return
//! [`CoreResult`] for callers that want to surface the error.

use crate::core::error::{CoreError, CoreResult};
use crate::game::types::{BoardSize, Millis, PieceKind};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

/// Timing model for one piece kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsProfile {
    /// Travel speed while in the move state, in cells per second
    pub speed_cells_per_sec: f64,
    /// Airtime of an in-place jump
    pub jump_duration_ms: Millis,
    /// Cooldown after a completed move
    pub long_rest_ms: Millis,
    /// Cooldown after a completed jump
    pub short_rest_ms: Millis,
}

impl Default for PhysicsProfile {
    fn default() -> Self {
        Self {
            speed_cells_per_sec: 1.5,
            jump_duration_ms: 1_000,
            long_rest_ms: 3_000,
            short_rest_ms: 1_000,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    /// Board dimensions
    pub board: BoardSize,

    /// Sleep between ticks of the orchestrator loop
    pub tick_interval_ms: Millis,

    /// Capacity of the bounded command queue
    pub input_queue_capacity: usize,

    /// Game clock speed multiplier (tests and replays run faster)
    pub time_factor: u64,

    /// Fallback physics for kinds without an explicit profile
    pub default_profile: PhysicsProfile,

    /// Per-kind physics overrides
    pub profiles: BTreeMap<PieceKind, PhysicsProfile>,
}

impl Default for GameSettings {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            PieceKind::King,
            PhysicsProfile {
                speed_cells_per_sec: 1.0,
                ..PhysicsProfile::default()
            },
        );
        profiles.insert(
            PieceKind::Knight,
            PhysicsProfile {
                speed_cells_per_sec: 2.0,
                ..PhysicsProfile::default()
            },
        );
        profiles.insert(
            PieceKind::Pawn,
            PhysicsProfile {
                speed_cells_per_sec: 1.0,
                long_rest_ms: 2_000,
                ..PhysicsProfile::default()
            },
        );

        Self {
            board: BoardSize::STANDARD,
            tick_interval_ms: 16,
            input_queue_capacity: 256,
            time_factor: 1,
            default_profile: PhysicsProfile::default(),
            profiles,
        }
    }
}

impl GameSettings {
    /// Physics profile for a kind, falling back to [`GameSettings::default_profile`]
    pub fn profile(&self, kind: PieceKind) -> &PhysicsProfile {
        self.profiles.get(&kind).unwrap_or(&self.default_profile)
    }

    /// Reject values the engine can't run with
    pub fn validate(&self) -> CoreResult<()> {
        if self.board.rows <= 0 || self.board.cols <= 0 {
            return Err(CoreError::InvalidSettings {
                message: format!(
                    "board must have positive dimensions, got {}x{}",
                    self.board.rows, self.board.cols
                ),
            });
        }
        if self.input_queue_capacity == 0 {
            return Err(CoreError::InvalidSettings {
                message: "input_queue_capacity must be at least 1".to_string(),
            });
        }
        if self.time_factor == 0 {
            return Err(CoreError::InvalidSettings {
                message: "time_factor must be at least 1".to_string(),
            });
        }
        let profiles = std::iter::once((None, &self.default_profile))
            .chain(self.profiles.iter().map(|(kind, p)| (Some(*kind), p)));
        for (kind, profile) in profiles {
            if !(profile.speed_cells_per_sec.is_finite() && profile.speed_cells_per_sec > 0.0) {
                return Err(CoreError::InvalidSettings {
                    message: format!(
                        "speed for {} must be positive, got {}",
                        kind.map_or("default profile", |k| k.name()),
                        profile.speed_cells_per_sec
                    ),
                });
            }
        }
        Ok(())
    }

    /// Strict load from a JSON file
    pub fn load_from(path: &Path) -> CoreResult<Self> {
        let contents = fs::read_to_string(path)?;
        let settings: GameSettings = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path` (or the default location), falling back to defaults
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let settings_path = path.map(Path::to_path_buf).unwrap_or_else(default_settings_path);

        if !settings_path.exists() {
            info!(
                "[SETTINGS] No settings file found at {:?}. Using defaults.",
                settings_path
            );
            return Self::default();
        }

        match Self::load_from(&settings_path) {
            Ok(settings) => {
                info!("[SETTINGS] Loaded settings from {:?}", settings_path);
                settings
            }
            Err(e) => {
                warn!(
                    "[SETTINGS] Failed to load settings file at {:?}: {}. Using defaults.",
                    settings_path, e
                );
                Self::default()
            }
        }
    }

    /// Save as pretty JSON, creating the parent directory when needed
    pub fn save_to(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        info!("[SETTINGS] Saved settings to {:?}", path);
        Ok(())
    }
}

/// Resolve the default settings file path
///
/// Returns `settings.json` in the user's configuration directory, or a local
/// `settings.json` if the system config dir cannot be found.
pub fn default_settings_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "kungfu-chess", "kungfu-chess") {
        proj_dirs.config_dir().join(SETTINGS_FILENAME)
    } else {
        PathBuf::from(SETTINGS_FILENAME)
    }
}
