use crate::{CompareVariant, SyncDirection, TwinSyncError};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "twinsync.toml";

/// Default file time tolerance: FAT stores times with two-second precision
pub const DEFAULT_FILE_TIME_TOLERANCE: i32 = 2;

/// Preset rule for deriving sync directions from categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncVariant {
    /// Propagate changes in both directions
    #[default]
    TwoWay,
    /// Make the right side an exact copy of the left
    Mirror,
    /// Copy new and updated items to the right, never delete
    Update,
    /// Use [`DirectionSet`] as configured
    Custom,
}

/// Direction to apply per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSet {
    pub left_only: SyncDirection,
    pub right_only: SyncDirection,
    pub left_newer: SyncDirection,
    pub right_newer: SyncDirection,
    /// Applies to different content and different metadata
    pub different: SyncDirection,
    pub conflict: SyncDirection,
}

impl DirectionSet {
    pub fn two_way() -> Self {
        Self {
            left_only: SyncDirection::Left,
            right_only: SyncDirection::Right,
            left_newer: SyncDirection::Left,
            right_newer: SyncDirection::Right,
            different: SyncDirection::None,
            conflict: SyncDirection::None,
        }
    }

    pub fn mirror() -> Self {
        Self {
            left_only: SyncDirection::Left,
            right_only: SyncDirection::Left,
            left_newer: SyncDirection::Left,
            right_newer: SyncDirection::Left,
            different: SyncDirection::Left,
            conflict: SyncDirection::Left,
        }
    }

    pub fn update() -> Self {
        Self {
            left_only: SyncDirection::Left,
            right_only: SyncDirection::None,
            left_newer: SyncDirection::Left,
            right_newer: SyncDirection::None,
            different: SyncDirection::Left,
            conflict: SyncDirection::None,
        }
    }
}

impl Default for DirectionSet {
    fn default() -> Self {
        Self::two_way()
    }
}

/// Synchronization settings for one folder pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub variant: SyncVariant,

    /// Only consulted for [`SyncVariant::Custom`]
    #[serde(default)]
    pub custom: DirectionSet,
}

impl SyncConfig {
    pub fn new(variant: SyncVariant) -> Self {
        Self {
            variant,
            custom: DirectionSet::default(),
        }
    }

    /// The directions in effect for the configured variant
    pub fn directions(&self) -> DirectionSet {
        match self.variant {
            SyncVariant::TwoWay => DirectionSet::two_way(),
            SyncVariant::Mirror => DirectionSet::mirror(),
            SyncVariant::Update => DirectionSet::update(),
            SyncVariant::Custom => self.custom,
        }
    }
}

fn default_time_tolerance() -> i32 {
    DEFAULT_FILE_TIME_TOLERANCE
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ignore patterns (e.g., "*.o", "node_modules/")
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Whether to follow symbolic links
    #[serde(default)]
    pub follow_symlinks: bool,

    #[serde(default)]
    pub compare_variant: CompareVariant,

    /// Allowed modification time difference in seconds
    #[serde(default = "default_time_tolerance")]
    pub file_time_tolerance: i32,

    /// Time shifts (in minutes) to ignore, e.g. 60 for DST changes
    #[serde(default)]
    pub ignored_time_shift_minutes: Vec<u32>,

    #[serde(default)]
    pub sync: SyncConfig,

    /// Pair up renamed files instead of copy + delete
    #[serde(default)]
    pub detect_moves: bool,

    /// Enable portable mode (config alongside binary)
    #[serde(default)]
    pub portable_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
            compare_variant: CompareVariant::default(),
            file_time_tolerance: DEFAULT_FILE_TIME_TOLERANCE,
            ignored_time_shift_minutes: Vec::new(),
            sync: SyncConfig::default(),
            detect_moves: false,
            portable_mode: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, TwinSyncError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    let mut loaded = load_config_from(&path)?;
    loaded.config.portable_mode = portable;
    loaded.portable = portable;
    Ok(loaded)
}

/// Reads the configuration at `path`, falling back to defaults if it is missing
pub fn load_config_from(path: &Path) -> Result<LoadedConfig, TwinSyncError> {
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|e| TwinSyncError::Serialization(e.to_string()))?
    } else {
        AppConfig::default()
    };

    if config.file_time_tolerance < 0 {
        return Err(TwinSyncError::Config(format!(
            "file_time_tolerance must not be negative: {}",
            config.file_time_tolerance
        )));
    }

    Ok(LoadedConfig {
        config,
        path: path.to_path_buf(),
        exists,
        portable: false,
    })
}

pub fn ensure_config(prefer_portable: bool) -> Result<LoadedConfig, TwinSyncError> {
    let loaded = load_config(prefer_portable)?;
    if !loaded.exists {
        save_config(&loaded.path, &loaded.config)?;
    }
    Ok(loaded)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), TwinSyncError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| TwinSyncError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), TwinSyncError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "", "twinsync")
        .ok_or_else(|| TwinSyncError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
