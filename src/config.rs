/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// A file that parses but fails validation is rejected as a whole.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::domain::grid::Grid;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub grid: Grid,
    pub gamepad: GamepadConfig,
    pub sound: SoundConfig,
    /// Empty = no log file.
    pub log_file: Option<PathBuf>,
    /// 0 = seed from the OS.
    pub seed: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeedConfig {
    pub base_tick_ms: u64,
    pub min_tick_ms: u64,
    pub ramp_factor: f64,       // interval multiplier per food eaten
    pub restart_cooldown_ms: u64,
}

impl SpeedConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_millis(self.base_tick_ms)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_tick_ms)
    }

    pub fn restart_cooldown(&self) -> Duration {
        Duration::from_millis(self.restart_cooldown_ms)
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            base_tick_ms: default_base_tick(),
            min_tick_ms: default_min_tick(),
            ramp_factor: default_ramp_factor(),
            restart_cooldown_ms: default_restart_cooldown(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
#[derive(Clone, Debug)]
pub struct SoundConfig {
    pub enabled: bool,
    pub sfx_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("min_tick_ms must be between 1 and base_tick_ms ({base}), got {min}")]
    TickRange { base: u64, min: u64 },
    #[error("ramp_factor must be in (0, 1], got {0}")]
    RampFactor(f64),
    #[error("grid {width}x{height} cannot hold the starting snake (needs at least 9x11)")]
    GridTooSmall { width: i32, height: i32 },
    #[error("reserved_top_rows ({reserved}) leaves no spawn rows on a board {height} rows high")]
    NoSpawnRows { reserved: i32, height: i32 },
}

/// The starting snake spans columns 6..=8 on row 10.
const MIN_WIDTH: i32 = 9;
const MIN_HEIGHT: i32 = 11;

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    sound: TomlSound,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_base_tick")]
    base_tick_ms: u64,
    #[serde(default = "default_min_tick")]
    min_tick_ms: u64,
    #[serde(default = "default_ramp_factor")]
    ramp_factor: f64,
    #[serde(default = "default_restart_cooldown")]
    restart_cooldown_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_grid_size")]
    width: i32,
    #[serde(default = "default_grid_size")]
    height: i32,
    #[serde(default = "default_reserved_rows")]
    reserved_top_rows: i32,
    #[serde(default = "default_cell_size")]
    cell_size: u16,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_restart")]
    restart: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlSound {
    #[serde(default = "default_sound_enabled")]
    enabled: bool,
    #[serde(default = "default_sfx_dir")]
    sfx_dir: String,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    log_file: String,
    #[serde(default)]
    seed: u64,
}

// ── Defaults ──

fn default_base_tick() -> u64 { 150 }
fn default_min_tick() -> u64 { 70 }
fn default_ramp_factor() -> f64 { 0.95 }    // 5% faster per food
fn default_restart_cooldown() -> u64 { 1000 }
fn default_grid_size() -> i32 { 25 }
fn default_reserved_rows() -> i32 { 3 }     // HUD band
fn default_cell_size() -> u16 { 2 }
fn default_restart() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_sound_enabled() -> bool { true }
fn default_sfx_dir() -> String { "sfx".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            base_tick_ms: default_base_tick(),
            min_tick_ms: default_min_tick(),
            ramp_factor: default_ramp_factor(),
            restart_cooldown_ms: default_restart_cooldown(),
        }
    }
}

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid {
            width: default_grid_size(),
            height: default_grid_size(),
            reserved_top_rows: default_reserved_rows(),
            cell_size: default_cell_size(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            restart: default_restart(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlSound {
    fn default() -> Self {
        TomlSound {
            enabled: default_sound_enabled(),
            sfx_dir: default_sfx_dir(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// A missing file or missing keys fall back to defaults; an unreadable,
    /// malformed or invalid file is an error for the caller to report.
    pub fn load() -> Result<Self, ConfigError> {
        let search_dirs = candidate_dirs();
        match search_dirs.iter().map(|d| d.join("config.toml")).find(|p| p.exists()) {
            Some(path) => GameConfig::from_file(&path, &search_dirs),
            None => Ok(GameConfig::from_toml(TomlConfig::default(), &search_dirs)),
        }
    }

    /// Read, parse and validate one file.
    pub fn from_file(path: &Path, search_dirs: &[PathBuf]) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        GameConfig::parse(&text, search_dirs)
    }

    /// Parse and validate TOML text.
    pub fn parse(text: &str, search_dirs: &[PathBuf]) -> Result<Self, ConfigError> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        let cfg = GameConfig::from_toml(toml_cfg, search_dirs);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let log_file = match toml_cfg.general.log_file.trim() {
            "" => None,
            path => Some(PathBuf::from(path)),
        };

        GameConfig {
            speed: SpeedConfig {
                base_tick_ms: toml_cfg.speed.base_tick_ms,
                min_tick_ms: toml_cfg.speed.min_tick_ms,
                ramp_factor: toml_cfg.speed.ramp_factor,
                restart_cooldown_ms: toml_cfg.speed.restart_cooldown_ms,
            },
            grid: Grid::new(
                toml_cfg.grid.width,
                toml_cfg.grid.height,
                toml_cfg.grid.reserved_top_rows,
                toml_cfg.grid.cell_size.max(1),
            ),
            gamepad: GamepadConfig {
                restart: toml_cfg.gamepad.restart,
                quit: toml_cfg.gamepad.quit,
            },
            sound: SoundConfig {
                enabled: toml_cfg.sound.enabled,
                sfx_dir: resolve_dir(&toml_cfg.sound.sfx_dir, search_dirs),
            },
            log_file,
            seed: toml_cfg.general.seed,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.speed;
        if s.min_tick_ms == 0 || s.min_tick_ms > s.base_tick_ms {
            return Err(ConfigError::TickRange { base: s.base_tick_ms, min: s.min_tick_ms });
        }
        if !(s.ramp_factor > 0.0 && s.ramp_factor <= 1.0) {
            return Err(ConfigError::RampFactor(s.ramp_factor));
        }

        let g = &self.grid;
        if g.width < MIN_WIDTH || g.height < MIN_HEIGHT {
            return Err(ConfigError::GridTooSmall { width: g.width, height: g.height });
        }
        if g.reserved_top_rows < 0 || g.reserved_top_rows >= g.height {
            return Err(ConfigError::NoSpawnRows { reserved: g.reserved_top_rows, height: g.height });
        }
        Ok(())
    }
}

/// Relative directories are looked up in the search dirs, else kept relative to CWD.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(dir);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}
