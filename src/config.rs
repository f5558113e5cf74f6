/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Simulation tick interval. The sim has no fixed-timestep decoupling:
    /// game speed is proportional to the tick rate.
    pub tick_rate_ms: u64,
    /// Fixed RNG seed for reproducible runs; None = seed from OS entropy.
    pub seed: Option<u64>,
    pub volume: f32,
    pub start_muted: bool,
    pub levels_dir: PathBuf,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_volume")]
    volume: f32,
    #[serde(default)]
    muted: bool,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }     // ~60 ticks/s, the cadence the tuning assumes
fn default_volume() -> f32 { 0.6 }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { volume: default_volume(), muted: false }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { levels_dir: default_levels_dir(), seed: None }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);

        // Resolve the levels directory against the search dirs.
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
            seed: toml_cfg.general.seed,
            volume: toml_cfg.audio.volume.clamp(0.0, 1.0),
            start_muted: toml_cfg.audio.muted,
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its data.
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

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.speed.tick_rate_ms, 16);
        assert_eq!(cfg.audio.volume, 0.6);
        assert!(!cfg.audio.muted);
        assert_eq!(cfg.general.levels_dir, "levels");
        assert_eq!(cfg.general.seed, None);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: TomlConfig = toml::from_str(
            "[audio]\nmuted = true\n\n[general]\nseed = 99\n",
        )
        .unwrap();
        assert!(cfg.audio.muted);
        assert_eq!(cfg.audio.volume, 0.6);
        assert_eq!(cfg.general.seed, Some(99));
        assert_eq!(cfg.speed.tick_rate_ms, 16);
    }
}
