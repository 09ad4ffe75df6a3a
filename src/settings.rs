//! Presentation preferences
//!
//! Controls which effect hooks the simulation fires. None of these change where
//! a block stops; they only gate cosmetic work.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, read_file};

/// Player-facing effect preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Visual Effects ===
    /// Push objects further along the hit line
    pub chain_reactions: bool,
    /// Flash the object a block stops against
    pub hit_flash: bool,
    /// Push-and-return nudge on hit objects
    pub push_effects: bool,
    /// Spawn a hit effect at the contact point
    pub hit_particles: bool,

    // === Audio ===
    pub sound: bool,

    // === Accessibility ===
    /// Reduced motion (no pushes, no flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chain_reactions: true,
            hit_flash: true,
            push_effects: true,
            hit_particles: true,
            sound: true,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective push animation (respects reduced_motion)
    pub fn effective_push(&self) -> bool {
        self.push_effects && !self.reduced_motion
    }

    /// Effective chain propagation (needs pushes to be visible at all)
    pub fn effective_chain(&self) -> bool {
        self.chain_reactions && self.effective_push()
    }

    /// Effective hit flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        self.hit_flash && !self.reduced_motion
    }

    /// Load settings from a JSON file, defaulting on any failure
    pub fn load(path: &Path) -> Self {
        match read_file(path).and_then(|json| Ok(serde_json::from_str::<Self>(&json)?)) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({e})");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_gates_effects() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert!(!settings.effective_push());
        assert!(!settings.effective_chain());
        assert!(!settings.effective_flash());
        assert!(settings.sound);
    }

    #[test]
    fn test_chain_requires_push() {
        let settings = Settings {
            push_effects: false,
            ..Default::default()
        };
        assert!(!settings.effective_chain());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("slide_blocks_settings_{}.json", std::process::id()));
        let settings = Settings {
            hit_flash: false,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path);
        assert!(!loaded.hit_flash);
        assert!(loaded.chain_reactions);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_malformed_file_falls_back() {
        let path = std::env::temp_dir().join(format!("slide_blocks_bad_settings_{}.json", std::process::id()));
        std::fs::write(&path, "{ \"hit_flash\": ").unwrap();
        let loaded = Settings::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(loaded.hit_flash);
        assert!(!loaded.reduced_motion);

        let missing = Settings::load(&path);
        assert!(missing.chain_reactions);
    }
}
