//! Application configuration
//!
//! Loaded from a YAML file (`config.yaml` by default); every section falls
//! back to built-in defaults so a missing file yields a working session.
//! Mapping chains are written in command syntax and parsed into structured
//! chains at load time.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::translator::actions::ActionChain;
use crate::translator::{self, TranslatorSettings};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub midi: MidiConfig,
    pub translator: TranslatorConfig,
}

impl AppConfig {
    /// Read the file, or fall back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config = serde_yaml::from_str(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                info!("configuration loaded from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }
}

/// MIDI front-end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Input port name pattern (case-insensitive substring match)
    pub input_port: String,
    /// Sleep between idle poll ticks
    pub poll_interval_ms: u64,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: "drum".to_string(),
            poll_interval_ms: 5,
        }
    }
}

impl MidiConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Translator policy and the note mapping table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub button_hold_ms: u64,
    pub stick_hold_ms: u64,
    pub pedal_threshold: u8,
    pub pedal_press: ActionChain,
    pub pedal_release: ActionChain,
    pub menu_note: u8,
    pub menu_presses: u32,
    /// Note number → action chain, in command syntax
    pub mappings: HashMap<u8, ActionChain>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        let settings = TranslatorSettings::default();
        Self {
            button_hold_ms: settings.button_hold.as_millis() as u64,
            stick_hold_ms: settings.stick_hold.as_millis() as u64,
            pedal_threshold: settings.pedal_threshold,
            pedal_press: settings.pedal_press,
            pedal_release: settings.pedal_release,
            menu_note: settings.menu_note,
            menu_presses: settings.menu_presses,
            mappings: translator::default_mapping(),
        }
    }
}

impl TranslatorConfig {
    pub fn settings(&self) -> TranslatorSettings {
        TranslatorSettings {
            button_hold: Duration::from_millis(self.button_hold_ms),
            stick_hold: Duration::from_millis(self.stick_hold_ms),
            pedal_threshold: self.pedal_threshold,
            pedal_press: self.pedal_press.clone(),
            pedal_release: self.pedal_release.clone(),
            menu_note: self.menu_note,
            menu_presses: self.menu_presses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_carry_the_builtin_mapping() {
        let config = AppConfig::default();
        assert_eq!(config.midi.input_port, "drum");
        assert_eq!(config.translator.mappings.len(), 8);
        assert_eq!(
            config.translator.mappings.get(&48),
            Some(&ActionChain::parse("hold x").unwrap())
        );
    }

    #[test]
    fn test_yaml_overrides_merge_with_defaults() {
        let yaml = r#"
midi:
  input_port: "TD-17"
translator:
  stick_hold_ms: 500
  mappings:
    60: "hold plus"
    51: "stick l h 4000"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.midi.input_port, "TD-17");
        assert_eq!(config.midi.poll_interval_ms, 5);
        assert_eq!(config.translator.stick_hold_ms, 500);
        assert_eq!(config.translator.button_hold_ms, 40);
        // mappings section replaces the table wholesale
        assert_eq!(config.translator.mappings.len(), 2);
        assert_eq!(
            config.translator.mappings.get(&60),
            Some(&ActionChain::parse("hold plus").unwrap())
        );
    }

    #[test]
    fn test_bad_chain_in_yaml_is_a_parse_error() {
        let yaml = r#"
translator:
  mappings:
    60: "mash a"
"#;
        assert!(serde_yaml::from_str::<AppConfig>(yaml).is_err());
    }

    #[test]
    fn test_settings_conversion() {
        let config = TranslatorConfig {
            button_hold_ms: 25,
            ..TranslatorConfig::default()
        };
        let settings = config.settings();
        assert_eq!(settings.button_hold, Duration::from_millis(25));
        assert_eq!(settings.stick_hold, Duration::from_millis(300));
    }

    #[test]
    fn test_config_round_trips_through_yaml() {
        let config = AppConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            parsed.translator.mappings.get(&38),
            config.translator.mappings.get(&38)
        );
    }
}
