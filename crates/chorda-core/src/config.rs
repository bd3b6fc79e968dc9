use crate::types::Mode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Runtime settings, persisted as JSON. Every field has a default so a
/// partial or missing file still yields a working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Virtual-key pressed together with Alt to toggle capture. Defaults to Q.
    #[serde(default = "default_toggle_vk")]
    pub toggle_vk: u16,
    /// Mode the toggle chord switches to from semantic.
    #[serde(default = "default_alternate_mode")]
    pub alternate_mode: Mode,
    /// Language tag sent with phonemic conversion requests.
    #[serde(default = "default_language")]
    pub language: String,
    /// Expansion service base URL. Empty means no service: flushed input is
    /// echoed back unchanged.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Bearer token for the expansion service, if it requires one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout for the expansion service.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Pause between injected backspace keystrokes.
    #[serde(default = "default_backspace_delay_ms")]
    pub backspace_delay_ms: u64,
    /// Pause between erasing buffered text and typing the expansion.
    #[serde(default = "default_replace_delay_ms")]
    pub replace_delay_ms: u64,
}

fn default_toggle_vk() -> u16 {
    0x51 // Q
}

fn default_alternate_mode() -> Mode {
    Mode::Text
}

fn default_language() -> String {
    "en".to_string()
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_backspace_delay_ms() -> u64 {
    10
}

fn default_replace_delay_ms() -> u64 {
    50
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            toggle_vk: default_toggle_vk(),
            alternate_mode: default_alternate_mode(),
            language: default_language(),
            endpoint: default_endpoint(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            backspace_delay_ms: default_backspace_delay_ms(),
            replace_delay_ms: default_replace_delay_ms(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Loads settings, falling back to defaults when the file is missing
    /// or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    "settings at {} unreadable, using defaults: {}",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Applies environment overrides on top of whatever was loaded.
    pub fn apply_env(&mut self) {
        if let Ok(endpoint) = std::env::var("CHORDA_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("CHORDA_API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let settings = Settings::default();
        assert_eq!(settings.toggle_vk, 0x51);
        assert_eq!(settings.alternate_mode, Mode::Text);
        assert_eq!(settings.language, "en");
        assert_eq!(settings.api_key, None);
        assert!(settings.timeout_ms > 0);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"language": "pt"}"#).unwrap();
        assert_eq!(settings.language, "pt");
        assert_eq!(settings.toggle_vk, default_toggle_vk());
        assert_eq!(settings.endpoint, default_endpoint());
    }

    #[test]
    fn mode_names_are_lowercase() {
        let settings: Settings =
            serde_json::from_str(r#"{"alternate_mode": "phonemic"}"#).unwrap();
        assert_eq!(settings.alternate_mode, Mode::Phonemic);
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains(r#""alternate_mode":"phonemic""#));
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("chorda-settings-{}.json", std::process::id()));
        let mut settings = Settings::default();
        settings.language = "pt".to_string();
        settings.toggle_vk = 0x57; // W
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.language, "pt");
        assert_eq!(loaded.toggle_vk, 0x57);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = Path::new("definitely/not/here/chorda.json");
        let settings = Settings::load_or_default(path);
        assert_eq!(settings.toggle_vk, default_toggle_vk());
    }

    #[test]
    fn env_overrides_apply() {
        std::env::set_var("CHORDA_ENDPOINT", "http://10.0.0.2:9000");
        std::env::set_var("CHORDA_API_KEY", "secret");
        let mut settings = Settings::default();
        settings.apply_env();
        assert_eq!(settings.endpoint, "http://10.0.0.2:9000");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
        std::env::remove_var("CHORDA_ENDPOINT");
        std::env::remove_var("CHORDA_API_KEY");
    }
}
