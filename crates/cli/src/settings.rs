use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use strm_artwork_core::shared::artwork_kind::ArtworkNaming;
use strm_artwork_core::shared::constants::{DEFAULT_JPEG_QUALITY, POINTER_EXTENSION};

/// Persistent defaults, overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub root: Option<PathBuf>,
    pub fanart: bool,
    pub poster: bool,
    pub naming: ArtworkNaming,
    pub jpeg_quality: u8,
    pub jobs: usize,
    pub extension: String,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: None,
            fanart: true,
            poster: true,
            naming: ArtworkNaming::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            jobs: 1,
            extension: POINTER_EXTENSION.to_string(),
            seed: None,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("strm-artwork").join("settings.json"))
    }

    /// Reads settings from `path`. A file that was asked for explicitly must
    /// exist and parse.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings file {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid settings file {}: {e}", path.display()))?;
        Ok(settings)
    }

    /// Settings from the platform config directory, or defaults when there is
    /// no usable file.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                log::warn!("{e}; using defaults");
                Self::default()
            }),
            _ => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "naming": "fixed", "jobs": 4 }"#).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.naming, ArtworkNaming::Fixed);
        assert_eq!(settings.jobs, 4);
        assert!(settings.fanart);
        assert_eq!(settings.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert_eq!(settings.extension, "strm");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Cannot read settings file"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "naming": "sideways" }"#).unwrap();
        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Invalid settings file"));
    }

    #[test]
    fn test_json_roundtrip() {
        let settings = Settings {
            root: Some(PathBuf::from("/library")),
            seed: Some(7),
            ..Settings::default()
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
