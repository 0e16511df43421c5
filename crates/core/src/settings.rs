// crates/core/src/settings.rs
//! Runner settings lookup.
//!
//! A settings folder may hold a flat YAML mapping whose entries are passed
//! to the runner as `--variable key:value`. A missing, unreadable or
//! malformed file is never an error for the caller: it yields an empty map.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::SettingsError;

/// File names checked inside the settings folder, in order.
pub const SETTINGS_FILE_NAMES: &[&str] = &[
    "Robot_Setting.yaml",
    "Robot_Setting.yml",
    "robot_setting.yaml",
    "robot_setting.yml",
];

/// Flat key → scalar mapping, sorted by key.
pub type Settings = BTreeMap<String, String>;

/// First existing settings file inside `dir`.
pub fn find_settings_file(dir: &Path) -> Option<PathBuf> {
    SETTINGS_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Load settings from `dir`, falling back to an empty map on any problem.
pub fn load_settings(dir: Option<&Path>) -> Settings {
    let Some(dir) = dir else {
        return Settings::new();
    };
    let Some(path) = find_settings_file(dir) else {
        tracing::debug!(dir = %dir.display(), "No runner settings file found");
        return Settings::new();
    };
    match read_settings_file(&path) {
        Ok(settings) => {
            tracing::debug!(path = %path.display(), entries = settings.len(), "Loaded runner settings");
            settings
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable runner settings");
            Settings::new()
        }
    }
}

/// Parse one settings file. Non-scalar values are skipped.
pub fn read_settings_file(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|e| SettingsError::io(path, e))?;
    let value: Value =
        serde_yaml::from_str(&content).map_err(|e| SettingsError::MalformedYaml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let mapping = match value {
        Value::Null => return Ok(Settings::new()),
        Value::Mapping(m) => m,
        _ => {
            return Err(SettingsError::NotAMapping {
                path: path.to_path_buf(),
            })
        }
    };

    let mut settings = Settings::new();
    for (key, value) in mapping {
        let (Some(key), Some(value)) = (scalar_to_string(&key), scalar_to_string(&value)) else {
            tracing::debug!(path = %path.display(), "Skipping non-scalar settings entry");
            continue;
        };
        settings.insert(key, value);
    }
    Ok(settings)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_settings_none_dir() {
        assert!(load_settings(None).is_empty());
    }

    #[test]
    fn test_load_settings_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(load_settings(Some(dir.path())).is_empty());
    }

    #[test]
    fn test_load_settings_scalars() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "Robot_Setting.yaml",
            "BROWSER: chrome\nTIMEOUT: 30\nHEADLESS: true\nEMPTY:\nLIST: [1, 2]\n",
        );
        let settings = load_settings(Some(dir.path()));
        assert_eq!(
            settings,
            Settings::from([
                ("BROWSER".to_string(), "chrome".to_string()),
                ("EMPTY".to_string(), String::new()),
                ("HEADLESS".to_string(), "true".to_string()),
                ("TIMEOUT".to_string(), "30".to_string()),
            ])
        );
    }

    #[test]
    fn test_candidate_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "robot_setting.yml", "A: lower\n");
        write(&dir, "Robot_Setting.yml", "A: upper\n");
        let found = find_settings_file(dir.path()).unwrap();
        assert!(found.ends_with("Robot_Setting.yml"));
        assert_eq!(load_settings(Some(dir.path()))["A"], "upper");
    }

    #[test]
    fn test_malformed_yaml_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Robot_Setting.yaml", "key: [unclosed\n");
        assert!(matches!(
            read_settings_file(&path),
            Err(SettingsError::MalformedYaml { .. })
        ));
        assert!(load_settings(Some(dir.path())).is_empty());
    }

    #[test]
    fn test_non_mapping_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Robot_Setting.yaml", "- a\n- b\n");
        assert!(matches!(
            read_settings_file(&path),
            Err(SettingsError::NotAMapping { .. })
        ));
        assert!(load_settings(Some(dir.path())).is_empty());
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "Robot_Setting.yaml", "");
        assert!(read_settings_file(&path).unwrap().is_empty());
    }
}
