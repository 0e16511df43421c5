// crates/core/src/request.rs
//! Run request payload.

use serde::Deserialize;

fn default_project() -> String {
    "default".to_string()
}

fn default_target_root() -> String {
    ".".to_string()
}

/// Parameters for starting a run.
///
/// Older clients send `suite`, `tests_root`, `test_name`, `test_cases` and
/// `config_folder`; those names are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunRequest {
    /// Project name used to group output directories.
    #[serde(default = "default_project", alias = "suite")]
    pub project: String,
    /// Directory or file holding the test suites.
    #[serde(default = "default_target_root", alias = "tests_root")]
    pub target_root: String,
    /// Optional suite or file relative to `target_root`.
    #[serde(default, alias = "test_name")]
    pub target_name: Option<String>,
    /// Optional individual case names to select.
    #[serde(default, alias = "test_cases")]
    pub case_names: Option<Vec<String>>,
    /// Folder that may contain a runner settings file.
    #[serde(default, alias = "config_folder")]
    pub settings_dir: Option<String>,
    /// Reserved; accepted and ignored.
    #[serde(default)]
    pub parameters: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            project: default_project(),
            target_root: default_target_root(),
            target_name: None,
            case_names: None,
            settings_dir: None,
            parameters: None,
        }
    }
}

impl RunRequest {
    /// Requested case names with blank entries removed.
    pub fn selected_cases(&self) -> Vec<&str> {
        self.case_names
            .iter()
            .flatten()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect()
    }

    /// Project name, falling back to `default` when blank.
    pub fn project_name(&self) -> &str {
        match self.project.trim() {
            "" => "default",
            name => name,
        }
    }
}
