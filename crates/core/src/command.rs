// crates/core/src/command.rs
//! Runner invocation: output directory layout, artifact paths and the
//! argument list handed to the external test runner.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::RunError;
use crate::request::RunRequest;
use crate::settings::{load_settings, Settings};

/// Artifact file names, keyed the way the stats view reports them.
pub const ARTIFACT_FILES: &[(&str, &str)] = &[
    ("report_html", "report.html"),
    ("log_html", "log.html"),
    ("xunit_xml", "xunit.xml"),
    ("output_xml", "output.xml"),
];

/// Format of the per-run directory name.
const RUN_DIR_STAMP: &str = "%Y%m%d-%H%M%S";

/// Executable plus the leading arguments that select the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerProgram {
    pub program: String,
    pub base_args: Vec<String>,
}

impl RunnerProgram {
    pub fn new(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }
}

impl Default for RunnerProgram {
    fn default() -> Self {
        Self::new("python3", vec!["-m".into(), "robot".into()])
    }
}

/// Everything needed to launch one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub program: String,
    pub args: Vec<String>,
    pub output_dir: PathBuf,
    pub artifacts: BTreeMap<String, String>,
}

impl RunPlan {
    /// Space-joined command line, for logging only.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the plan for `request`: create the output directory, load settings
/// and assemble the argument list.
pub fn plan_run(
    runner: &RunnerProgram,
    output_root: &Path,
    request: &RunRequest,
    now: DateTime<Local>,
) -> Result<RunPlan, RunError> {
    let output_dir = prepare_output_dir(output_root, request.project_name(), now)?;
    let settings = load_settings(request.settings_dir.as_deref().map(Path::new));
    let target = target_path(&request.target_root, request.target_name.as_deref());
    let args = build_args(
        &runner.base_args,
        &output_dir,
        &settings,
        &request.selected_cases(),
        &target,
    );

    Ok(RunPlan {
        program: runner.program.clone(),
        args,
        artifacts: artifact_paths(&output_dir),
        output_dir,
    })
}

/// `<root>/<project>/<YYYYMMDD-HHMMSS>`, without touching the filesystem.
pub fn output_dir_for(root: &Path, project: &str, now: DateTime<Local>) -> PathBuf {
    root.join(sanitize_component(project))
        .join(now.format(RUN_DIR_STAMP).to_string())
}

/// Compute and create the per-run output directory. A relative root is
/// resolved against the current directory, so reported artifact paths are
/// always absolute.
pub fn prepare_output_dir(
    root: &Path,
    project: &str,
    now: DateTime<Local>,
) -> Result<PathBuf, RunError> {
    let dir = output_dir_for(root, project, now);
    let dir = std::path::absolute(&dir).map_err(|source| RunError::OutputDir {
        path: dir.clone(),
        source,
    })?;
    std::fs::create_dir_all(&dir).map_err(|source| RunError::OutputDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}

pub fn artifact_paths(dir: &Path) -> BTreeMap<String, String> {
    ARTIFACT_FILES
        .iter()
        .map(|(key, file)| (key.to_string(), dir.join(file).to_string_lossy().into_owned()))
        .collect()
}

/// Target root, joined with the sub-target when one is given.
pub fn target_path(root: &str, name: Option<&str>) -> PathBuf {
    let root = Path::new(root);
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => root.join(name),
        None => root.to_path_buf(),
    }
}

pub fn build_args(
    base_args: &[String],
    output_dir: &Path,
    settings: &Settings,
    cases: &[&str],
    target: &Path,
) -> Vec<String> {
    let mut args = base_args.to_vec();
    args.push("--outputdir".into());
    args.push(output_dir.to_string_lossy().into_owned());
    for (flag, (_, file)) in ["--report", "--log", "--xunit", "--output"]
        .iter()
        .zip(ARTIFACT_FILES)
    {
        args.push(flag.to_string());
        args.push(file.to_string());
    }
    for (key, value) in settings {
        args.push("--variable".into());
        args.push(format!("{key}:{value}"));
    }
    for case in cases.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        args.push("--test".into());
        args.push(case.to_string());
    }
    args.push(target.to_string_lossy().into_owned());
    args
}

/// Keep a project name to a single safe path component.
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim() {
        "" | "." | ".." => "default".to_string(),
        other => other.to_string(),
    }
}
