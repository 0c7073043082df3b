use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::ExitStatus;

use assert_cmd::Command;
use tempfile::TempDir;

/// A scratch project directory for running `beans` against.
pub struct BeansWorkspace {
    _temp_dir: TempDir,
    pub root: PathBuf,
}

impl BeansWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let root = dunce::canonicalize(temp_dir.path()).expect("canonical temp dir");
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn beans_dir(&self) -> PathBuf {
        self.root.join(".beans")
    }
}

pub struct CmdOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }
}

/// Run `beans` in the workspace root. `label` names the step in failure
/// output.
pub fn run_beans<I, S>(workspace: &BeansWorkspace, args: I, label: &str) -> CmdOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_beans_with_stdin(workspace, args, "", label)
}

pub fn run_beans_with_stdin<I, S>(
    workspace: &BeansWorkspace,
    args: I,
    stdin: &str,
    label: &str,
) -> CmdOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::cargo_bin("beans")
        .expect("beans binary")
        .current_dir(&workspace.root)
        .env_remove("BEANS_PATH")
        .env("RUST_LOG", "off")
        .args(args)
        .write_stdin(stdin)
        .output()
        .unwrap_or_else(|e| panic!("{label}: failed to run beans: {e}"));

    CmdOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}

/// Create a bean with `--json` and return its id.
pub fn create_bean(workspace: &BeansWorkspace, args: &[&str]) -> String {
    let mut full = vec!["create", "--json"];
    full.extend_from_slice(args);
    let output = run_beans(workspace, &full, "create");
    assert!(output.status.success(), "create failed: {}", output.stderr);
    output.json()["bean"]["id"]
        .as_str()
        .expect("id in create output")
        .to_string()
}
