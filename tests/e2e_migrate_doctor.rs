mod common;
use common::cli::{BeansWorkspace, run_beans};
use std::fs;

fn init_with_files(files: &[(&str, &str)]) -> BeansWorkspace {
    let workspace = BeansWorkspace::new();
    let output = run_beans(&workspace, ["init"], "init");
    assert!(output.status.success(), "init failed: {}", output.stderr);
    for (name, contents) in files {
        fs::write(workspace.beans_dir().join(name), contents).unwrap();
    }
    workspace
}

#[test]
fn test_migrate_renames_legacy_files() {
    let workspace = init_with_files(&[
        ("ab12.old-style.md", "---\ntitle: Old Style\nstatus: open\n---\n"),
        ("cd34--fine.md", "---\ntitle: Fine\nstatus: open\n---\n"),
    ]);

    let dry = run_beans(&workspace, ["migrate", "--dry-run"], "dry_run");
    assert!(dry.status.success(), "dry run failed: {}", dry.stderr);
    assert!(dry.stdout.contains("Would rename"));
    assert!(workspace.beans_dir().join("ab12.old-style.md").exists());

    let run = run_beans(&workspace, ["migrate", "--json"], "migrate");
    assert!(run.status.success(), "migrate failed: {}", run.stderr);
    let json = run.json();
    assert_eq!(json["count"], 1);
    assert!(!workspace.beans_dir().join("ab12.old-style.md").exists());

    let show = run_beans(&workspace, ["show", "ab12", "--json"], "show").json();
    assert_eq!(show["bean"]["title"], "Old Style");
}

#[test]
fn test_doctor_passes_on_clean_store() {
    let workspace = init_with_files(&[("ab12--ok.md", "---\ntitle: Ok\nstatus: open\n---\n")]);
    let output = run_beans(&workspace, ["doctor", "--json"], "doctor");
    assert!(output.status.success(), "doctor failed: {}", output.stdout);
    assert_eq!(output.json()["ok"], true);
}

#[test]
fn test_doctor_fails_on_cycle() {
    let workspace = init_with_files(&[
        (
            "ab12--a.md",
            "---\ntitle: A\nstatus: open\nlinks:\n  parent: cd34\n---\n",
        ),
        (
            "cd34--b.md",
            "---\ntitle: B\nstatus: open\nlinks:\n  parent: ab12\n---\n",
        ),
    ]);
    let output = run_beans(&workspace, ["doctor"], "doctor");
    assert!(!output.status.success());
    assert!(output.stdout.contains("ERROR links.cycles"));
}

#[test]
fn test_corrupt_file_is_skipped_with_warning() {
    let workspace = init_with_files(&[
        ("ab12--ok.md", "---\ntitle: Ok\nstatus: open\n---\n"),
        ("zz99--bad.md", "---\ntitle: [unclosed\n---\n"),
    ]);
    let output = run_beans(&workspace, ["list", "--json"], "list");
    assert!(output.status.success(), "list failed: {}", output.stderr);
    assert!(output.stderr.contains("warning"));
    assert_eq!(output.json()["count"], 1);
}
