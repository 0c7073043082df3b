//! Doctor command implementation.

use std::path::Path;

use anyhow::Result;
use beans_lib::id;
use beans_lib::links::find_existing_cycles;
use beans_lib::{GraphStore, LinkType, Snapshot, Warning};
use serde::Serialize;

use crate::config::{self, CliOverrides, Config};
use crate::validation::RecordValidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
struct DoctorReport {
    ok: bool,
    checks: Vec<CheckResult>,
}

fn push_check(
    checks: &mut Vec<CheckResult>,
    name: &str,
    status: CheckStatus,
    message: Option<String>,
    details: Vec<String>,
) {
    checks.push(CheckResult {
        name: name.to_string(),
        status,
        message,
        details,
    });
}

/// Push `Ok` when `problems` is empty, otherwise `status` with a count.
fn push_findings(
    checks: &mut Vec<CheckResult>,
    name: &str,
    status: CheckStatus,
    what: &str,
    problems: Vec<String>,
) {
    if problems.is_empty() {
        push_check(checks, name, CheckStatus::Ok, None, Vec::new());
    } else {
        let message = format!("{} {what}", problems.len());
        push_check(checks, name, status, Some(message), problems);
    }
}

fn has_error(checks: &[CheckResult]) -> bool {
    checks
        .iter()
        .any(|check| matches!(check.status, CheckStatus::Error))
}

fn print_report(report: &DoctorReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    println!("beans doctor");
    for check in &report.checks {
        let label = match check.status {
            CheckStatus::Ok => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Error => "ERROR",
        };
        if let Some(message) = &check.message {
            println!("{label} {}: {}", check.name, message);
        } else {
            println!("{label} {}", check.name);
        }
        for detail in &check.details {
            println!("    {detail}");
        }
    }
    Ok(())
}

fn check_load_warnings(warnings: &[Warning], checks: &mut Vec<CheckResult>) {
    let mut unreadable = Vec::new();
    let mut duplicates = Vec::new();
    for warning in warnings {
        match warning {
            Warning::UnreadableFile { .. } => unreadable.push(warning.to_string()),
            Warning::DuplicateId { .. } => duplicates.push(warning.to_string()),
            _ => {}
        }
    }
    push_findings(
        checks,
        "files.readable",
        CheckStatus::Error,
        "file(s) could not be parsed",
        unreadable,
    );
    push_findings(
        checks,
        "ids.unique",
        CheckStatus::Error,
        "duplicate id(s)",
        duplicates,
    );
}

fn check_links(snapshot: &Snapshot, checks: &mut Vec<CheckResult>) {
    let mut dangling = Vec::new();
    let mut parents = Vec::new();
    for record in snapshot.iter() {
        for (link_type, target) in record.links.iter() {
            if snapshot.get(target).is_none() {
                dangling.push(format!("{} {link_type} {target}", record.id));
            }
        }
        let parent_count = record.links.targets(&LinkType::Parent).len();
        if parent_count > 1 {
            parents.push(format!("{} has {parent_count} parents", record.id));
        }
    }
    push_findings(
        checks,
        "links.dangling",
        CheckStatus::Warn,
        "link(s) to missing beans",
        dangling,
    );
    push_findings(
        checks,
        "links.parent",
        CheckStatus::Error,
        "bean(s) with more than one parent",
        parents,
    );

    let cycles: Vec<String> = find_existing_cycles(snapshot, snapshot.iter())
        .into_iter()
        .map(|cycle| format!("{}: {}", cycle.link_type, cycle.path.join(" -> ")))
        .collect();
    push_findings(
        checks,
        "links.cycles",
        CheckStatus::Error,
        "cycle(s)",
        cycles,
    );
}

fn check_filenames(snapshot: &Snapshot, checks: &mut Vec<CheckResult>) {
    let legacy: Vec<String> = snapshot
        .iter()
        .filter(|record| {
            record
                .path
                .file_name()
                .is_some_and(|name| id::filename_form(&name.to_string_lossy()).is_legacy())
        })
        .map(|record| record.path.display().to_string())
        .collect();
    push_findings(
        checks,
        "filenames.canonical",
        CheckStatus::Warn,
        "legacy filename(s) (run `beans migrate`)",
        legacy,
    );
}

fn check_values(snapshot: &Snapshot, config: &Config, checks: &mut Vec<CheckResult>) {
    let validator = RecordValidator::new(config);
    let mut problems = Vec::new();
    for record in snapshot.iter() {
        let results = [
            validator.check_status(&record.status),
            if record.record_type.is_empty() {
                Ok(())
            } else {
                validator.check_type(&record.record_type)
            },
            if record.priority.is_empty() {
                Ok(())
            } else {
                validator.check_priority(&record.priority)
            },
        ];
        for err in results.into_iter().filter_map(std::result::Result::err) {
            problems.push(format!("{}: {}", record.id, err.message));
        }
    }
    push_findings(
        checks,
        "values.configured",
        CheckStatus::Warn,
        "value(s) outside the configured sets",
        problems,
    );
}

/// Run every check against the store at `beans_dir`.
fn collect_checks(beans_dir: &Path, config: &Config) -> Vec<CheckResult> {
    let mut checks = Vec::new();

    if !beans_dir.is_dir() {
        push_check(
            &mut checks,
            "beans.dir",
            CheckStatus::Error,
            Some(format!("Missing beans directory {}", beans_dir.display())),
            Vec::new(),
        );
        return checks;
    }
    push_check(&mut checks, "beans.dir", CheckStatus::Ok, None, Vec::new());

    let store = match GraphStore::open(beans_dir) {
        Ok(outcome) => {
            let (store, warnings) = outcome.into_parts();
            check_load_warnings(&warnings, &mut checks);
            store
        }
        Err(err) => {
            push_check(
                &mut checks,
                "beans.load",
                CheckStatus::Error,
                Some(format!("Failed to load beans: {err}")),
                Vec::new(),
            );
            return checks;
        }
    };

    let snapshot = store.all();
    check_links(&snapshot, &mut checks);
    check_filenames(&snapshot, &mut checks);
    check_values(&snapshot, config, &mut checks);
    checks
}

/// Execute the doctor command. Exits with status 1 if any check fails.
///
/// # Errors
///
/// Returns an error if the working directory cannot be read or the report
/// cannot be serialized.
pub fn execute(json: bool, overrides: &CliOverrides) -> Result<()> {
    let cwd = std::env::current_dir()?;

    let checks = match config::resolve(overrides, &cwd) {
        Ok(resolved) => {
            let mut checks = Vec::new();
            let message = resolved
                .config_file
                .as_ref()
                .map_or_else(|| "using defaults".to_string(), |p| p.display().to_string());
            push_check(&mut checks, "config", CheckStatus::Ok, Some(message), Vec::new());
            checks.extend(collect_checks(&resolved.beans_dir, &resolved.config));
            checks
        }
        Err(err) => {
            let mut checks = Vec::new();
            push_check(
                &mut checks,
                "config",
                CheckStatus::Error,
                Some(err.to_string()),
                Vec::new(),
            );
            checks
        }
    };

    let report = DoctorReport {
        ok: !has_error(&checks),
        checks,
    };
    print_report(&report, json)?;

    if !report.ok {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn find_check<'a>(checks: &'a [CheckResult], name: &str) -> &'a CheckResult {
        checks
            .iter()
            .find(|check| check.name == name)
            .expect("check present")
    }

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_missing_dir_is_error() {
        let temp = TempDir::new().unwrap();
        let checks = collect_checks(&temp.path().join("absent"), &Config::default());
        assert!(has_error(&checks));
        assert_eq!(find_check(&checks, "beans.dir").status, CheckStatus::Error);
    }

    #[test]
    fn test_clean_store_passes() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "a1--first.md",
            "---\ntitle: First\nstatus: open\ntype: task\n---\n",
        );
        let checks = collect_checks(temp.path(), &Config::default());
        assert!(!has_error(&checks));
        assert!(checks.iter().all(|c| c.status == CheckStatus::Ok));
    }

    #[test]
    fn test_detects_cycle_and_corrupt_file() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "a1--a.md",
            "---\ntitle: A\nstatus: open\nlinks:\n  blocks: [b1]\n---\n",
        );
        write(
            temp.path(),
            "b1--b.md",
            "---\ntitle: B\nstatus: open\nlinks:\n  blocks: [a1]\n---\n",
        );
        write(temp.path(), "c1--c.md", "---\ntitle: [unclosed\n---\n");

        let checks = collect_checks(temp.path(), &Config::default());
        assert!(has_error(&checks));
        assert_eq!(find_check(&checks, "links.cycles").status, CheckStatus::Error);
        assert_eq!(find_check(&checks, "files.readable").status, CheckStatus::Error);
    }

    #[test]
    fn test_warnings_do_not_fail() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "a1.legacy.md",
            "---\ntitle: Legacy\nstatus: someday\nlinks:\n  relates: [ghost]\n---\n",
        );
        let checks = collect_checks(temp.path(), &Config::default());
        assert!(!has_error(&checks));
        assert_eq!(find_check(&checks, "links.dangling").status, CheckStatus::Warn);
        assert_eq!(
            find_check(&checks, "filenames.canonical").status,
            CheckStatus::Warn
        );
        assert_eq!(
            find_check(&checks, "values.configured").status,
            CheckStatus::Warn
        );
    }
}
