//! Structural tests for layer boundary enforcement.
//!
//! These tests scan source files to verify that the domain and application
//! layers stay free of infrastructure.

use std::path::{Path, PathBuf};

/// Collect all `.rs` files under a directory recursively.
fn collect_rs_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(collect_rs_files(&path));
            } else if path.extension().and_then(|e| e.to_str()) == Some("rs") {
                files.push(path);
            }
        }
    }
    files
}

/// Read a file and strip comment lines to avoid false positives.
fn read_non_comment_lines(path: &Path) -> Vec<String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .filter(|l| {
            let trimmed = l.trim();
            !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*')
        })
        .map(String::from)
        .collect()
}

/// Track brace depth and return whether a line is inside a `#[cfg(test)]` block.
struct CfgTestTracker {
    in_test_block: bool,
    brace_depth: i32,
    test_block_start_depth: i32,
}

impl CfgTestTracker {
    fn new() -> Self {
        Self {
            in_test_block: false,
            brace_depth: 0,
            test_block_start_depth: 0,
        }
    }

    /// Process a line and return `true` if it's inside a `#[cfg(test)]` block.
    fn process_line(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.contains("#[cfg(test)]") {
            self.in_test_block = true;
            self.test_block_start_depth = self.brace_depth;
        }
        for ch in line.chars() {
            match ch {
                '{' => self.brace_depth += 1,
                '}' => {
                    self.brace_depth -= 1;
                    if self.in_test_block && self.brace_depth <= self.test_block_start_depth {
                        self.in_test_block = false;
                    }
                }
                _ => {}
            }
        }
        self.in_test_block
    }
}

fn src_dir(parts: &[&str]) -> PathBuf {
    let mut dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("src");
    for part in parts {
        dir = dir.join(part);
    }
    dir
}

/// Every non-comment line under `dir` containing one of `needles`.
fn find_lines(dir: &Path, needles: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in collect_rs_files(dir) {
        let rel = file
            .strip_prefix(env!("CARGO_MANIFEST_DIR"))
            .unwrap_or(&file)
            .display()
            .to_string();
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if needles.iter().any(|n| line.contains(n)) {
                violations.push(format!("{rel}:{}: {line}", i + 1));
            }
        }
    }
    violations
}

#[test]
fn domain_has_no_outer_layer_imports() {
    let violations = find_lines(
        &src_dir(&["domain"]),
        &["crate::application", "crate::infra", "crate::commands", "tokio::"],
    );
    assert!(
        violations.is_empty(),
        "domain/ must stay pure:\n{}",
        violations.join("\n")
    );
}

#[test]
fn application_has_no_infra_imports() {
    let violations = find_lines(
        &src_dir(&["application"]),
        &["crate::infra", "crate::commands", "crate::app::"],
    );
    assert!(
        violations.is_empty(),
        "application/ must depend on ports, not infra/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn infra_has_no_imports_from_commands() {
    let violations = find_lines(&src_dir(&["infra"]), &["crate::commands", "crate::cli"]);
    assert!(
        violations.is_empty(),
        "infra/ must not import from commands/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_concrete_infra_types_in_service_signatures() {
    let concrete_types = [
        "TokioCommandRunner",
        "HostFs",
        "DistroPackageManager",
        "FileTrackerStore",
        "SystemNetwork",
    ];
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir(&["application", "services"])) {
        for (i, line) in read_non_comment_lines(&file).iter().enumerate() {
            if !line.contains("fn ") {
                continue;
            }
            for concrete in &concrete_types {
                if line.contains(concrete) {
                    violations.push(format!("{}:{}: {line}", file.display(), i + 1));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "Found concrete infra types in service signatures; use port traits:\n{}",
        violations.join("\n")
    );
}

#[test]
fn no_print_macros_below_commands() {
    let mut violations = Vec::new();
    for dir in [src_dir(&["application"]), src_dir(&["infra"]), src_dir(&["domain"])] {
        for file in collect_rs_files(&dir) {
            let Ok(content) = std::fs::read_to_string(&file) else {
                continue;
            };
            let mut tracker = CfgTestTracker::new();
            for (i, line) in content.lines().enumerate() {
                let in_test = tracker.process_line(line);
                if in_test || line.trim().starts_with("//") {
                    continue;
                }
                if line.contains("println!") || line.contains("eprintln!") {
                    violations.push(format!("{}:{}: {line}", file.display(), i + 1));
                }
            }
        }
    }
    assert!(
        violations.is_empty(),
        "use tracing instead of print macros outside commands/:\n{}",
        violations.join("\n")
    );
}

#[test]
fn command_handlers_accept_app_context() {
    let mut violations = Vec::new();
    for file in collect_rs_files(&src_dir(&["commands"])) {
        let Ok(content) = std::fs::read_to_string(&file) else {
            continue;
        };
        if content.contains("pub async fn run(") && !content.contains("app: &AppContext") {
            violations.push(file.display().to_string());
        }
    }
    assert!(
        violations.is_empty(),
        "command handlers must take `app: &AppContext`:\n{}",
        violations.join("\n")
    );
}
