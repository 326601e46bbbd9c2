//! Applicability Engine (C7): decide whether a gate applies to a
//! repository before its validator is ever invoked, per spec §4.7.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::model::{FileRecord, GateKind};
use crate::gates::classifiers::is_ui_file;
use crate::io::technology::{manifest_contents, TechnologyMap};

static UI_CONTENT_SIGNATURES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // web frameworks
        r"import\s+React",
        r"from\s+['\x22]react['\x22]",
        r"from\s+['\x22]vue['\x22]",
        r"@angular/core",
        r"from\s+['\x22]svelte['\x22]",
        // mobile
        r"import\s+SwiftUI",
        r"import\s+UIKit",
        r"package:flutter/material\.dart",
        r"android\.widget\.",
        r"androidx\.compose\.",
        // desktop
        r#"require\(['\x22]electron['\x22]\)|from\s+['\x22]electron['\x22]"#,
        r"#include\s*<Q(Application|Widget|MainWindow)>",
        r"System\.Windows\.Controls|PresentationFramework",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static UI signature pattern must compile"))
    .collect()
});

/// Package-manifest signatures for UI evidence, per spec §4.7's "a package
/// manifest referencing a UI package" clause. Checked against every
/// manifest file's raw content, the same fallback surface
/// [`crate::io::technology::detect_technologies`] uses.
static UI_MANIFEST_SIGNATURES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""react"\s*:"#,
        r#""react-dom"\s*:"#,
        r#""vue"\s*:"#,
        r#""@angular/core"\s*:"#,
        r#""svelte"\s*:"#,
        r#""electron"\s*:"#,
        r"(?i)flutter",
        r"(?i)compose-ui|jetpack\.compose",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static UI manifest signature pattern must compile"))
    .collect()
});

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[a-zA-Z][\w-]*[^>]*>").expect("static pattern"));

static BACKGROUND_JOB_SIGNATURES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)celery",
        r"(?i)bullmq|bull\b",
        r"(?i)sidekiq",
        r"(?i)quartz",
        r"(?i)hangfire",
        r"(?i)\basync\s+def\b",
        r"(?i)@scheduled",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static background-job signature pattern must compile"))
    .collect()
});

const UI_DIRECTORIES: &[&str] = &["components", "views", "pages", "screens", "ui"];

/// Whether `gate` applies to this repository, given its walked files and
/// detected technologies. Gates other than the two UI gates and the
/// background-jobs gate are unconditionally applicable.
pub fn is_applicable(gate: GateKind, root: &std::path::Path, files: &[FileRecord], technologies: &TechnologyMap) -> bool {
    match gate {
        GateKind::UiErrors | GateKind::UiErrorTools => has_ui_evidence(root, files, technologies),
        GateKind::LogBackgroundJobs => has_background_job_evidence(root, files, technologies),
        _ => true,
    }
}

fn has_ui_evidence(root: &std::path::Path, files: &[FileRecord], technologies: &TechnologyMap) -> bool {
    if files.iter().any(is_ui_file) {
        return true;
    }

    if technologies.get("frontend").map(|v| !v.is_empty()).unwrap_or(false) {
        return true;
    }

    if files
        .iter()
        .any(|f| UI_DIRECTORIES.iter().any(|dir| f.relative_path.contains(&format!("{dir}/"))))
    {
        return true;
    }

    if manifest_contents(root)
        .iter()
        .any(|content| UI_MANIFEST_SIGNATURES.iter().any(|re| re.is_match(content)))
    {
        return true;
    }

    // Sample a handful of files for inline content signatures (HTML tag
    // density guard, frontend-JS guard) without re-walking the tree.
    let sampled = files.iter().take(200);
    for file in sampled {
        let Ok(content) = std::fs::read_to_string(root.join(&file.relative_path)) else {
            continue;
        };
        if file.relative_path.ends_with(".html") && HTML_TAG.find_iter(&content).count() >= 2 {
            return true;
        }
        if UI_CONTENT_SIGNATURES.iter().any(|re| re.is_match(&content)) {
            return true;
        }
    }

    false
}

fn has_background_job_evidence(root: &std::path::Path, files: &[FileRecord], technologies: &TechnologyMap) -> bool {
    if technologies.get("async").map(|v| !v.is_empty()).unwrap_or(false) {
        return true;
    }
    if files.iter().any(|f| crate::gates::classifiers::is_job_file(f)) {
        for file in files.iter().filter(|f| crate::gates::classifiers::is_job_file(f)) {
            if std::fs::read_to_string(root.join(&file.relative_path)).is_ok() {
                return true;
            }
        }
    }
    let sampled = files.iter().take(200);
    for file in sampled {
        let Ok(content) = std::fs::read_to_string(root.join(&file.relative_path)) else {
            continue;
        };
        if BACKGROUND_JOB_SIGNATURES.iter().any(|re| re.is_match(&content)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Language;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn backend_only_repo_has_no_ui_evidence() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("server.py"), "def handler():\n    return 200\n").unwrap();

        let files = vec![FileRecord {
            relative_path: "server.py".into(),
            language: Some(Language::Python),
            size_bytes: 30,
            line_count: 2,
        }];
        let technologies = TechnologyMap::new();

        assert!(!is_applicable(GateKind::UiErrors, dir.path(), &files, &technologies));
        assert!(!is_applicable(GateKind::UiErrorTools, dir.path(), &files, &technologies));
    }

    #[test]
    fn react_component_file_makes_ui_errors_applicable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("App.jsx"), "export default function App() { return null; }\n").unwrap();

        let files = vec![FileRecord {
            relative_path: "App.jsx".into(),
            language: Some(Language::Javascript),
            size_bytes: 50,
            line_count: 1,
        }];
        let technologies = TechnologyMap::new();

        assert!(is_applicable(GateKind::UiErrors, dir.path(), &files, &technologies));
    }

    #[test]
    fn package_json_react_dependency_makes_ui_errors_applicable_without_ui_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"dependencies": {"react": "^18.0.0"}}"#).unwrap();
        fs::write(dir.path().join("server.js"), "console.log('ready')\n").unwrap();

        let files = vec![FileRecord {
            relative_path: "server.js".into(),
            language: Some(Language::Javascript),
            size_bytes: 20,
            line_count: 1,
        }];
        let technologies = TechnologyMap::new();

        assert!(is_applicable(GateKind::UiErrors, dir.path(), &files, &technologies));
    }

    #[test]
    fn no_scheduler_or_async_keywords_means_background_jobs_not_applicable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("server.py"), "def handler():\n    return 200\n").unwrap();

        let files = vec![FileRecord {
            relative_path: "server.py".into(),
            language: Some(Language::Python),
            size_bytes: 30,
            line_count: 2,
        }];
        let technologies: TechnologyMap = HashMap::new();

        assert!(!is_applicable(GateKind::LogBackgroundJobs, dir.path(), &files, &technologies));
    }

    #[test]
    fn non_ui_gates_are_always_applicable() {
        let files: Vec<FileRecord> = Vec::new();
        let technologies = TechnologyMap::new();
        assert!(is_applicable(GateKind::StructuredLogs, std::path::Path::new("."), &files, &technologies));
    }
}
