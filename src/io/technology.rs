//! Technology Detector (C4): from file content and manifest files, detect
//! frameworks/libraries per category.
//!
//! Pattern tables grounded on
//! `codegates/core/gate_validators/base.py::_get_technology_patterns`,
//! carried as first-class Rust data per SPEC_FULL §C.1 rather than
//! rebuilt per validator call.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::model::{FileRecord, Language};

/// Maximum number of files sampled per language when probing for a
/// technology signature, keeping detection cost O(files) rather than
/// O(files * technologies).
const SAMPLE_SIZE: usize = 40;

struct TechPattern {
    category: &'static str,
    technology: &'static str,
    pattern: &'static str,
}

static TECH_TABLE: Lazy<HashMap<Language, Vec<TechPattern>>> = Lazy::new(|| {
    let mut map = HashMap::new();

    map.insert(
        Language::Python,
        vec![
            TechPattern { category: "logging", technology: "structlog", pattern: r"import\s+structlog" },
            TechPattern { category: "logging", technology: "loguru", pattern: r"from\s+loguru\s+import" },
            TechPattern { category: "logging", technology: "stdlib-logging", pattern: r"import\s+logging" },
            TechPattern { category: "web_frameworks", technology: "flask", pattern: r"from\s+flask\s+import|Flask\(" },
            TechPattern { category: "web_frameworks", technology: "django", pattern: r"from\s+django" },
            TechPattern { category: "web_frameworks", technology: "fastapi", pattern: r"from\s+fastapi\s+import|FastAPI\(" },
            TechPattern { category: "async", technology: "asyncio", pattern: r"import\s+asyncio|async\s+def" },
            TechPattern { category: "async", technology: "celery", pattern: r"from\s+celery\s+import|Celery\(" },
            TechPattern { category: "testing", technology: "pytest", pattern: r"import\s+pytest" },
            TechPattern { category: "testing", technology: "unittest", pattern: r"import\s+unittest" },
            TechPattern { category: "database", technology: "sqlalchemy", pattern: r"from\s+sqlalchemy" },
            TechPattern { category: "monitoring", technology: "prometheus-client", pattern: r"prometheus_client" },
            TechPattern { category: "monitoring", technology: "sentry", pattern: r"sentry_sdk" },
        ],
    );

    map.insert(
        Language::Javascript,
        vec![
            TechPattern { category: "logging", technology: "winston", pattern: r#"require\(['"]winston['"]\)|from\s+['"]winston['"]"# },
            TechPattern { category: "logging", technology: "pino", pattern: r#"require\(['"]pino['"]\)|from\s+['"]pino['"]"# },
            TechPattern { category: "web_frameworks", technology: "express", pattern: r#"require\(['"]express['"]\)|from\s+['"]express['"]"# },
            TechPattern { category: "web_frameworks", technology: "koa", pattern: r#"require\(['"]koa['"]\)"# },
            TechPattern { category: "async", technology: "bull", pattern: r#"require\(['"]bull['"]\)"# },
            TechPattern { category: "testing", technology: "jest", pattern: r"describe\(|test\(|it\(" },
            TechPattern { category: "testing", technology: "mocha", pattern: r#"require\(['"]mocha['"]\)"# },
            TechPattern { category: "database", technology: "mongoose", pattern: r#"require\(['"]mongoose['"]\)"# },
            TechPattern { category: "monitoring", technology: "newrelic", pattern: r#"require\(['"]newrelic['"]\)"# },
            TechPattern { category: "frontend", technology: "react", pattern: r#"from\s+['"]react['"]|require\(['"]react['"]\)"# },
            TechPattern { category: "frontend", technology: "vue", pattern: r#"from\s+['"]vue['"]"# },
        ],
    );
    map.insert(Language::Typescript, map.get(&Language::Javascript).unwrap().iter().map(|t| TechPattern { category: t.category, technology: t.technology, pattern: t.pattern }).collect());

    map.insert(
        Language::Java,
        vec![
            TechPattern { category: "logging", technology: "slf4j", pattern: r"org\.slf4j" },
            TechPattern { category: "logging", technology: "log4j", pattern: r"org\.apache\.logging\.log4j" },
            TechPattern { category: "web_frameworks", technology: "spring", pattern: r"org\.springframework" },
            TechPattern { category: "testing", technology: "junit", pattern: r"org\.junit" },
            TechPattern { category: "testing", technology: "mockito", pattern: r"org\.mockito" },
            TechPattern { category: "database", technology: "hibernate", pattern: r"org\.hibernate" },
            TechPattern { category: "monitoring", technology: "micrometer", pattern: r"io\.micrometer" },
            TechPattern { category: "async", technology: "reactor", pattern: r"reactor\.core" },
        ],
    );

    map.insert(
        Language::Csharp,
        vec![
            TechPattern { category: "logging", technology: "serilog", pattern: r"using\s+Serilog" },
            TechPattern { category: "logging", technology: "microsoft-extensions-logging", pattern: r"Microsoft\.Extensions\.Logging" },
            TechPattern { category: "web_frameworks", technology: "aspnetcore", pattern: r"Microsoft\.AspNetCore" },
            TechPattern { category: "testing", technology: "xunit", pattern: r"using\s+Xunit" },
            TechPattern { category: "testing", technology: "nunit", pattern: r"using\s+NUnit" },
            TechPattern { category: "database", technology: "entityframework", pattern: r"Microsoft\.EntityFrameworkCore" },
            TechPattern { category: "monitoring", technology: "applicationinsights", pattern: r"Microsoft\.ApplicationInsights" },
        ],
    );

    let dotnet = map.get(&Language::Csharp).unwrap().iter().map(|t| TechPattern { category: t.category, technology: t.technology, pattern: t.pattern }).collect();
    map.insert(Language::Dotnet, dotnet);

    map
});

static COMPILED: Lazy<HashMap<Language, Vec<(Regex, &'static str, &'static str)>>> = Lazy::new(|| {
    TECH_TABLE
        .iter()
        .map(|(lang, patterns)| {
            let compiled = patterns
                .iter()
                .filter_map(|p| {
                    RegexBuilderLite::build(p.pattern).map(|re| (re, p.category, p.technology))
                })
                .collect();
            (*lang, compiled)
        })
        .collect()
});

struct RegexBuilderLite;
impl RegexBuilderLite {
    fn build(pattern: &str) -> Option<Regex> {
        regex::RegexBuilder::new(pattern).case_insensitive(true).build().ok()
    }
}

/// Detected technologies grouped by category, deduplicated, for one language.
pub type TechnologyMap = HashMap<String, Vec<String>>;

/// Manifest files checked as a fallback when no sampled source file carries
/// a technology's signature, per spec §4.4 ("any pattern matches any file
/// content or any configured manifest file"), grounded on
/// `codegates/core/gate_validators/base.py::_detect_technologies`'s
/// config-file fallback block.
const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pom.xml",
    "build.gradle",
    "build.gradle.kts",
    "Gemfile",
    "composer.json",
    "project.json",
];

/// Read every manifest file present at `root`. `*.csproj` is matched by
/// extension, as in the original, since .NET project files are named after
/// the project rather than a fixed name.
pub(crate) fn manifest_contents(root: &Path) -> Vec<String> {
    let mut contents: Vec<String> = MANIFEST_FILES
        .iter()
        .filter_map(|name| std::fs::read_to_string(root.join(name)).ok())
        .collect();

    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".csproj") {
                if let Ok(content) = std::fs::read_to_string(entry.path()) {
                    contents.push(content);
                }
            }
        }
    }

    contents
}

/// Detect technologies present for `language`, sampling at most
/// [`SAMPLE_SIZE`] files of that language under `root`, then falling back
/// to manifest files for any technology no sampled file's content matched.
pub fn detect_technologies(root: &Path, language: Language, files: &[FileRecord]) -> TechnologyMap {
    let Some(patterns) = COMPILED.get(&language) else {
        return TechnologyMap::new();
    };

    let mut found: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
    let sample: Vec<&FileRecord> = files
        .iter()
        .filter(|f| f.language == Some(language))
        .take(SAMPLE_SIZE)
        .collect();

    for file in sample {
        let Ok(content) = std::fs::read_to_string(root.join(&file.relative_path)) else {
            continue;
        };
        for (re, category, technology) in patterns {
            if re.is_match(&content) {
                found.entry(category).or_default().insert(technology);
            }
        }
    }

    let manifests = manifest_contents(root);
    if !manifests.is_empty() {
        for (re, category, technology) in patterns {
            let already_found = found.get(category).map(|s| s.contains(technology)).unwrap_or(false);
            if already_found {
                continue;
            }
            if manifests.iter().any(|content| re.is_match(content)) {
                found.entry(category).or_default().insert(technology);
            }
        }
    }

    found
        .into_iter()
        .map(|(category, techs)| {
            let mut list: Vec<String> = techs.into_iter().map(|s| s.to_string()).collect();
            list.sort();
            (category.to_string(), list)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn detects_flask_and_pytest() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("app.py"),
            "from flask import Flask\napp = Flask(__name__)\n",
        )
        .unwrap();
        fs::write(dir.path().join("test_app.py"), "import pytest\n").unwrap();

        let files = vec![
            FileRecord { relative_path: "app.py".into(), language: Some(Language::Python), size_bytes: 10, line_count: 2 },
            FileRecord { relative_path: "test_app.py".into(), language: Some(Language::Python), size_bytes: 10, line_count: 1 },
        ];

        let tech = detect_technologies(dir.path(), Language::Python, &files);
        assert!(tech.get("web_frameworks").unwrap().contains(&"flask".to_string()));
        assert!(tech.get("testing").unwrap().contains(&"pytest".to_string()));
    }

    #[test]
    fn unknown_language_returns_empty() {
        let tech = detect_technologies(Path::new("."), Language::Dotnet, &[]);
        assert!(tech.is_empty() || tech.values().all(|v| v.is_empty()));
    }
}
