//! Language detection (C2): classify a repository's languages by extension
//! count, content fingerprint, and manifest-file heuristics.
//!
//! Ported from `codegates/core/language_detector.py`'s extension map and
//! content-signature tables, with the confidence formula taken from
//! spec §4.2 rather than the source (the two differ slightly; the
//! specification is authoritative).

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::errors::Result;
use crate::core::model::Language;
use crate::io::walker::{walk_files, WalkOptions};

const VENDOR_DIRS: &[&str] = &[
    ".git", "node_modules", "__pycache__", ".venv", "venv", "target", "dist", "build", ".idea",
    ".vscode", "vendor", "bin", "obj",
];

struct ContentSignatures {
    patterns: Vec<Regex>,
}

static CONTENT_SIGNATURES: Lazy<HashMap<Language, ContentSignatures>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert(
        Language::Java,
        ContentSignatures {
            patterns: compile(&[r"^\s*package\s+[\w.]+;", r"^\s*import\s+java\.", r"public\s+class\s+\w+"]),
        },
    );
    map.insert(
        Language::Python,
        ContentSignatures {
            patterns: compile(&[r"^\s*import\s+\w+", r"^\s*from\s+\w+\s+import", r"def\s+\w+\s*\("]),
        },
    );
    map.insert(
        Language::Javascript,
        ContentSignatures {
            patterns: compile(&[
                r"^\s*const\s+\w+\s*=\s*require\(",
                r"^\s*import\s+.+\s+from\s+['\x22]",
                r"module\.exports",
            ]),
        },
    );
    map.insert(
        Language::Typescript,
        ContentSignatures {
            patterns: compile(&[
                r":\s*(string|number|boolean|void|any)\b",
                r"^\s*interface\s+\w+",
                r"^\s*export\s+(type|interface)\s+\w+",
            ]),
        },
    );
    map.insert(
        Language::Csharp,
        ContentSignatures {
            patterns: compile(&[r"^\s*namespace\s+[\w.]+", r"^\s*using\s+System", r"public\s+class\s+\w+"]),
        },
    );
    map.insert(
        Language::Dotnet,
        ContentSignatures {
            patterns: compile(&[r"<Project\s+Sdk="]),
        },
    );
    map
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("static language-signature pattern must compile"))
        .collect()
}

fn manifest_files(language: Language) -> &'static [&'static str] {
    match language {
        Language::Java => &["pom.xml", "build.gradle", "build.gradle.kts"],
        Language::Python => &["requirements.txt", "pyproject.toml", "setup.py", "Pipfile"],
        Language::Javascript => &["package.json"],
        Language::Typescript => &["package.json", "tsconfig.json"],
        Language::Csharp => &["*.csproj", "*.sln"],
        Language::Dotnet => &["*.csproj", "global.json"],
    }
}

/// A single detected language with its confidence score and ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    pub language: Language,
    pub confidence: f64,
    pub file_count: usize,
}

/// Detect languages present under `root`, per spec §4.2.
///
/// Output is ordered by descending confidence; `detected[0].language` is
/// the primary language when the list is non-empty.
pub fn detect_languages(root: &Path) -> Result<Vec<DetectedLanguage>> {
    let mut file_counts: HashMap<Language, usize> = HashMap::new();
    let mut content_matches: HashMap<Language, usize> = HashMap::new();
    let mut has_config: HashMap<Language, bool> = HashMap::new();

    let options = WalkOptions {
        exclude_dirs: VENDOR_DIRS.iter().map(|s| s.to_string()).collect(),
        max_file_size: 1_048_576,
        ..WalkOptions::default()
    };

    let top_level_names: Vec<String> = std::fs::read_dir(root)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();

    for language in Language::ALL {
        let matches_any = manifest_files(language).iter().any(|pattern| {
            if let Some(stripped) = pattern.strip_prefix('*') {
                top_level_names.iter().any(|name| name.ends_with(stripped))
            } else {
                top_level_names.iter().any(|name| name == pattern)
            }
        });
        has_config.insert(language, matches_any);
    }

    for file in walk_files(root, &options)? {
        let ext = Path::new(&file.relative_path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let Some(language) = crate::lang::language_for_extension(&ext) else {
            continue;
        };
        *file_counts.entry(language).or_insert(0) += 1;

        if let Ok(content) = std::fs::read(root.join(&file.relative_path)) {
            let head_len = content.len().min(2048);
            let head = String::from_utf8_lossy(&content[..head_len]);
            if let Some(sig) = CONTENT_SIGNATURES.get(&language) {
                let hits = sig.patterns.iter().filter(|re| re.is_match(&head)).count();
                *content_matches.entry(language).or_insert(0) += hits;
            }
        }
    }

    let mut detected: Vec<DetectedLanguage> = Language::ALL
        .into_iter()
        .filter_map(|language| {
            let file_count = *file_counts.get(&language).unwrap_or(&0);
            if file_count == 0 {
                return None;
            }
            let content = *content_matches.get(&language).unwrap_or(&0);
            let config = *has_config.get(&language).unwrap_or(&false);
            let confidence = confidence_score(file_count, content, config);
            Some(DetectedLanguage {
                language,
                confidence,
                file_count,
            })
        })
        .collect();

    let mut retained: Vec<DetectedLanguage> =
        detected.iter().filter(|d| d.confidence >= 30.0).cloned().collect();

    if retained.is_empty() && !detected.is_empty() {
        detected.sort_by(|a, b| b.file_count.cmp(&a.file_count));
        retained.push(detected[0].clone());
    }

    retained.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(retained)
}

fn confidence_score(file_count: usize, content_matches: usize, has_config: bool) -> f64 {
    let raw = 2.0 * file_count as f64 + 3.0 * content_matches as f64 + if has_config { 20.0 } else { 0.0 };
    raw.min(100.0)
}

/// Extension -> count inventory over the walked tree (supplemented feature,
/// `codegates`'s `get_file_extensions`), exposed via `hardgate scan --stats`.
pub fn file_extension_inventory(root: &Path) -> Result<HashMap<String, usize>> {
    let options = WalkOptions {
        exclude_dirs: VENDOR_DIRS.iter().map(|s| s.to_string()).collect(),
        ..WalkOptions::default()
    };
    let mut counts = HashMap::new();
    for file in walk_files(root, &options)? {
        let ext = Path::new(&file.relative_path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| "<none>".to_string());
        *counts.entry(ext).or_insert(0) += 1;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn confidence_formula_matches_spec() {
        assert_eq!(confidence_score(5, 2, true), (2.0 * 5.0 + 3.0 * 2.0 + 20.0));
        assert_eq!(confidence_score(100, 100, true), 100.0);
    }

    #[test]
    fn detects_python_from_extension_and_content() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("main.py"),
            "import os\n\ndef handler():\n    pass\n",
        )
        .unwrap();
        fs::write(dir.path().join("requirements.txt"), "flask\n").unwrap();

        let detected = detect_languages(dir.path()).unwrap();
        assert_eq!(detected[0].language, Language::Python);
        assert!(detected[0].confidence >= 30.0);
    }

    #[test]
    fn falls_back_to_top_file_count_when_none_qualify() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let detected = detect_languages(dir.path()).unwrap();
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].language, Language::Python);
    }
}
