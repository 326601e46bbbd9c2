//! Filename-keyword classifiers used by the expected-count heuristics
//! (spec §4.5's "business_files", "service_files", etc.). Each classifier
//! is a pure function over [`FileRecord`]s so the heuristics remain
//! unit-testable without a filesystem.

use crate::core::model::FileRecord;

fn stem_contains(path: &str, keywords: &[&str]) -> bool {
    let lower = path.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

pub fn is_business_file(file: &FileRecord) -> bool {
    stem_contains(&file.relative_path, &["service", "controller", "handler", "usecase", "domain"])
}

pub fn is_service_file(file: &FileRecord) -> bool {
    stem_contains(&file.relative_path, &["service", "client", "gateway"])
}

pub fn is_api_file(file: &FileRecord) -> bool {
    stem_contains(&file.relative_path, &["controller", "router", "route", "api", "endpoint", "handler"])
}

pub fn is_io_file(file: &FileRecord) -> bool {
    stem_contains(&file.relative_path, &["client", "repository", "gateway", "io", "storage", "db"])
}

pub fn is_external_file(file: &FileRecord) -> bool {
    stem_contains(&file.relative_path, &["client", "gateway", "adapter", "integration", "connector"])
}

pub fn is_job_file(file: &FileRecord) -> bool {
    stem_contains(&file.relative_path, &["worker", "job", "task", "scheduler", "consumer", "queue"])
}

pub fn is_ui_file(file: &FileRecord) -> bool {
    let lower = file.relative_path.to_lowercase();
    lower.ends_with(".html")
        || lower.ends_with(".css")
        || lower.ends_with(".jsx")
        || lower.ends_with(".tsx")
        || lower.ends_with(".vue")
        || lower.ends_with(".svelte")
        || stem_contains(&file.relative_path, &["component", "view", "page", "screen"])
}

pub fn is_test_file(file: &FileRecord) -> bool {
    stem_contains(&file.relative_path, &["test", "spec", "_tests", "tests/"])
}

pub fn is_non_test_source_file(file: &FileRecord) -> bool {
    file.language.is_some() && !is_test_file(file)
}

pub fn count<F: Fn(&FileRecord) -> bool>(files: &[FileRecord], predicate: F) -> usize {
    files.iter().filter(|f| predicate(f)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::Language;

    fn file(path: &str) -> FileRecord {
        FileRecord {
            relative_path: path.to_string(),
            language: Some(Language::Python),
            size_bytes: 100,
            line_count: 10,
        }
    }

    #[test]
    fn classifies_by_keyword() {
        assert!(is_api_file(&file("src/controllers/user_controller.py")));
        assert!(is_job_file(&file("src/workers/email_worker.py")));
        assert!(is_ui_file(&file("src/components/Button.tsx")));
        assert!(is_test_file(&file("tests/test_user.py")));
        assert!(!is_non_test_source_file(&file("tests/test_user.py")));
    }

    #[test]
    fn count_applies_predicate() {
        let files = vec![file("a_service.py"), file("b_controller.py"), file("plain.py")];
        assert_eq!(count(&files, is_service_file), 1);
        assert_eq!(count(&files, is_api_file), 1);
    }
}
