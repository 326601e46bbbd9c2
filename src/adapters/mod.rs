//! Narrow trait contracts for the collaborators this engine treats as
//! explicitly out of scope (§1, §6.2, §6.3): repository acquisition, HTML
//! report rendering, and report storage/listing. Default implementations
//! are provided so the crate runs end-to-end without a real adapter, but
//! none of them perform network I/O or HTML generation themselves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::model::ValidationResult;

/// Failure kinds a repository acquisition adapter may report, spec §6.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    Auth,
    NotFound,
    Network,
    Timeout,
    Ssl,
    Size,
}

#[derive(Debug, Clone)]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// `fetch(url, branch, token?) -> local_path or error`. The core never
/// performs network I/O for repository contents; it only consumes the
/// local path this adapter produces.
#[async_trait]
pub trait RepositoryFetcher: Send + Sync {
    async fn fetch(&self, url: &str, branch: Option<&str>, token: Option<&str>) -> Result<PathBuf, FetchError>;
}

/// Default fetcher for repositories that are already local paths (no
/// clone/download performed). `url` is interpreted directly as a
/// filesystem path; anything else is reported as `NotFound`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPathFetcher;

#[async_trait]
impl RepositoryFetcher for LocalPathFetcher {
    async fn fetch(&self, url: &str, _branch: Option<&str>, _token: Option<&str>) -> Result<PathBuf, FetchError> {
        let path = PathBuf::from(url);
        if path.is_dir() {
            Ok(path)
        } else {
            Err(FetchError {
                kind: FetchErrorKind::NotFound,
                message: format!("'{url}' is not a local directory; a real fetcher adapter is required for remote repositories"),
            })
        }
    }
}

/// Given a [`ValidationResult`] plus presentation context, produce a
/// self-contained HTML artifact. Categorizing gates into presentation
/// sections is this adapter's concern, not the core's (spec §6.3).
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(&self, result: &ValidationResult, context: ReportContext) -> Vec<u8>;
}

#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    pub repository_url: Option<String>,
    pub branch: Option<String>,
    pub scan_id: Option<String>,
}

/// Minimal renderer producing the `ValidationResult` as pretty-printed
/// JSON rather than HTML. A real deployment swaps this for a template-based
/// HTML renderer; the core is indifferent to the artifact's format.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportRenderer;

#[async_trait]
impl ReportRenderer for JsonReportRenderer {
    async fn render(&self, result: &ValidationResult, _context: ReportContext) -> Vec<u8> {
        serde_json::to_vec_pretty(result).unwrap_or_default()
    }
}

/// Metadata for one listed report, matching the `/reports` response shape
/// in spec §6.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub scan_id: String,
    pub filename: String,
    pub file_size: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub modified_at: chrono::DateTime<chrono::Utc>,
    pub score: f64,
    pub status: String,
}

/// Persist and enumerate rendered reports. Listing/cleanup semantics are
/// this adapter's concern entirely (SPEC_FULL §D, open question 4); the
/// core never enumerates or deletes report files itself.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn save(&self, scan_id: &str, bytes: &[u8], score: f64, status: &str) -> std::io::Result<()>;
    async fn load(&self, scan_id: &str) -> std::io::Result<Option<Vec<u8>>>;
    async fn list(&self) -> std::io::Result<Vec<ReportMetadata>>;
}

/// Filesystem-local store, naming files `hard_gate_report_{scan_id}.html`
/// per spec §6.5, alongside a `.meta.json` sidecar carrying score/status.
pub struct FilesystemReportStore {
    directory: PathBuf,
}

impl FilesystemReportStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self { directory: directory.into() }
    }

    fn report_path(&self, scan_id: &str) -> PathBuf {
        self.directory.join(format!("hard_gate_report_{scan_id}.html"))
    }

    fn meta_path(&self, scan_id: &str) -> PathBuf {
        self.directory.join(format!("hard_gate_report_{scan_id}.meta.json"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMeta {
    score: f64,
    status: String,
}

#[async_trait]
impl ReportStore for FilesystemReportStore {
    async fn save(&self, scan_id: &str, bytes: &[u8], score: f64, status: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        std::fs::write(self.report_path(scan_id), bytes)?;
        let meta = StoredMeta { score, status: status.to_string() };
        let meta_json = serde_json::to_vec(&meta).unwrap_or_default();
        std::fs::write(self.meta_path(scan_id), meta_json)
    }

    async fn load(&self, scan_id: &str) -> std::io::Result<Option<Vec<u8>>> {
        let path = self.report_path(scan_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(path)?))
    }

    async fn list(&self) -> std::io::Result<Vec<ReportMetadata>> {
        if !self.directory.exists() {
            return Ok(Vec::new());
        }
        let mut reports = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            let Some(scan_id) = file_name
                .strip_prefix("hard_gate_report_")
                .and_then(|s| s.strip_suffix(".html"))
            else {
                continue;
            };
            let metadata = entry.metadata()?;
            let meta: StoredMeta = std::fs::read(self.meta_path(scan_id))
                .ok()
                .and_then(|bytes| serde_json::from_slice(&bytes).ok())
                .unwrap_or(StoredMeta { score: 0.0, status: "unknown".to_string() });

            let to_dt = |t: std::time::SystemTime| -> chrono::DateTime<chrono::Utc> {
                t.duration_since(std::time::UNIX_EPOCH)
                    .ok()
                    .and_then(|d| chrono::DateTime::from_timestamp(d.as_secs() as i64, 0))
                    .unwrap_or_else(chrono::Utc::now)
            };

            reports.push(ReportMetadata {
                scan_id: scan_id.to_string(),
                filename: file_name,
                file_size: metadata.len(),
                created_at: metadata.created().map(to_dt).unwrap_or_else(|_| chrono::Utc::now()),
                modified_at: metadata.modified().map(to_dt).unwrap_or_else(|_| chrono::Utc::now()),
                score: meta.score,
                status: meta.status,
            });
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn local_path_fetcher_accepts_existing_directory() {
        let dir = TempDir::new().unwrap();
        let fetcher = LocalPathFetcher;
        let result = fetcher.fetch(dir.path().to_str().unwrap(), None, None).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn local_path_fetcher_rejects_missing_path() {
        let fetcher = LocalPathFetcher;
        let result = fetcher.fetch("/definitely/not/a/real/path", None, None).await;
        assert!(matches!(result, Err(FetchError { kind: FetchErrorKind::NotFound, .. })));
    }

    #[tokio::test]
    async fn filesystem_report_store_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemReportStore::new(dir.path());
        store.save("scan-1", b"<html></html>", 87.5, "completed").await.unwrap();

        let loaded = store.load("scan-1").await.unwrap();
        assert_eq!(loaded, Some(b"<html></html>".to_vec()));

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].scan_id, "scan-1");
        assert_eq!(listed[0].score, 87.5);
    }
}
