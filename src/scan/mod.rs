//! Scan Service (C11): accept scan requests, assign scan ids, run the
//! validation pipeline (C9) asynchronously on a bounded worker pool, and
//! expose status/result/report retrieval over a concurrent scan registry.
//!
//! Grounded on spec §4.11 and §5's concurrency model; the `Arc<DashMap<..>>`
//! registry plus `tokio::sync::Semaphore` worker cap follows `valknut-rs`'s
//! `Arc<Config>` + concurrent-map idiom for shared pipeline
//! state, generalized from "one config" to "one map of scan records" per
//! spec §3's "Ownership" rule ("the Scan Service exclusively owns
//! ScanRecords keyed by id").

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::{ReportContext, ReportMetadata, ReportRenderer, ReportStore, RepositoryFetcher};
use crate::core::config::Settings;
use crate::core::model::{ScanInput, ScanRecord, ScanStatus, ValidationResult};
use crate::core::orchestrator::run_validation;
use crate::llm::EnhancementHook;

/// Outcomes of looking up scan state that are routine for a caller polling
/// an asynchronous operation, not core engine failures — kept distinct from
/// [`crate::core::errors::HardGateError`] for that reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanLookupError {
    NotFound,
    NotReady,
}

/// The Scan Service (C11). Exclusively owns the [`ScanRecord`] registry;
/// every exported operation is safe for concurrent callers per spec §9's
/// re-architecture guidance.
pub struct ScanService {
    records: DashMap<String, ScanRecord>,
    tokens: DashMap<String, CancellationToken>,
    semaphore: Arc<Semaphore>,
    settings_template: Settings,
    fetcher: Arc<dyn RepositoryFetcher>,
    llm: Arc<dyn EnhancementHook>,
    renderer: Arc<dyn ReportRenderer>,
    store: Arc<dyn ReportStore>,
}

impl ScanService {
    pub fn new(
        settings_template: Settings,
        fetcher: Arc<dyn RepositoryFetcher>,
        llm: Arc<dyn EnhancementHook>,
        renderer: Arc<dyn ReportRenderer>,
        store: Arc<dyn ReportStore>,
    ) -> Arc<Self> {
        let permits = settings_template.max_concurrent_scans.max(1);
        Arc::new(Self {
            records: DashMap::new(),
            tokens: DashMap::new(),
            semaphore: Arc::new(Semaphore::new(permits)),
            settings_template,
            fetcher,
            llm,
            renderer,
            store,
        })
    }

    /// `submit(repository-reference, branch, options) -> scan_id`, spec
    /// §4.11. Creates a pending [`ScanRecord`] and enqueues the worker;
    /// returns immediately. `github_token` is never persisted into the
    /// record — it is moved directly into the spawned worker and dropped
    /// once the repository fetch completes.
    pub fn submit(self: &Arc<Self>, input: ScanInput, github_token: Option<String>) -> String {
        let scan_id = Uuid::new_v4().to_string();
        self.records
            .insert(scan_id.clone(), ScanRecord::new(scan_id.clone(), input, Utc::now()));
        self.tokens.insert(scan_id.clone(), CancellationToken::new());

        let this = Arc::clone(self);
        let id = scan_id.clone();
        tokio::spawn(async move {
            this.run_worker(id, github_token).await;
        });

        scan_id
    }

    /// An external stop signal: transitions a running (or still-pending)
    /// scan to failed with message "cancelled", per spec §4.11. Discards
    /// whatever partial results existed — there never are any, since a
    /// [`ValidationResult`] is only constructed after the pipeline returns.
    /// Returns `false` if the scan id is unknown.
    pub fn cancel(&self, scan_id: &str) -> bool {
        let Some(token) = self.tokens.get(scan_id) else {
            return false;
        };
        token.cancel();
        true
    }

    /// `status(scan_id) -> {status, message, progress}`, spec §4.11.
    pub fn status(&self, scan_id: &str) -> Result<ScanRecord, ScanLookupError> {
        self.records
            .get(scan_id)
            .map(|r| r.clone())
            .ok_or(ScanLookupError::NotFound)
    }

    /// `result(scan_id) -> ValidationResult | NotReady | NotFound`, spec
    /// §4.11. A failed scan also reports NotReady: no [`ValidationResult`]
    /// was ever constructed for it.
    pub fn result(&self, scan_id: &str) -> Result<ValidationResult, ScanLookupError> {
        let record = self.records.get(scan_id).ok_or(ScanLookupError::NotFound)?;
        record.result.clone().ok_or(ScanLookupError::NotReady)
    }

    /// `report(scan_id) -> bytes | NotReady | NotFound`, spec §4.11.
    /// Rendering is delegated to the [`ReportRenderer`] adapter; this only
    /// decides whether a report can exist yet and persists/loads it via the
    /// [`ReportStore`] adapter.
    pub async fn report(&self, scan_id: &str) -> Result<Vec<u8>, ScanLookupError> {
        let record = self.records.get(scan_id).map(|r| r.clone()).ok_or(ScanLookupError::NotFound)?;
        let Some(result) = record.result.as_ref() else {
            return Err(ScanLookupError::NotReady);
        };

        if let Ok(Some(bytes)) = self.store.load(scan_id).await {
            return Ok(bytes);
        }

        let bytes = self
            .renderer
            .render(
                result,
                ReportContext {
                    repository_url: Some(record.input.repository_url.clone()),
                    branch: record.input.branch.clone(),
                    scan_id: Some(scan_id.to_string()),
                },
            )
            .await;
        let _ = self.store.save(scan_id, &bytes, result.overall_score, "completed").await;
        Ok(bytes)
    }

    /// `GET /reports` listing, delegated entirely to the [`ReportStore`]
    /// adapter per spec §9's open question on report listing/cleanup.
    pub async fn list_reports(&self) -> std::io::Result<Vec<ReportMetadata>> {
        self.store.list().await
    }

    async fn run_worker(self: Arc<Self>, scan_id: String, github_token: Option<String>) {
        let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
            self.mark_failed(&scan_id, "scan service is shutting down".to_string());
            return;
        };

        let Some(token) = self.tokens.get(&scan_id).map(|t| t.clone()) else {
            return;
        };
        if token.is_cancelled() {
            self.mark_failed(&scan_id, "cancelled".to_string());
            return;
        }

        self.transition_running(&scan_id);

        let Some(input) = self.records.get(&scan_id).map(|r| r.input.clone()) else {
            return;
        };

        let local_path = tokio::select! {
            biased;
            _ = token.cancelled() => {
                self.mark_failed(&scan_id, "cancelled".to_string());
                return;
            }
            fetched = self.fetcher.fetch(&input.repository_url, input.branch.as_deref(), github_token.as_deref()) => {
                match fetched {
                    Ok(path) => path,
                    Err(e) => {
                        warn!(scan_id = %scan_id, error = %e, "repository acquisition failed");
                        self.mark_failed(&scan_id, format!("{:?}: {}", e.kind, e.message));
                        return;
                    }
                }
            }
        };

        let mut settings = self.settings_template.clone();
        settings.root_path = local_path;

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => {
                self.mark_failed(&scan_id, "cancelled".to_string());
                return;
            }
            r = run_validation(&settings.root_path, &settings, self.llm.as_ref(), &token) => r,
        };

        drop(permit);

        match outcome {
            Ok(validation) => {
                info!(scan_id = %scan_id, overall = validation.overall_score, "scan completed");
                self.complete(&scan_id, validation).await;
            }
            Err(e) => {
                error!(scan_id = %scan_id, error = %e, "scan failed");
                self.mark_failed(&scan_id, e.to_string());
            }
        }
    }

    fn transition_running(&self, scan_id: &str) {
        if let Some(mut record) = self.records.get_mut(scan_id) {
            if record.status == ScanStatus::Pending {
                record.status = ScanStatus::Running;
                record.message = "running".to_string();
                record.progress = Some(0.0);
            }
        }
    }

    async fn complete(&self, scan_id: &str, result: ValidationResult) {
        let context = ReportContext {
            repository_url: self.records.get(scan_id).map(|r| r.input.repository_url.clone()),
            branch: self.records.get(scan_id).and_then(|r| r.input.branch.clone()),
            scan_id: Some(scan_id.to_string()),
        };
        let bytes = self.renderer.render(&result, context).await;
        if let Err(e) = self.store.save(scan_id, &bytes, result.overall_score, "completed").await {
            warn!(scan_id = %scan_id, error = %e, "failed to persist rendered report");
        }

        if let Some(mut record) = self.records.get_mut(scan_id) {
            if !is_terminal(record.status) {
                record.status = ScanStatus::Completed;
                record.message = "completed".to_string();
                record.progress = Some(1.0);
                record.result = Some(result);
            }
        }
    }

    fn mark_failed(&self, scan_id: &str, message: String) {
        if let Some(mut record) = self.records.get_mut(scan_id) {
            if !is_terminal(record.status) {
                record.status = ScanStatus::Failed;
                record.message = message.clone();
                record.error = Some(message);
            }
        }
    }
}

fn is_terminal(status: ScanStatus) -> bool {
    matches!(status, ScanStatus::Completed | ScanStatus::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{FetchError, FetchErrorKind, JsonReportRenderer};
    use crate::llm::NoopEnhancementHook;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    struct InstantLocalFetcher {
        root: PathBuf,
    }

    #[async_trait]
    impl RepositoryFetcher for InstantLocalFetcher {
        async fn fetch(&self, _url: &str, _branch: Option<&str>, _token: Option<&str>) -> Result<PathBuf, FetchError> {
            Ok(self.root.clone())
        }
    }

    struct AlwaysFailsFetcher;

    #[async_trait]
    impl RepositoryFetcher for AlwaysFailsFetcher {
        async fn fetch(&self, _url: &str, _branch: Option<&str>, _token: Option<&str>) -> Result<PathBuf, FetchError> {
            Err(FetchError {
                kind: FetchErrorKind::NotFound,
                message: "no such repository".to_string(),
            })
        }
    }

    struct SlowCountingFetcher {
        root: PathBuf,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RepositoryFetcher for SlowCountingFetcher {
        async fn fetch(&self, _url: &str, _branch: Option<&str>, _token: Option<&str>) -> Result<PathBuf, FetchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(40)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(self.root.clone())
        }
    }

    #[derive(Default)]
    struct InMemoryStore {
        saved: dashmap::DashMap<String, (Vec<u8>, f64, String)>,
    }

    #[async_trait]
    impl ReportStore for InMemoryStore {
        async fn save(&self, scan_id: &str, bytes: &[u8], score: f64, status: &str) -> std::io::Result<()> {
            self.saved.insert(scan_id.to_string(), (bytes.to_vec(), score, status.to_string()));
            Ok(())
        }
        async fn load(&self, scan_id: &str) -> std::io::Result<Option<Vec<u8>>> {
            Ok(self.saved.get(scan_id).map(|v| v.0.clone()))
        }
        async fn list(&self) -> std::io::Result<Vec<ReportMetadata>> {
            Ok(Vec::new())
        }
    }

    fn test_settings(concurrent: usize) -> Settings {
        let mut settings = Settings::default();
        settings.max_concurrent_scans = concurrent;
        settings.scan_deadline_secs = 30;
        settings
    }

    #[tokio::test]
    async fn submit_then_poll_reaches_completed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.py"), "logger.info(\"hello\")\n").unwrap();

        let service = ScanService::new(
            test_settings(2),
            Arc::new(InstantLocalFetcher { root: dir.path().to_path_buf() }),
            Arc::new(NoopEnhancementHook),
            Arc::new(JsonReportRenderer),
            Arc::new(InMemoryStore::default()),
        );

        let scan_id = service.submit(
            ScanInput { repository_url: "local".to_string(), branch: None, threshold: None },
            None,
        );

        let mut status = service.status(&scan_id).unwrap();
        for _ in 0..200 {
            if status.status == ScanStatus::Completed || status.status == ScanStatus::Failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            status = service.status(&scan_id).unwrap();
        }

        assert_eq!(status.status, ScanStatus::Completed);
        let result = service.result(&scan_id).unwrap();
        assert!(result.overall_score >= 0.0 && result.overall_score <= 100.0);

        let report = service.report(&scan_id).await.unwrap();
        assert!(!report.is_empty());
    }

    #[tokio::test]
    async fn unknown_scan_id_is_not_found() {
        let service = ScanService::new(
            test_settings(1),
            Arc::new(AlwaysFailsFetcher),
            Arc::new(NoopEnhancementHook),
            Arc::new(JsonReportRenderer),
            Arc::new(InMemoryStore::default()),
        );
        assert_eq!(service.status("no-such-id"), Err(ScanLookupError::NotFound));
        assert_eq!(service.result("no-such-id"), Err(ScanLookupError::NotFound));
    }

    #[tokio::test]
    async fn repository_unavailable_fails_the_scan() {
        let service = ScanService::new(
            test_settings(1),
            Arc::new(AlwaysFailsFetcher),
            Arc::new(NoopEnhancementHook),
            Arc::new(JsonReportRenderer),
            Arc::new(InMemoryStore::default()),
        );
        let scan_id = service.submit(
            ScanInput { repository_url: "missing".to_string(), branch: None, threshold: None },
            None,
        );

        let mut status = service.status(&scan_id).unwrap();
        for _ in 0..200 {
            if status.status == ScanStatus::Failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            status = service.status(&scan_id).unwrap();
        }

        assert_eq!(status.status, ScanStatus::Failed);
        assert_eq!(service.result(&scan_id), Err(ScanLookupError::NotReady));
    }

    #[tokio::test]
    async fn status_transitions_never_leave_terminal_state() {
        let dir = TempDir::new().unwrap();
        let service = ScanService::new(
            test_settings(1),
            Arc::new(InstantLocalFetcher { root: dir.path().to_path_buf() }),
            Arc::new(NoopEnhancementHook),
            Arc::new(JsonReportRenderer),
            Arc::new(InMemoryStore::default()),
        );
        let scan_id = service.submit(
            ScanInput { repository_url: "local".to_string(), branch: None, threshold: None },
            None,
        );

        let mut status = service.status(&scan_id).unwrap();
        for _ in 0..200 {
            if status.status == ScanStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            status = service.status(&scan_id).unwrap();
        }
        assert_eq!(status.status, ScanStatus::Completed);

        // Cancelling after completion must not un-terminate the record.
        service.cancel(&scan_id);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(service.status(&scan_id).unwrap().status, ScanStatus::Completed);
    }

    #[tokio::test]
    async fn respects_concurrency_cap() {
        let dir = TempDir::new().unwrap();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let service = ScanService::new(
            test_settings(2),
            Arc::new(SlowCountingFetcher {
                root: dir.path().to_path_buf(),
                in_flight: in_flight.clone(),
                peak: peak.clone(),
            }),
            Arc::new(NoopEnhancementHook),
            Arc::new(JsonReportRenderer),
            Arc::new(InMemoryStore::default()),
        );

        let ids: Vec<String> = (0..6)
            .map(|_| {
                service.submit(
                    ScanInput { repository_url: "local".to_string(), branch: None, threshold: None },
                    None,
                )
            })
            .collect();

        for _ in 0..400 {
            let all_done = ids.iter().all(|id| {
                matches!(
                    service.status(id).map(|r| r.status),
                    Ok(ScanStatus::Completed) | Ok(ScanStatus::Failed)
                )
            });
            if all_done {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(peak.load(Ordering::SeqCst) <= 2, "observed {} concurrent fetches, cap was 2", peak.load(Ordering::SeqCst));
    }
}
