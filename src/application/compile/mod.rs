//! Compile orchestration: admission, engine invocation, classification.

pub mod manifest;
pub mod outcome;
pub mod slots;

pub use manifest::{ManifestEntry, build_manifest};
pub use outcome::{Classification, CompileOutcome, classify};
pub use slots::{ProjectSlots, SlotError};

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::activity::ProjectActivity;
use crate::application::engine::{CompileEngine, EngineError};
use crate::domain::compile::{BuildId, CompileRequest, CompileStatus};

/// The final result of one compile call, ready for the transport layer.
#[derive(Debug, Clone)]
pub struct CompileSummary {
    pub status: CompileStatus,
    pub error: Option<String>,
    pub stats: Option<serde_json::Value>,
    pub timings: Option<serde_json::Value>,
    pub build_id: Option<BuildId>,
    pub output_files: Vec<ManifestEntry>,
}

/// Owns the per-project slot table and drives one compile attempt from
/// admission through classification.
pub struct CompileService {
    engine: Arc<dyn CompileEngine>,
    activity: Arc<dyn ProjectActivity>,
    slots: ProjectSlots,
    timeout: Duration,
    output_base_url: String,
}

impl CompileService {
    pub fn new(
        engine: Arc<dyn CompileEngine>,
        activity: Arc<dyn ProjectActivity>,
        timeout: Duration,
        output_base_url: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            activity,
            slots: ProjectSlots::new(),
            timeout,
            output_base_url: output_base_url.into(),
        }
    }

    /// Run one compile attempt. The caller suspends until the engine
    /// finishes or the timeout fires; requests for the same project that
    /// arrive meanwhile are rejected, not queued.
    pub async fn compile(&self, request: CompileRequest) -> CompileSummary {
        let outcome = self.run_admitted(&request).await;

        let (stats, timings) = match &outcome {
            CompileOutcome::Completed { output, .. } => {
                (output.stats.clone(), output.timings.clone())
            }
            _ => (None, None),
        };
        let build_id = match &outcome {
            CompileOutcome::Completed { build_id, .. } => Some(build_id.clone()),
            CompileOutcome::EngineError { build_id, .. } => build_id.clone(),
            CompileOutcome::Rejected { .. } => None,
        };

        if matches!(outcome, CompileOutcome::Completed { .. }) {
            self.mark_accessed_detached(&request);
        }

        let classified = classify(outcome);
        counter!("torchio_compile_total", "status" => classified.status.as_str()).increment(1);
        info!(
            project = %request.project_id,
            status = classified.status.as_str(),
            "compile finished"
        );

        let output_files = build_manifest(
            &self.output_base_url,
            &request.project_id,
            classified.output_files,
        );

        CompileSummary {
            status: classified.status,
            error: classified.error,
            stats,
            timings,
            build_id,
            output_files,
        }
    }

    /// Admission plus the engine call. The slot guard lives exactly as long
    /// as this frame: released on return, timeout, and unwind alike.
    async fn run_admitted(&self, request: &CompileRequest) -> CompileOutcome {
        let _slot = match self.slots.acquire(&request.project_id) {
            Ok(guard) => guard,
            Err(err @ SlotError::AlreadyCompiling { .. }) => {
                counter!("torchio_compile_rejected_total").increment(1);
                return CompileOutcome::Rejected {
                    reason: err.to_string(),
                };
            }
        };

        let build_id = BuildId::generate();
        debug!(project = %request.project_id, build = %build_id, "compile admitted");

        let started = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.engine.compile(request, &build_id)).await;
        histogram!("torchio_compile_duration_ms").record(started.elapsed().as_millis() as f64);

        match result {
            Err(_elapsed) => CompileOutcome::EngineError {
                message: format!("compile timed out after {:?}", self.timeout),
                build_id: Some(build_id),
                timed_out: true,
            },
            Ok(Ok(output)) => CompileOutcome::Completed { output, build_id },
            Ok(Err(EngineError::Timeout {
                message,
                build_id: reported,
            })) => CompileOutcome::EngineError {
                message,
                build_id: reported.or(Some(build_id)),
                timed_out: true,
            },
            Ok(Err(EngineError::Failed {
                message,
                build_id: reported,
            })) => CompileOutcome::EngineError {
                message,
                build_id: reported.or(Some(build_id)),
                timed_out: false,
            },
            Ok(Err(err @ EngineError::NotFound { .. })) => CompileOutcome::EngineError {
                message: err.to_string(),
                build_id: Some(build_id),
                timed_out: false,
            },
        }
    }

    fn mark_accessed_detached(&self, request: &CompileRequest) {
        let activity = Arc::clone(&self.activity);
        let project_id = request.project_id.clone();
        tokio::spawn(async move {
            if let Err(err) = activity.mark_project_accessed(&project_id).await {
                warn!(project = %project_id, error = %err, "failed to mark project as accessed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::application::activity::{ActivityError, ProjectActivity};
    use crate::application::engine::{CompileEngine, EngineError, EngineOutput};
    use crate::domain::compile::{OutputFile, ProjectId};
    use crate::domain::sync::{OutputLocation, SourceLocation};
    use crate::domain::wordcount::WordCountReport;

    fn request(id: &str) -> CompileRequest {
        CompileRequest::new(ProjectId::parse(id).expect("valid project id"))
    }

    fn pdf_output(build_id: &BuildId) -> EngineOutput {
        EngineOutput {
            output_files: vec![OutputFile {
                path: "output.pdf".to_string(),
                kind: "pdf".to_string(),
                size: Some(1337),
                build_id: build_id.clone(),
            }],
            stats: Some(serde_json::json!({ "foo": 1 })),
            timings: Some(serde_json::json!({ "bar": 2 })),
        }
    }

    #[derive(Default)]
    struct RecordingActivity {
        marked: AtomicUsize,
        notify: Notify,
    }

    #[async_trait]
    impl ProjectActivity for RecordingActivity {
        async fn mark_project_accessed(&self, _: &ProjectId) -> Result<(), ActivityError> {
            self.marked.fetch_add(1, Ordering::SeqCst);
            self.notify.notify_one();
            Ok(())
        }
    }

    /// Scripted engine: optionally blocks until released, then plays back a
    /// fixed result.
    struct StubEngine {
        script: Script,
        started: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    enum Script {
        Succeed,
        Fail(EngineError),
        Hang,
        BlockUntilReleased,
    }

    impl StubEngine {
        fn new(script: Script) -> Self {
            Self {
                script,
                started: Notify::new(),
                release: Notify::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompileEngine for StubEngine {
        async fn compile(
            &self,
            _request: &CompileRequest,
            build_id: &BuildId,
        ) -> Result<EngineOutput, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.script {
                Script::Succeed => Ok(pdf_output(build_id)),
                Script::Fail(err) => Err(err.clone()),
                Script::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(pdf_output(build_id))
                }
                Script::BlockUntilReleased => {
                    self.started.notify_one();
                    self.release.notified().await;
                    Ok(pdf_output(build_id))
                }
            }
        }

        async fn sync_from_source(
            &self,
            _: &ProjectId,
            _: Option<&str>,
            _: &SourceLocation,
        ) -> Result<Vec<OutputLocation>, EngineError> {
            unimplemented!("not exercised")
        }

        async fn sync_from_output(
            &self,
            _: &ProjectId,
            _: Option<&str>,
            _: &OutputLocation,
        ) -> Result<Vec<SourceLocation>, EngineError> {
            unimplemented!("not exercised")
        }

        async fn word_count(
            &self,
            _: &ProjectId,
            _: Option<&str>,
            _: &str,
        ) -> Result<WordCountReport, EngineError> {
            unimplemented!("not exercised")
        }
    }

    fn service_with_timeout(
        engine: Arc<StubEngine>,
        activity: Arc<RecordingActivity>,
        timeout: Duration,
    ) -> CompileService {
        CompileService::new(engine, activity, timeout, "http://clsi.example.com")
    }

    fn service(engine: Arc<StubEngine>, activity: Arc<RecordingActivity>) -> CompileService {
        service_with_timeout(engine, activity, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn successful_compile_returns_manifest_and_marks_access() {
        let engine = Arc::new(StubEngine::new(Script::Succeed));
        let activity = Arc::new(RecordingActivity::default());
        let svc = service(engine, activity.clone());

        let summary = svc.compile(request("project-id-123")).await;

        assert_eq!(summary.status, CompileStatus::Success);
        assert_eq!(summary.error, None);
        assert!(summary.build_id.is_some());
        assert!(summary.stats.is_some());
        assert!(summary.timings.is_some());
        let build = summary.build_id.as_ref().expect("build id");
        assert_eq!(
            summary.output_files[0].url,
            format!("http://clsi.example.com/project/project-id-123/build/{build}/output/output.pdf")
        );

        tokio::time::timeout(Duration::from_secs(1), activity.notify.notified())
            .await
            .expect("activity marked");
        assert_eq!(activity.marked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn engine_hang_is_classified_as_timedout_and_slot_released() {
        let engine = Arc::new(StubEngine::new(Script::Hang));
        let activity = Arc::new(RecordingActivity::default());
        let svc = service_with_timeout(engine.clone(), activity.clone(), Duration::from_millis(50));

        let summary = svc.compile(request("p1")).await;
        assert_eq!(summary.status, CompileStatus::Timedout);
        assert!(summary.build_id.is_some());
        assert!(summary.output_files.is_empty());
        assert!(
            summary
                .error
                .as_deref()
                .expect("timeout message")
                .contains("timed out")
        );

        // The slot must be free again even though the engine never returned.
        let second = svc.compile(request("p1")).await;
        assert_eq!(second.status, CompileStatus::Timedout);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);

        // A hung engine run never counts as dispatched.
        assert_eq!(activity.marked.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn engine_failure_is_classified_as_error_and_slot_released() {
        let engine = Arc::new(StubEngine::new(Script::Fail(EngineError::Failed {
            message: "error message".to_string(),
            build_id: Some(BuildId::from("build-id-123".to_string())),
        })));
        let activity = Arc::new(RecordingActivity::default());
        let svc = service(engine, activity.clone());

        let summary = svc.compile(request("p1")).await;
        assert_eq!(summary.status, CompileStatus::Error);
        assert_eq!(summary.error.as_deref(), Some("error message"));
        assert_eq!(
            summary.build_id.as_ref().map(BuildId::as_str),
            Some("build-id-123")
        );
        assert_eq!(activity.marked.load(Ordering::SeqCst), 0);

        let second = svc.compile(request("p1")).await;
        assert_eq!(second.status, CompileStatus::Error);
    }

    #[tokio::test]
    async fn concurrent_compile_for_same_project_is_rejected_not_queued() {
        let engine = Arc::new(StubEngine::new(Script::BlockUntilReleased));
        let activity = Arc::new(RecordingActivity::default());
        let svc = Arc::new(service(engine.clone(), activity));

        let first = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.compile(request("p1")).await })
        };
        tokio::time::timeout(Duration::from_secs(1), engine.started.notified())
            .await
            .expect("first compile reaches the engine");

        let rejected = svc.compile(request("p1")).await;
        assert_eq!(rejected.status, CompileStatus::Unavailable);
        assert_eq!(
            rejected.error.as_deref(),
            Some("too many concurrent compile requests")
        );
        assert!(rejected.build_id.is_none());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);

        engine.release.notify_one();
        let first = first.await.expect("first compile completes");
        assert_eq!(first.status, CompileStatus::Success);

        // Slot is free again once the first attempt finished.
        engine.release.notify_one();
        let started = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.started.notified().await })
        };
        let third = svc.compile(request("p1")).await;
        assert_eq!(third.status, CompileStatus::Success);
        started.await.expect("third compile reached the engine");
    }

    #[tokio::test]
    async fn different_projects_compile_in_parallel() {
        let engine = Arc::new(StubEngine::new(Script::BlockUntilReleased));
        let activity = Arc::new(RecordingActivity::default());
        let svc = Arc::new(service(engine.clone(), activity));

        let first = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.compile(request("p1")).await })
        };
        tokio::time::timeout(Duration::from_secs(1), engine.started.notified())
            .await
            .expect("first compile reaches the engine");

        let second = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.compile(request("p2")).await })
        };
        tokio::time::timeout(Duration::from_secs(1), engine.started.notified())
            .await
            .expect("second project admitted while first is in flight");

        engine.release.notify_one();
        engine.release.notify_one();
        assert_eq!(first.await.expect("p1").status, CompileStatus::Success);
        assert_eq!(second.await.expect("p2").status, CompileStatus::Success);
    }
}
