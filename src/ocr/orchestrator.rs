//! Acquisition orchestrator
//!
//! Sequences one recognition run: the remote engine first, then the local
//! fallback when the remote attempt errors or comes back blank. Remote and
//! local are strictly sequential, never raced.
//!
//! Each submission takes a fresh generation token; state transitions are
//! only applied while their token is still current, so a late result from
//! a superseded submission can never overwrite newer state
//! (last-submit-wins). A superseded run keeps executing to completion, its
//! outcome delivered to its own caller and discarded from shared state.

use std::sync::{Arc, Mutex};

use super::types::{OcrError, RecognitionRequest, RecognitionResult};
use super::RecognitionEngine;

/// Observable orchestration state.
#[derive(Debug, Clone)]
pub enum OcrPhase {
    Idle,
    AttemptingRemote,
    AttemptingLocal,
    Succeeded(RecognitionResult),
    Failed(OcrError),
}

struct Inner {
    generation: u64,
    phase: OcrPhase,
}

/// Remote-then-local acquisition state machine.
pub struct Orchestrator {
    remote: Arc<dyn RecognitionEngine>,
    local: Arc<dyn RecognitionEngine>,
    state: Mutex<Inner>,
}

impl Orchestrator {
    pub fn new(remote: Arc<dyn RecognitionEngine>, local: Arc<dyn RecognitionEngine>) -> Self {
        Self {
            remote,
            local,
            state: Mutex::new(Inner {
                generation: 0,
                phase: OcrPhase::Idle,
            }),
        }
    }

    /// Snapshot of the current phase.
    pub fn phase(&self) -> OcrPhase {
        self.state.lock().unwrap().phase.clone()
    }

    /// Run one acquisition. Returns this submission's outcome; shared state
    /// only reflects it while no newer submission has started.
    pub async fn submit(
        &self,
        request: RecognitionRequest,
    ) -> Result<RecognitionResult, OcrError> {
        let generation = {
            let mut inner = self.state.lock().unwrap();
            inner.generation += 1;
            inner.phase = OcrPhase::AttemptingRemote;
            inner.generation
        };

        let remote_failure = match self.remote.recognize(&request).await {
            Ok(result) if !result.text.trim().is_empty() => {
                let result = RecognitionResult {
                    text: result.text.trim().to_string(),
                    ..result
                };
                self.apply(generation, OcrPhase::Succeeded(result.clone()));
                return Ok(result);
            }
            // Blank remote text counts as a failure and triggers fallback.
            Ok(_) => None,
            Err(err) => Some(err),
        };

        // The remote failure is logged and discarded; if the run fails
        // completely, the user sees the local engine's error instead.
        match &remote_failure {
            Some(err) => {
                tracing::warn!("Remote OCR failed, falling back to local engine: {}", err)
            }
            None => tracing::warn!("Remote OCR returned empty text, falling back to local engine"),
        }

        self.apply(generation, OcrPhase::AttemptingLocal);

        match self.local.recognize(&request).await {
            // Local empty output is a valid result, unlike the remote path.
            Ok(result) => {
                self.apply(generation, OcrPhase::Succeeded(result.clone()));
                Ok(result)
            }
            Err(err) => {
                self.apply(generation, OcrPhase::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Apply a transition only if `generation` is still the current one.
    fn apply(&self, generation: u64, phase: OcrPhase) -> bool {
        let mut inner = self.state.lock().unwrap();
        if inner.generation != generation {
            tracing::debug!("Discarding OCR state transition from superseded submission");
            return false;
        }
        inner.phase = phase;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::ocr::{OcrMode, SourceEngine};

    struct MockEngine {
        source: SourceEngine,
        script: Mutex<Vec<Result<String, OcrError>>>,
        calls: AtomicUsize,
        /// When set, recognize blocks until the notify fires.
        gate: Option<Arc<Notify>>,
    }

    impl MockEngine {
        fn new(source: SourceEngine, script: Vec<Result<String, OcrError>>) -> Arc<Self> {
            Arc::new(Self {
                source,
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
                gate: None,
            })
        }

        fn gated(
            source: SourceEngine,
            script: Vec<Result<String, OcrError>>,
            gate: Arc<Notify>,
        ) -> Arc<Self> {
            Arc::new(Self {
                source,
                script: Mutex::new(script),
                calls: AtomicUsize::new(0),
                gate: Some(gate),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecognitionEngine for MockEngine {
        fn source(&self) -> SourceEngine {
            self.source
        }

        async fn recognize(
            &self,
            _request: &RecognitionRequest,
        ) -> Result<RecognitionResult, OcrError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Take the scripted outcome up front so gated calls keep their
            // submission order regardless of wake order.
            let outcome = self.script.lock().unwrap().remove(0);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            outcome.map(|text| RecognitionResult {
                text,
                engine: self.source,
                model: None,
            })
        }
    }

    fn request() -> RecognitionRequest {
        RecognitionRequest::new(vec![1, 2, 3], OcrMode::Printed)
    }

    #[tokio::test]
    async fn remote_success_never_invokes_local() {
        let remote = MockEngine::new(SourceEngine::Remote, vec![Ok("remote text".to_string())]);
        let local = MockEngine::new(SourceEngine::Local, vec![]);
        let orchestrator = Orchestrator::new(remote.clone(), local.clone());

        let result = orchestrator.submit(request()).await.unwrap();

        assert_eq!(result.text, "remote text");
        assert_eq!(result.engine, SourceEngine::Remote);
        assert_eq!(remote.calls(), 1);
        assert_eq!(local.calls(), 0);
        assert!(matches!(orchestrator.phase(), OcrPhase::Succeeded(_)));
    }

    #[tokio::test]
    async fn remote_error_falls_back_to_local_exactly_once() {
        let remote = MockEngine::new(
            SourceEngine::Remote,
            vec![Err(OcrError::ServiceUnavailable)],
        );
        let local = MockEngine::new(SourceEngine::Local, vec![Ok("local text".to_string())]);
        let orchestrator = Orchestrator::new(remote.clone(), local.clone());

        let result = orchestrator.submit(request()).await.unwrap();

        assert_eq!(result.text, "local text");
        assert_eq!(result.engine, SourceEngine::Local);
        assert_eq!(local.calls(), 1);
    }

    #[tokio::test]
    async fn blank_remote_text_triggers_fallback() {
        let remote = MockEngine::new(SourceEngine::Remote, vec![Ok("   ".to_string())]);
        let local = MockEngine::new(SourceEngine::Local, vec![Ok("from local".to_string())]);
        let orchestrator = Orchestrator::new(remote.clone(), local.clone());

        let result = orchestrator.submit(request()).await.unwrap();

        assert_eq!(result.engine, SourceEngine::Local);
        assert_eq!(remote.calls(), 1);
        assert_eq!(local.calls(), 1);
    }

    #[tokio::test]
    async fn empty_local_output_is_still_a_success() {
        let remote = MockEngine::new(SourceEngine::Remote, vec![Ok(String::new())]);
        let local = MockEngine::new(SourceEngine::Local, vec![Ok(String::new())]);
        let orchestrator = Orchestrator::new(remote, local);

        let result = orchestrator.submit(request()).await.unwrap();

        assert_eq!(result.text, "");
        assert_eq!(result.engine, SourceEngine::Local);
        assert!(matches!(orchestrator.phase(), OcrPhase::Succeeded(_)));
    }

    #[tokio::test]
    async fn total_failure_surfaces_the_local_error_only() {
        let remote = MockEngine::new(
            SourceEngine::Remote,
            vec![Err(OcrError::Upstream {
                status: 500,
                body: "remote detail".to_string(),
            })],
        );
        let local = MockEngine::new(
            SourceEngine::Local,
            vec![Err(OcrError::Processing("tesseract missing".to_string()))],
        );
        let orchestrator = Orchestrator::new(remote, local);

        let err = orchestrator.submit(request()).await.unwrap_err();

        assert!(matches!(&err, OcrError::Processing(msg) if msg == "tesseract missing"));
        match orchestrator.phase() {
            OcrPhase::Failed(OcrError::Processing(msg)) => assert_eq!(msg, "tesseract missing"),
            other => panic!("unexpected phase: {other:?}"),
        }
    }

    #[tokio::test]
    async fn stale_submission_cannot_overwrite_newer_state() {
        let gate = Arc::new(Notify::new());
        let slow_remote = MockEngine::gated(
            SourceEngine::Remote,
            vec![Ok("stale result".to_string()), Ok("fresh result".to_string())],
            gate.clone(),
        );
        let local = MockEngine::new(SourceEngine::Local, vec![]);
        let orchestrator = Arc::new(Orchestrator::new(slow_remote, local));

        let first = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit(request()).await })
        };
        // Let the first submission reach the gated remote call.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let second = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.submit(request()).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        // Release both gated calls and collect both outcomes.
        gate.notify_waiters();
        let first_result = first.await.unwrap().unwrap();
        let second_result = second.await.unwrap().unwrap();

        // Each caller got its own outcome...
        assert_eq!(first_result.text, "stale result");
        assert_eq!(second_result.text, "fresh result");

        // ...but shared state only reflects the latest submission.
        match orchestrator.phase() {
            OcrPhase::Succeeded(result) => assert_eq!(result.text, "fresh result"),
            other => panic!("unexpected phase: {other:?}"),
        }
    }
}
