//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::{IdentityVerifier, OpaqueTokenVerifier};
use crate::config::Config;
use crate::ocr::{LocalEngine, Orchestrator, RecognitionEngine, RemoteEngine};
use crate::refine::RefinementClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    remote: Arc<dyn RecognitionEngine>,
    orchestrator: Orchestrator,
    refiner: RefinementClient,
    identity: Arc<dyn IdentityVerifier>,
}

impl AppState {
    /// Production wiring: engines and refiner built from configuration.
    pub fn new(config: Config, db: SqlitePool) -> Self {
        let remote: Arc<dyn RecognitionEngine> =
            Arc::new(RemoteEngine::from_config(&config.inference));
        let local: Arc<dyn RecognitionEngine> =
            Arc::new(LocalEngine::from_config(&config.inference));
        let refiner = RefinementClient::from_config(&config.inference);

        Self::with_components(config, db, remote, local, refiner, Arc::new(OpaqueTokenVerifier))
    }

    /// Explicit wiring; tests inject doubles here.
    pub fn with_components(
        config: Config,
        db: SqlitePool,
        remote: Arc<dyn RecognitionEngine>,
        local: Arc<dyn RecognitionEngine>,
        refiner: RefinementClient,
        identity: Arc<dyn IdentityVerifier>,
    ) -> Self {
        let orchestrator = Orchestrator::new(remote.clone(), local);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                remote,
                orchestrator,
                refiner,
                identity,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the remote recognition engine (the `/ocr` endpoint's path)
    pub fn remote_engine(&self) -> &Arc<dyn RecognitionEngine> {
        &self.inner.remote
    }

    /// Get the acquisition orchestrator (remote with local fallback)
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.inner.orchestrator
    }

    /// Get the refinement client
    pub fn refiner(&self) -> &RefinementClient {
        &self.inner.refiner
    }

    /// Get the identity verifier
    pub fn identity(&self) -> &Arc<dyn IdentityVerifier> {
        &self.inner.identity
    }
}
