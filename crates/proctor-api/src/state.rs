//! Application state.

use std::sync::Arc;

use proctor_storage::FrameStore;
use proctor_vision::{LandmarkProvider, ObjectDetector, ThresholdConfig};

use crate::config::ApiConfig;
use crate::services::{ProctorPipeline, ResultStore, ViolationLedger};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub frames: FrameStore,
    pub ledger: Arc<ViolationLedger>,
    pub pipeline: Arc<ProctorPipeline>,
    pub results: Arc<ResultStore>,
}

impl AppState {
    /// Create application state around already constructed detectors.
    pub fn new(
        config: ApiConfig,
        landmarks: Arc<dyn LandmarkProvider>,
        objects: Arc<dyn ObjectDetector>,
        thresholds: ThresholdConfig,
    ) -> Self {
        let ledger = Arc::new(ViolationLedger::new(config.max_violations));
        let pipeline = Arc::new(ProctorPipeline::new(
            landmarks,
            objects,
            thresholds,
            Arc::clone(&ledger),
        ));

        Self {
            frames: FrameStore::new(config.capture_dir.clone()),
            config,
            ledger,
            pipeline,
            results: Arc::new(ResultStore::new()),
        }
    }
}
