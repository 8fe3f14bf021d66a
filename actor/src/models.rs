//! Model checkpoints on disk.
//!
//! The trainer writes `latest.onnx` into the models directory after every
//! training step. At evaluation iterations the actor copies it to
//! `iter_<N>.onnx` so later iterations can play against it. A missing file
//! means the uniform evaluator plays in its place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use mcts::{Evaluator, UniformEvaluator};
use tracing::{debug, info};

pub const LATEST_MODEL: &str = "latest.onnx";

/// Where an evaluator came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    File(PathBuf),
    Uniform,
}

impl std::fmt::Display for ModelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSource::File(path) => write!(f, "{}", path.display()),
            ModelSource::Uniform => f.write_str("uniform"),
        }
    }
}

/// A loaded evaluator plus its origin, for logging.
pub struct LoadedModel {
    pub evaluator: Arc<dyn Evaluator>,
    pub source: ModelSource,
}

pub struct ModelStore {
    dir: PathBuf,
    #[cfg_attr(not(feature = "onnx"), allow(dead_code))]
    intra_threads: usize,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>, intra_threads: usize) -> Self {
        Self {
            dir: dir.into(),
            intra_threads,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_MODEL)
    }

    pub fn iteration_path(&self, iteration: u32) -> PathBuf {
        self.dir.join(format!("iter_{}.onnx", iteration))
    }

    /// The model the trainer produced most recently.
    pub fn load_latest(&self) -> Result<LoadedModel> {
        self.load_or_uniform(self.latest_path())
    }

    /// The checkpoint saved at `iteration`.
    pub fn load_iteration(&self, iteration: u32) -> Result<LoadedModel> {
        self.load_or_uniform(self.iteration_path(iteration))
    }

    /// Copy the latest model to the checkpoint for `iteration`.
    ///
    /// Returns false when there is no latest model to copy.
    pub fn snapshot(&self, iteration: u32) -> Result<bool> {
        let latest = self.latest_path();
        if !latest.exists() {
            debug!(iteration, "no latest model, skipping snapshot");
            return Ok(false);
        }

        std::fs::create_dir_all(&self.dir)?;
        let target = self.iteration_path(iteration);
        std::fs::copy(&latest, &target)?;
        info!(iteration, path = %target.display(), "Saved model checkpoint");
        Ok(true)
    }

    fn load_or_uniform(&self, path: PathBuf) -> Result<LoadedModel> {
        if path.exists() {
            if let Some(evaluator) = self.load_file(&path)? {
                return Ok(LoadedModel {
                    evaluator,
                    source: ModelSource::File(path),
                });
            }
        } else {
            debug!(path = %path.display(), "model not found, using uniform evaluator");
        }

        Ok(LoadedModel {
            evaluator: Arc::new(UniformEvaluator::new()),
            source: ModelSource::Uniform,
        })
    }

    #[cfg(feature = "onnx")]
    fn load_file(&self, path: &Path) -> Result<Option<Arc<dyn Evaluator>>> {
        let evaluator = mcts::OnnxEvaluator::load(path, self.intra_threads)?;
        info!(path = %path.display(), "Loaded ONNX model");
        Ok(Some(Arc::new(evaluator)))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_file(&self, path: &Path) -> Result<Option<Arc<dyn Evaluator>>> {
        tracing::warn!(
            path = %path.display(),
            "built without the onnx feature, ignoring model file"
        );
        Ok(None)
    }
}
