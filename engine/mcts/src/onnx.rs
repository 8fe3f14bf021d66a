//! ONNX Runtime evaluator for neural network inference.
//!
//! This module provides an evaluator that uses ONNX models exported by the
//! external trainer.
//!
//! # Model Format
//!
//! The ONNX model is expected to have:
//! - Input: "state" - shape (batch_size, 189) float32
//! - Input: "availability" - shape (batch_size, 81) float32
//! - Output: "policy_logits" - shape (batch_size, 81) float32
//! - Output: "value" - shape (batch_size, 1) float32

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use games_ultimate::{Observation, AVAILABILITY_SIZE, NUM_ACTIONS, STATE_SIZE};
use ort::{session::Session, value::Value};
use tracing::debug;

use crate::evaluator::{EvalResult, Evaluator, EvaluatorError};

/// ONNX Runtime evaluator that loads and runs neural network models.
///
/// Uses a Mutex internally because `Session::run` requires `&mut self`,
/// but the `Evaluator` trait uses `&self` for thread-safe sharing.
pub struct OnnxEvaluator {
    session: Mutex<Session>,
    /// Number of inferences performed (for diagnostics)
    inference_count: AtomicU64,
    /// Total inference time in microseconds (for diagnostics)
    total_inference_time_us: AtomicU64,
}

impl std::fmt::Debug for OnnxEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEvaluator")
            .field("inference_count", &self.inference_count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl OnnxEvaluator {
    /// Load an ONNX model from the given path.
    pub fn load<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self, EvaluatorError> {
        let session = Session::builder()
            .map_err(|e| {
                EvaluatorError::ModelError(format!("Failed to create session builder: {}", e))
            })?
            .with_intra_threads(intra_threads)
            .map_err(|e| EvaluatorError::ModelError(format!("Failed to set intra threads: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| EvaluatorError::ModelError(format!("Failed to load model: {}", e)))?;

        Ok(Self::from_session(session))
    }

    fn from_session(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
            inference_count: AtomicU64::new(0),
            total_inference_time_us: AtomicU64::new(0),
        }
    }

    /// Apply softmax over the entries whose availability is positive.
    fn masked_softmax(logits: &[f32], availability: &[f32]) -> Vec<f32> {
        let mut max_logit = f32::NEG_INFINITY;
        for (&logit, &avail) in logits.iter().zip(availability) {
            if avail > 0.0 && logit > max_logit {
                max_logit = logit;
            }
        }

        // Handle case where no legal moves
        if max_logit == f32::NEG_INFINITY {
            return vec![0.0; NUM_ACTIONS];
        }

        let mut exp_sum = 0.0;
        let mut exp_values = vec![0.0; NUM_ACTIONS];

        for (i, (&logit, &avail)) in logits.iter().zip(availability).enumerate().take(NUM_ACTIONS) {
            if avail > 0.0 {
                let exp_val = (logit - max_logit).exp();
                exp_values[i] = exp_val;
                exp_sum += exp_val;
            }
        }

        if exp_sum > 0.0 {
            for v in &mut exp_values {
                *v /= exp_sum;
            }
        }

        exp_values
    }

    fn record_timing(&self, started: Instant, samples: u64) {
        let elapsed_us = started.elapsed().as_micros() as u64;
        let total_us = self
            .total_inference_time_us
            .fetch_add(elapsed_us * samples, Ordering::Relaxed)
            + elapsed_us * samples;
        let before = self.inference_count.fetch_add(samples, Ordering::Relaxed);
        let count = before + samples;

        // Log stats periodically (every 10,000 inferences)
        if before / 10_000 != count / 10_000 {
            debug!(
                inferences = count,
                avg_ms = (total_us / count) as f64 / 1000.0,
                "ONNX inference stats"
            );
        }
    }
}

impl Evaluator for OnnxEvaluator {
    fn evaluate(&self, obs: &Observation) -> Result<EvalResult, EvaluatorError> {
        self.evaluate_batch(&[obs])?
            .pop()
            .ok_or_else(|| EvaluatorError::EvaluationFailed("empty batch output".to_string()))
    }

    fn evaluate_batch(&self, observations: &[&Observation]) -> Result<Vec<EvalResult>, EvaluatorError> {
        if observations.is_empty() {
            return Ok(Vec::new());
        }

        let batch_size = observations.len();

        let mut flat_state = Vec::with_capacity(batch_size * STATE_SIZE);
        let mut flat_avail = Vec::with_capacity(batch_size * AVAILABILITY_SIZE);
        for obs in observations {
            flat_state.extend_from_slice(&obs.state);
            flat_avail.extend_from_slice(&obs.availability);
        }

        let state_array = ndarray::Array2::from_shape_vec((batch_size, STATE_SIZE), flat_state)
            .map_err(|e| {
                EvaluatorError::InvalidState(format!("Failed to create state array: {}", e))
            })?;
        let avail_array = ndarray::Array2::from_shape_vec((batch_size, AVAILABILITY_SIZE), flat_avail)
            .map_err(|e| {
                EvaluatorError::InvalidState(format!("Failed to create availability array: {}", e))
            })?;

        let state_value = Value::from_array(state_array).map_err(|e| {
            EvaluatorError::ModelError(format!("Failed to create state tensor: {}", e))
        })?;
        let avail_value = Value::from_array(avail_array).map_err(|e| {
            EvaluatorError::ModelError(format!("Failed to create availability tensor: {}", e))
        })?;

        // Run inference - extract all data inside the lock scope
        let inference_start = Instant::now();
        let (policy_flat, values) = {
            let mut session = self.session.lock().map_err(|e| {
                EvaluatorError::EvaluationFailed(format!("Failed to acquire session lock: {}", e))
            })?;
            let outputs = session
                .run(ort::inputs!["state" => state_value, "availability" => avail_value])
                .map_err(|e| EvaluatorError::EvaluationFailed(format!("Inference failed: {}", e)))?;

            let policy_output = outputs.get("policy_logits").ok_or_else(|| {
                EvaluatorError::ModelError("Missing policy_logits output".to_string())
            })?;
            let (_shape, policy_data) = policy_output.try_extract_tensor::<f32>().map_err(|e| {
                EvaluatorError::ModelError(format!("Failed to extract policy tensor: {}", e))
            })?;

            let value_output = outputs
                .get("value")
                .ok_or_else(|| EvaluatorError::ModelError("Missing value output".to_string()))?;
            let (_shape, value_data) = value_output.try_extract_tensor::<f32>().map_err(|e| {
                EvaluatorError::ModelError(format!("Failed to extract value tensor: {}", e))
            })?;

            (policy_data.to_vec(), value_data.to_vec())
        };
        self.record_timing(inference_start, batch_size as u64);

        if policy_flat.len() != batch_size * NUM_ACTIONS || values.len() != batch_size {
            return Err(EvaluatorError::ModelError(format!(
                "unexpected output sizes: policy {} value {} for batch {}",
                policy_flat.len(),
                values.len(),
                batch_size
            )));
        }

        Ok(observations
            .iter()
            .zip(policy_flat.chunks_exact(NUM_ACTIONS))
            .zip(values)
            .map(|((obs, logits), value)| EvalResult {
                policy: Self::masked_softmax(logits, &obs.availability),
                value,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(legal: &[usize]) -> Vec<f32> {
        let mut m = vec![0.0; NUM_ACTIONS];
        for &i in legal {
            m[i] = 1.0;
        }
        m
    }

    #[test]
    fn test_masked_softmax_all_legal() {
        let logits: Vec<f32> = (0..NUM_ACTIONS).map(|i| i as f32 / 10.0).collect();
        let policy = OnnxEvaluator::masked_softmax(&logits, &[1.0; NUM_ACTIONS]);

        // Should sum to 1.0
        let sum: f32 = policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);

        // Higher logit should have higher probability
        assert!(policy[80] > policy[40]);
        assert!(policy[40] > policy[0]);
    }

    #[test]
    fn test_masked_softmax_with_illegal() {
        let mut logits = vec![0.0; NUM_ACTIONS];
        logits[0] = 1.0;
        logits[1] = 2.0;
        logits[2] = 3.0;
        logits[3] = 4.0;
        let policy = OnnxEvaluator::masked_softmax(&logits, &mask(&[0, 2]));

        // Sum should be 1.0
        let sum: f32 = policy.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);

        // Illegal moves should be 0
        assert!(policy[1].abs() < 1e-6);
        assert!(policy[3].abs() < 1e-6);

        // Legal move 2 (logit=3.0) should be higher than legal move 0 (logit=1.0)
        assert!(policy[2] > policy[0]);
    }

    #[test]
    fn test_masked_softmax_no_legal() {
        let logits = vec![1.0; NUM_ACTIONS];
        let policy = OnnxEvaluator::masked_softmax(&logits, &mask(&[]));

        // All should be 0
        for p in &policy {
            assert!(p.abs() < 1e-6);
        }
    }
}
