use log::info;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tch::{CModule, Device, Kind};

use super::{CLASS_NAMES, preprocess};
use crate::config::first_existing;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Model file not found in any of the expected locations")]
    ModelNotFound,
    #[error("Failed to load model: {0}")]
    ModelLoad(tch::TchError),
    #[error("Failed to process image: {0}")]
    Preprocess(String),
    #[error("Prediction failed: {0}")]
    Prediction(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

/// Wraps the TorchScript classifier. The module is resolved over an ordered
/// candidate-path list and loaded on first use; after that the loaded module
/// is shared read-only across requests, with the mutex serializing forward
/// passes. A missing or broken artifact surfaces per request, never as a
/// process exit.
#[derive(Clone)]
pub struct Model {
    candidates: Arc<Vec<PathBuf>>,
    device: Device,
    module: Arc<Mutex<Option<CModule>>>,
}

impl Model {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates: Arc::new(candidates),
            device: Device::cuda_if_available(),
            module: Arc::new(Mutex::new(None)),
        }
    }

    /// First candidate path that exists on disk, if any.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        first_existing(&self.candidates)
    }

    pub fn predict(&self, image_path: &Path) -> Result<Prediction, InferenceError> {
        let mut slot = self.module.lock().unwrap();
        if slot.is_none() {
            let path = self.resolve_path().ok_or(InferenceError::ModelNotFound)?;
            info!("Loading model from: {}", path.display());
            let module =
                CModule::load_on_device(&path, self.device).map_err(InferenceError::ModelLoad)?;
            *slot = Some(module);
        }
        // Just populated above when empty.
        let module = slot.as_ref().ok_or(InferenceError::ModelNotFound)?;

        let tensor = preprocess::image_to_tensor(image_path, self.device)?;
        let output = module
            .forward_ts(&[tensor])
            .map_err(|e| InferenceError::Prediction(e.to_string()))?
            .softmax(-1, Kind::Float)
            .view([-1]);

        let numel = output.size()[0] as usize;
        let mut probs = vec![0.0f32; numel];
        output.to_kind(Kind::Float).copy_data(&mut probs, numel);

        let (index, confidence) = top_class(&probs)
            .ok_or_else(|| InferenceError::Prediction("empty model output".to_string()))?;
        let label = CLASS_NAMES
            .get(index)
            .ok_or_else(|| {
                InferenceError::Prediction(format!("class index {index} out of range"))
            })?
            .to_string();

        Ok(Prediction { label, confidence })
    }
}

/// Arg-max over the output distribution; the first maximum wins on ties.
pub fn top_class(probs: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &p) in probs.iter().enumerate() {
        match best {
            Some((_, bp)) if bp >= p => {}
            _ => best = Some((i, p)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_class_picks_maximum() {
        let probs = [0.05, 0.1, 0.6, 0.05, 0.15, 0.05];
        assert_eq!(top_class(&probs), Some((2, 0.6)));
    }

    #[test]
    fn top_class_prefers_first_on_ties() {
        let probs = [0.25, 0.25, 0.25, 0.25];
        assert_eq!(top_class(&probs), Some((0, 0.25)));
    }

    #[test]
    fn top_class_of_empty_output_is_none() {
        assert_eq!(top_class(&[]), None);
    }

    #[test]
    fn missing_model_file_reports_not_found() {
        let model = Model::new(vec![PathBuf::from("/no/such/model.pt")]);
        assert!(model.resolve_path().is_none());
        let result = model.predict(Path::new("irrelevant.png"));
        assert!(matches!(result, Err(InferenceError::ModelNotFound)));
    }

    #[test]
    fn candidate_order_decides_resolution() {
        let model = Model::new(vec![
            PathBuf::from("/no/such/model.pt"),
            std::env::temp_dir(),
        ]);
        assert_eq!(model.resolve_path(), Some(std::env::temp_dir()));
    }
}
