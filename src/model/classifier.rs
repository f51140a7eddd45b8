use crate::error::InferenceError;
use crate::model::labels::{CategoryMap, LABELS};
use crate::preprocessing::image::{process_bytes, TensorLayout};
use ndarray::{Array4, ArrayViewD, Axis};
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use std::sync::Mutex;

/// A loaded model that maps one preprocessed image to one score per label.
pub trait Classifier: Send + Sync {
    /// Layout the model wants its input tensor in.
    fn layout(&self) -> TensorLayout;

    /// Runs a single forward pass over a `[1, ...]` batch and returns the
    /// scores for that one item.
    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Percentage in `[0, 100]`.
    pub confidence: f32,
    pub categories: Vec<String>,
}

/// ONNX Runtime backed classifier.
///
/// `Session::run` needs exclusive access, so concurrent requests take turns
/// on the mutex.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    layout: TensorLayout,
}

impl OnnxClassifier {
    pub fn new(session: Session) -> Result<Self, InferenceError> {
        let input = session.inputs.first().ok_or_else(|| {
            InferenceError::PreprocessingError("model declares no inputs".to_string())
        })?;

        let layout = match &input.input_type {
            ValueType::Tensor { shape, .. } => {
                let dims: Vec<i64> = shape.iter().copied().collect();
                TensorLayout::from_input_shape(&dims)
            }
            _ => TensorLayout::default(),
        };
        let input_name = input.name.clone();
        tracing::info!(input = %input_name, ?layout, "classifier ready");

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            layout,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn layout(&self) -> TensorLayout {
        self.layout
    }

    fn forward(&self, input: Array4<f32>) -> Result<Vec<f32>, InferenceError> {
        let shape = input.shape().to_vec();
        let (data, _) = input.into_raw_vec_and_offset();
        let input_value = Tensor::from_array((shape, data.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::PredictionFailure("session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_value])?;

        let (shape, data) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();
        let output = ArrayViewD::from_shape(dims.as_slice(), data)?;

        let scores = if output.ndim() > 1 {
            output.index_axis(Axis(0), 0).iter().copied().collect()
        } else {
            output.iter().copied().collect()
        };
        Ok(scores)
    }
}

/// Index of the largest score. Ties go to the lowest index; NaN never wins.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

// Only finite scores take part; a NaN or infinite entry counts as absent.
fn is_probability_distribution(scores: &[f32]) -> bool {
    let finite = || scores.iter().copied().filter(|s| s.is_finite());
    let sum: f32 = finite().sum();
    finite().all(|s| (0.0..=1.0).contains(&s)) && (sum - 1.0).abs() < 1e-3
}

/// Apply softmax to convert logits to probabilities. Non-finite logits get
/// probability zero.
fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits
        .iter()
        .copied()
        .filter(|x| x.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits
        .iter()
        .map(|&x| if x.is_finite() { (x - max).exp() } else { 0.0 })
        .collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

/// Score at `index` as a percentage. Outputs that are not already a
/// probability distribution are treated as logits.
///
/// Returns `None` when the score at `index` is missing or not finite.
pub fn confidence_percent(scores: &[f32], index: usize) -> Option<f32> {
    let score = *scores.get(index)?;
    if !score.is_finite() {
        return None;
    }

    let p = if is_probability_distribution(scores) {
        score
    } else {
        softmax(scores)[index]
    };
    Some(p * 100.0)
}

/// Decode, preprocess, run one forward pass and map the winner to its label
/// and functional categories.
pub fn classify(
    model: &dyn Classifier,
    categories: &CategoryMap,
    image_bytes: &[u8],
) -> Result<Prediction, InferenceError> {
    let input = process_bytes(image_bytes, model.layout())?;
    let scores = model.forward(input)?;

    if scores.len() != LABELS.len() {
        return Err(InferenceError::PredictionFailure(format!(
            "expected {} scores, model produced {}",
            LABELS.len(),
            scores.len()
        )));
    }

    let index = argmax(&scores)
        .ok_or_else(|| InferenceError::PredictionFailure("all scores are NaN".to_string()))?;
    let confidence = confidence_percent(&scores, index).ok_or_else(|| {
        InferenceError::PredictionFailure(format!("non-finite score at index {index}"))
    })?;
    let label = LABELS[index];

    Ok(Prediction {
        label: label.to_string(),
        confidence,
        categories: categories.lookup(label),
    })
}
