use crate::error::InferenceError;
use image::{imageops::FilterType, DynamicImage};
use ndarray::{Array, Array4, Axis};

pub const INPUT_SIZE: u32 = 224;

// ResNet50 "caffe" means, in BGR order
const BGR_MEAN: [f32; 3] = [103.939, 116.779, 123.68];

/// Memory layout the model expects for its image input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// [batch, height, width, channels], the Keras default.
    #[default]
    Nhwc,
    /// [batch, channels, height, width]
    Nchw,
}

impl TensorLayout {
    /// Guesses the layout from a model input shape. Anything that does not
    /// have 3 channels in position 1 is treated as channels-last.
    pub fn from_input_shape(shape: &[i64]) -> Self {
        match shape {
            [_, 3, h, w] if *h != 3 || *w != 3 => TensorLayout::Nchw,
            _ => TensorLayout::Nhwc,
        }
    }
}

/// Decodes `buffer` and turns it into a `[1, 224, 224, 3]` (or
/// `[1, 3, 224, 224]`) BGR mean-centred tensor.
pub fn process_bytes(buffer: &[u8], layout: TensorLayout) -> Result<Array4<f32>, InferenceError> {
    let img = image::load_from_memory(buffer).map_err(InferenceError::ImageError)?;
    to_tensor(&img, layout)
}

pub fn to_tensor(img: &DynamicImage, layout: TensorLayout) -> Result<Array4<f32>, InferenceError> {
    // Nearest matches keras load_img(target_size=...)
    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Nearest);
    let side = INPUT_SIZE as usize;

    let mut data = Vec::with_capacity(3 * side * side);
    for pixel in resized.to_rgb8().pixels() {
        let (r, g, b) = (pixel[0] as f32, pixel[1] as f32, pixel[2] as f32);
        data.push(b - BGR_MEAN[0]);
        data.push(g - BGR_MEAN[1]);
        data.push(r - BGR_MEAN[2]);
    }

    let array = Array::from_shape_vec((side, side, 3), data)
        .map_err(|e| InferenceError::PreprocessingError(e.to_string()))?;

    let array = match layout {
        TensorLayout::Nhwc => array,
        TensorLayout::Nchw => array.permuted_axes([2, 0, 1]),
    };

    Ok(array.insert_axis(Axis(0)).as_standard_layout().to_owned())
}
