/// ArcFace face embedder using ONNX Runtime.
///
/// Each face is cropped square from the source image, resized to 112x112 and
/// run through the model. Outputs are L2-normalized, so pair distances fall
/// in `[0, 2]`.
use std::path::Path;

use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::detection::infrastructure::onnx_session::{open_session, ort_error};
use crate::shared::embedding::Embedding;
use crate::shared::error::BoxError;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceEmbedder {
    session: ort::session::Session,
}

impl OnnxArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, BoxError> {
        Ok(Self {
            session: open_session(model_path)?,
        })
    }

    fn embed_crop(&mut self, crop: &Frame) -> Result<Embedding, BoxError> {
        let tensor = preprocess(crop.data(), crop.width(), crop.height());
        let input_value = ort::value::Tensor::from_array(tensor).map_err(ort_error)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(ort_error)?;
        let embedding_array = outputs[0].try_extract_array::<f32>().map_err(ort_error)?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = Embedding::from(embedding_slice);
        embedding.l2_normalize();
        Ok(embedding)
    }
}

impl FaceEmbedder for OnnxArcFaceEmbedder {
    fn embed(&mut self, frame: &Frame, faces: &[FaceBox]) -> Result<Vec<Embedding>, BoxError> {
        faces
            .iter()
            .map(|face| {
                let crop = frame
                    .square_crop(face)
                    .ok_or_else(|| format!("face box {face:?} lies outside the image"))?;
                self.embed_crop(&crop)
            })
            .collect()
    }
}

/// Resize crop to 112x112, normalize to [-1, 1], NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    if src_w == 0 || src_h == 0 {
        return tensor;
    }

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_preprocess_shape() {
        let tensor = preprocess(&vec![128u8; 50 * 50 * 3], 50, 50);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[rstest]
    #[case(0, -1.0)]
    #[case(127, (127.0 - 127.5) / 127.5)]
    #[case(255, 1.0)]
    fn test_preprocess_normalization(#[case] value: u8, #[case] expected: f32) {
        let tensor = preprocess(&vec![value; 10 * 10 * 3], 10, 10);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], expected, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 2, 111, 111]], expected, epsilon = 0.01);
    }

    #[test]
    fn test_preprocess_empty_crop_is_zeros() {
        let tensor = preprocess(&[], 0, 0);
        assert!(tensor.iter().all(|v| *v == 0.0));
    }
}
