/// YOLO face detector for still images using ONNX Runtime via `ort`.
///
/// Letterbox preprocessing, inference, confidence filter and NMS. Boxes are
/// mapped back to source pixels and returned in reading order.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::onnx_session::{open_session, ort_error};
use crate::shared::error::BoxError;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NMS_IOU_THRESH: f64 = 0.45;

/// Letterbox fill value (YOLO convention).
const PAD_GRAY: f32 = 114.0 / 255.0;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Loads a YOLO ONNX model; input size is read from the NCHW input shape.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, BoxError> {
        let session = open_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    (shape.len() >= 4 && shape[2] > 0).then(|| shape[2] as u32)
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!("YOLO detector input size: {input_size}");

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, BoxError> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err("cannot detect faces in an empty image".into());
        }

        let (input, mapping) = letterbox(frame, self.input_size);
        let input_value = ort::value::Tensor::from_array(input).map_err(ort_error)?;
        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(ort_error)?;
        let tensor = outputs[0].try_extract_array::<f32>().map_err(ort_error)?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }

        // Output is [1, features, detections] or [1, detections, features].
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_feats < 5 {
            return Err(format!("YOLO output has too few features: {num_feats}").into());
        }
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let feature = |det: usize, f: usize| -> f64 {
            if transposed {
                data[f * num_dets + det] as f64
            } else {
                data[det * num_feats + f] as f64
            }
        };

        let mut candidates = Vec::new();
        for i in 0..num_dets {
            let confidence = feature(i, 4);
            if confidence < self.confidence {
                continue;
            }
            let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
            candidates.push(Candidate {
                bbox: [
                    mapping.unmap_x(cx - w / 2.0),
                    mapping.unmap_y(cy - h / 2.0),
                    mapping.unmap_x(cx + w / 2.0),
                    mapping.unmap_y(cy + h / 2.0),
                ],
                confidence,
            });
        }

        let mut faces: Vec<FaceBox> = nms(&mut candidates, NMS_IOU_THRESH)
            .into_iter()
            .map(|c| {
                let [x1, y1, x2, y2] = c.bbox;
                FaceBox::from_corners(x1, y1, x2, y2, frame.width(), frame.height())
            })
            .filter(|b| b.area() > 0)
            .collect();
        faces.sort_by_key(|b| (b.top, b.left));
        Ok(faces)
    }
}

/// Maps letterbox coordinates back to source pixels.
struct LetterboxMapping {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl LetterboxMapping {
    fn unmap_x(&self, x: f64) -> f64 {
        (x - self.pad_x as f64) / self.scale
    }

    fn unmap_y(&self, y: f64) -> f64 {
        (y - self.pad_y as f64) / self.scale
    }
}

/// Letterbox-resize a frame to `target_size` x `target_size`, NCHW float32.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, LetterboxMapping) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_GRAY,
    );

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded canvas
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        LetterboxMapping {
            scale,
            pad_x,
            pad_y,
        },
    )
}

#[derive(Clone, Debug)]
struct Candidate {
    bbox: [f64; 4],
    confidence: f64,
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(candidates: &mut [Candidate], iou_thresh: f64) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for candidate in candidates.iter() {
        if keep
            .iter()
            .all(|kept| bbox_iou(&kept.bbox, &candidate.bbox) <= iou_thresh)
        {
            keep.push(candidate.clone());
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn candidate(bbox: [f64; 4], confidence: f64) -> Candidate {
        Candidate { bbox, confidence }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 -> scale 3.2, 640x320 content, 160px vertical padding
        let frame = Frame::from_rgb(vec![128u8; 200 * 100 * 3], 200, 100);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::from_rgb(vec![255u8; 100 * 50 * 3], 100, 50);
        let (tensor, lb) = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, 1]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], PAD_GRAY, epsilon = 0.01);
    }

    #[test]
    fn test_unmap_inverts_letterbox() {
        let frame = Frame::from_rgb(vec![0u8; 200 * 100 * 3], 200, 100);
        let (_, lb) = letterbox(&frame, 640);
        // source (50, 25) -> letterbox (160, 240)
        assert_relative_eq!(lb.unmap_x(160.0), 50.0, epsilon = 1e-9);
        assert_relative_eq!(lb.unmap_y(240.0), 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut dets = vec![
            candidate([0.0, 0.0, 100.0, 100.0], 0.8),
            candidate([5.0, 5.0, 105.0, 105.0], 0.9),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let mut dets = vec![
            candidate([0.0, 0.0, 50.0, 50.0], 0.9),
            candidate([200.0, 200.0, 250.0, 250.0], 0.8),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(&mut [], 0.3).is_empty());
    }

    #[test]
    fn test_bbox_iou() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&b, &b), 1.0);
        assert_eq!(bbox_iou(&b, &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }
}
