/// COCO YOLO object detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference, per-class NMS and the mapping
/// of boxes back into frame coordinates.
use std::path::Path;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::detection::Detection;
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold, matching the Ultralytics predictor.
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f32 = 0.45;

/// Box features preceding the class scores in each candidate row.
const BOX_FEATURES: usize = 4;

/// YOLOv8-style detector backed by an ONNX Runtime session.
///
/// Expects an output of `[1, 4 + C, N]` (or its transpose) where each
/// candidate is `cx, cy, w, h` followed by `C` class scores.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f32,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Load a YOLO ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape (NCHW),
    /// falling back to 640 when the shape is dynamic.
    pub fn new(model_path: &Path, confidence: f32) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        log::info!(
            "Loaded detector {} (input {input_size}x{input_size})",
            model_path.display()
        );

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let layout = OutputLayout::from_shape(&shape)?;
        let mut candidates = decode_candidates(data, layout, self.confidence);
        log::debug!(
            "frame {}: {} candidates above {:.2}",
            frame.index(),
            candidates.len(),
            self.confidence
        );

        let kept = nms(&mut candidates, NMS_IOU_THRESH);
        Ok(kept
            .into_iter()
            .map(|d| letterbox.unmap(d).clamped(frame.width(), frame.height()))
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Scale and padding applied by [`letterbox`], needed to map boxes back.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f32,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn unmap(&self, d: Detection) -> Detection {
        let px = self.pad_x as f32;
        let py = self.pad_y as f32;
        Detection {
            x1: (d.x1 - px) / self.scale,
            y1: (d.y1 - py) / self.scale,
            x2: (d.x2 - px) / self.scale,
            y2: (d.y2 - py) / self.scale,
            ..d
        }
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size`, padded with
/// YOLO gray (114) and normalized to `[0, 1]` in NCHW order.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f32;
    let fh = frame.height() as f32;
    let target = target_size as f32;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbor resize into the padded region
    for y in 0..new_h as usize {
        let src_y = ((y as f32 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f32 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x,
            pad_y,
        },
    )
}

// ---------------------------------------------------------------------------
// Output decoding
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
struct OutputLayout {
    num_candidates: usize,
    num_features: usize,
    /// `[1, features, candidates]`, the default YOLOv8 export.
    transposed: bool,
}

impl OutputLayout {
    fn from_shape(shape: &[usize]) -> Result<Self, Box<dyn std::error::Error>> {
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }
        let transposed = shape[1] < shape[2];
        let (num_candidates, num_features) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if num_features <= BOX_FEATURES {
            return Err(format!("YOLO output has no class scores: {shape:?}").into());
        }
        Ok(Self {
            num_candidates,
            num_features,
            transposed,
        })
    }

    fn feature(&self, data: &[f32], candidate: usize, feature: usize) -> f32 {
        if self.transposed {
            data[feature * self.num_candidates + candidate]
        } else {
            data[candidate * self.num_features + feature]
        }
    }
}

/// Picks the best class per candidate and keeps those above `confidence`.
///
/// Boxes stay in letterbox coordinates.
fn decode_candidates(data: &[f32], layout: OutputLayout, confidence: f32) -> Vec<Detection> {
    let mut out = Vec::new();
    for i in 0..layout.num_candidates {
        let (class_id, score) = (BOX_FEATURES..layout.num_features)
            .map(|f| (f - BOX_FEATURES, layout.feature(data, i, f)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
        if score < confidence {
            continue;
        }

        let cx = layout.feature(data, i, 0);
        let cy = layout.feature(data, i, 1);
        let w = layout.feature(data, i, 2);
        let h = layout.feature(data, i, 3);
        out.push(Detection {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
            class_id,
            confidence: score,
        });
    }
    out
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

/// Greedy per-class NMS: sort by confidence descending, suppress overlapping
/// boxes of the same class.
fn nms(dets: &mut [Detection], iou_thresh: f32) -> Vec<Detection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];

    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if suppressed[j] || dets[j].class_id != dets[i].class_id {
                continue;
            }
            if dets[i].iou(&dets[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}
