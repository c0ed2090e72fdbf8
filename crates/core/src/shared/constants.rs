use std::time::Duration;

/// COCO-trained YOLOv8 large, exported to ONNX.
pub const YOLO_MODEL_NAME: &str = "yolov8l.onnx";

/// COCO label index for "person".
pub const PERSON_CLASS_ID: usize = 0;

pub const DEFAULT_DETECTION_INTERVAL: Duration = Duration::from_secs(5);

pub const DEFAULT_WEBCAM_WIDTH: u32 = 1280;
pub const DEFAULT_WEBCAM_HEIGHT: u32 = 720;

pub const COUNT_LOG_FILE: &str = "human_count.txt";

pub const PREVIEW_WINDOW_TITLE: &str = "Live Detection";

/// Directory checked for a model shipped next to the binary.
pub const BUNDLED_MODEL_DIR: &str = "models";
