/// One object found by the detector, in frame pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    /// Index into the model's label set (COCO for the bundled YOLO models).
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn iou(&self, other: &Detection) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clamps the box to `[0, width] x [0, height]`.
    pub fn clamped(mut self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        self.x1 = self.x1.clamp(0.0, w);
        self.y1 = self.y1.clamp(0.0, h);
        self.x2 = self.x2.clamp(0.0, w);
        self.y2 = self.y2.clamp(0.0, h);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            x1,
            y1,
            x2,
            y2,
            class_id: 0,
            confidence: 0.9,
        }
    }

    #[test]
    fn test_iou_identical() {
        let a = det(10.0, 10.0, 110.0, 110.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50x100 = 5000, union 15000
        let a = det(0.0, 0.0, 100.0, 100.0);
        let b = det(50.0, 0.0, 150.0, 100.0);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[rstest]
    #[case::disjoint(det(0.0, 0.0, 50.0, 50.0), det(100.0, 100.0, 150.0, 150.0))]
    #[case::touching(det(0.0, 0.0, 50.0, 50.0), det(50.0, 0.0, 100.0, 50.0))]
    #[case::zero_width(det(0.0, 0.0, 0.0, 100.0), det(0.0, 0.0, 50.0, 50.0))]
    fn test_iou_is_zero(#[case] a: Detection, #[case] b: Detection) {
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_inverted_box_has_zero_area() {
        assert_relative_eq!(det(10.0, 10.0, 5.0, 5.0).area(), 0.0);
    }

    #[test]
    fn test_clamped_limits_to_frame() {
        let d = det(-20.0, -5.0, 700.0, 500.0).clamped(640, 480);
        assert_relative_eq!(d.x1, 0.0);
        assert_relative_eq!(d.y1, 0.0);
        assert_relative_eq!(d.x2, 640.0);
        assert_relative_eq!(d.y2, 480.0);
    }
}
