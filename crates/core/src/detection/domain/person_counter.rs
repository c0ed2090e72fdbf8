use crate::shared::constants::PERSON_CLASS_ID;
use crate::shared::detection::Detection;

/// Counts detections that belong to a single label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PersonCounter {
    class_id: usize,
}

impl PersonCounter {
    pub fn new(class_id: usize) -> Self {
        Self { class_id }
    }

    pub fn class_id(&self) -> usize {
        self.class_id
    }

    pub fn count(&self, detections: &[Detection]) -> usize {
        detections
            .iter()
            .filter(|d| d.class_id == self.class_id)
            .count()
    }
}

impl Default for PersonCounter {
    fn default() -> Self {
        Self::new(PERSON_CLASS_ID)
    }
}
